//! WebSocket server and connection handling.

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use hexfield_core::{ClientMessage, ConnId, Lobby, ServerMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Server state shared across all connections.
pub struct ServerState {
    /// Session registry; its lock covers matchmaking and id lookup only.
    lobby: Mutex<Lobby>,
    /// Mapping from connection ID to its outbound message sender
    senders: DashMap<ConnId, mpsc::UnboundedSender<ServerMessage>>,
    next_conn_id: AtomicU64,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            lobby: Mutex::new(Lobby::new()),
            senders: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    fn alloc_conn_id(&self) -> ConnId {
        ConnId(self.next_conn_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Send a message to a specific connection. A missing or closed
    /// connection is skipped, so one dead recipient never interrupts the
    /// rest of a batch.
    pub fn send_to(&self, conn: ConnId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(msg);
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Hexfield server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;

    let conn = state.alloc_conn_id();
    info!("New WebSocket connection from {} as {:?}", addr, conn);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(conn, tx);

    // Every connection is greeted before anything else.
    let init = serde_json::to_string(&ServerMessage::Init)?;
    ws_sender.send(Message::Text(init.into())).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_message(conn, client_msg, &state);
                } else {
                    warn!("Undecodable message from {:?}: {}", conn, text);
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {:?} closing connection", conn);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {:?}: {}", conn, e);
                break;
            }
            _ => {}
        }
    }

    // The seat stays reserved in its session; only the delivery channel is
    // torn down, so messages to this player are dropped from here on.
    state.senders.remove(&conn);
    send_task.abort();

    info!("Connection closed for {:?}", conn);
    Ok(())
}

/// Route one decoded client message.
fn handle_message(conn: ConnId, msg: ClientMessage, state: &Arc<ServerState>) {
    match &msg {
        ClientMessage::CheckHosting { host, options } => {
            let reply = state
                .lobby
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .host_or_join(conn, *host, options);
            info!("{:?} check_hosting {:?} -> {:?}", conn, options, reply);
            state.send_to(conn, reply);
        }
        _ => {
            // Every other message names its session.
            let game_id = match msg.game_id() {
                Some(id) => id,
                None => return,
            };
            let session = state
                .lobby
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(game_id);
            let Some(session) = session else {
                debug!("{:?} addressed unknown game {}", conn, game_id);
                return;
            };

            // Gameplay runs under the session's own lock; the lobby lock is
            // already released and no await happens in here.
            let outbound = {
                let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                let mut rng = rand::thread_rng();
                session.handle(conn, &msg, &mut rng)
            };
            for out in outbound {
                state.send_to(out.to, out.message);
            }
        }
    }
}
