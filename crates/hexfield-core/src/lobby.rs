//! Session registry: matchmaking and game-id assignment.
//!
//! The lobby owns every session for the lifetime of the process; finished
//! games stay in the list so their ids remain valid. Each session sits
//! behind its own mutex, so the lobby lock only covers scanning the list
//! and appending to it, never gameplay.

use crate::player::MAX_PLAYERS;
use crate::protocol::{ConnId, GameId, HostOptions, ServerMessage};
use crate::session::GameSession;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("invalid player count {requested} (must be 2..={max})")]
    InvalidPlayerCount { requested: u8, max: u8 },
}

fn valid_player_count(n: u8) -> bool {
    (2..=MAX_PLAYERS).contains(&n)
}

/// Registry of all game sessions.
#[derive(Debug, Default)]
pub struct Lobby {
    sessions: Vec<Arc<Mutex<GameSession>>>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session by id. Ids are indices into the (append-only)
    /// session list; negative or unknown ids yield `None`.
    pub fn get(&self, game_id: GameId) -> Option<Arc<Mutex<GameSession>>> {
        usize::try_from(game_id)
            .ok()
            .and_then(|i| self.sessions.get(i))
            .cloned()
    }

    /// First non-full session whose host options match exactly.
    pub fn find_joinable(&self, options: &HostOptions) -> Option<Arc<Mutex<GameSession>>> {
        self.sessions
            .iter()
            .find(|s| {
                let session = s.lock().unwrap_or_else(PoisonError::into_inner);
                session.max_players() == options.num_players
                    && session.randomize() == options.randomize
                    && !session.is_full()
            })
            .cloned()
    }

    /// Create a new empty session for `options` and register it.
    pub fn create_session(
        &mut self,
        options: &HostOptions,
    ) -> Result<Arc<Mutex<GameSession>>, LobbyError> {
        if !valid_player_count(options.num_players) {
            return Err(LobbyError::InvalidPlayerCount {
                requested: options.num_players,
                max: MAX_PLAYERS,
            });
        }
        let id = self.sessions.len() as GameId;
        let session = Arc::new(Mutex::new(GameSession::new(id, options)));
        self.sessions.push(Arc::clone(&session));
        Ok(session)
    }

    /// Handle a `check_hosting` request. A host always gets a fresh
    /// session; a joiner only an existing one matching their options, and
    /// is rejected (nothing created) when none is open. Acceptance reserves
    /// a seat for `conn` before identity negotiation.
    ///
    /// Returns the `check_hosting` reply for `conn` (`game_id` of `-1` on
    /// rejection).
    pub fn host_or_join(
        &mut self,
        conn: ConnId,
        host: bool,
        options: &HostOptions,
    ) -> ServerMessage {
        let rejected = ServerMessage::CheckHosting {
            accepted: false,
            game_id: -1,
        };

        let session = if host {
            match self.create_session(options) {
                Ok(session) => session,
                Err(_) => return rejected,
            }
        } else {
            if !valid_player_count(options.num_players) {
                return rejected;
            }
            match self.find_joinable(options) {
                Some(session) => session,
                None => return rejected,
            }
        };

        let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
        session.add_seat(conn);
        ServerMessage::CheckHosting {
            accepted: true,
            game_id: session.id(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
