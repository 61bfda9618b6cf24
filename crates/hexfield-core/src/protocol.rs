//! Wire protocol: the JSON messages exchanged with clients.
//!
//! Every message is a JSON object with an `action` field naming the message
//! type; remaining fields are flattened alongside it. Client-to-server and
//! server-to-client messages are separate enums since the sets are disjoint.
//!
//! Indices on the wire (settlement nodes, roads, tiles) refer to the fixed
//! tables in [`crate::topology`]. Dice faces are 0-indexed (0..=5); clients
//! add one for display.

use crate::board::TileType;
use crate::player::PlayerColor;
use serde::{Deserialize, Serialize};

/// Registry-assigned game identifier. `-1` in a `check_hosting` reply means
/// the request was rejected and no session exists.
pub type GameId = i64;

/// Transport-assigned connection handle.
///
/// Opaque to clients; it never appears on the wire. The server allocates one
/// per socket and the core uses it to address outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

/// Options a host asks for when requesting a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOptions {
    /// Requested seat count; must satisfy `1 < num_players <= MAX_PLAYERS`.
    pub num_players: u8,
    /// Whether the tile types are shuffled for this board.
    pub randomize: bool,
}

/// Identity of one seated player, as reported to other players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub username: String,
    pub color: PlayerColor,
}

/// Which selection an `invalid` reply refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Settlement,
    Road,
}

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask the lobby for a session: hosts get a fresh one, joiners an
    /// open one matching `options`.
    CheckHosting { host: bool, options: HostOptions },
    /// Propose a username/color pair during player setup.
    UserColorSelection {
        game_id: GameId,
        username: String,
        color: PlayerColor,
    },
    /// Place an initial settlement on the given node.
    SelectSettlement { game_id: GameId, settlement: usize },
    /// Place an initial road on the given road slot.
    SelectRoad { game_id: GameId, road: usize },
    /// Stop the dice animation and request the roll result.
    StopDice { game_id: GameId },
}

impl ClientMessage {
    /// The session this message addresses, if it carries one.
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            ClientMessage::CheckHosting { .. } => None,
            ClientMessage::UserColorSelection { game_id, .. }
            | ClientMessage::SelectSettlement { game_id, .. }
            | ClientMessage::SelectRoad { game_id, .. }
            | ClientMessage::StopDice { game_id } => Some(*game_id),
        }
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every new connection.
    Init,
    /// Reply to `check_hosting`; `game_id` is `-1` when rejected.
    CheckHosting { accepted: bool, game_id: GameId },
    /// Verdict on a username/color proposal, sent only to the proposer.
    CheckUserColor {
        accept_username: bool,
        accept_color: bool,
    },
    /// The 19 tile types in board order.
    GameBoard { layout: Vec<TileType> },
    /// All already-identified players, sent to a newly identified player.
    CurrentPlayers { players: Vec<PlayerInfo> },
    /// A newly identified player, sent to everyone already identified.
    NewPlayer { username: String, color: PlayerColor },
    /// Prompt: place your initial settlement.
    SelectSettlement,
    /// Prompt: place your initial road.
    SelectRoad,
    /// A settlement was placed, broadcast to the whole session.
    NewSettlement {
        settlement: usize,
        color: PlayerColor,
    },
    /// A road was placed, broadcast to the whole session.
    NewRoad { road: usize, color: PlayerColor },
    /// The sender's last selection was illegal; pick again.
    Invalid { message: SelectionKind },
    /// Someone else is placing; shown while waiting for `cur_player`.
    Wait { cur_player: String },
    /// Someone else is rolling; shown while waiting for `roller`.
    WaitDice { roller: String },
    /// Prompt: you are the roller, start the dice.
    RollDice,
    /// Result of a roll, broadcast to the whole session. Faces are 0..=5.
    DiceResult { left: u8, right: u8 },
}
