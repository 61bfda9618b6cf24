//! Hexfield - rules engine for a Catan-style multiplayer board game
//!
//! This crate provides the platform-agnostic core of the game server:
//! - The fixed 54-node / 72-road / 19-tile board topology
//! - Board state with placement legality and resource lookups
//! - Player seats, colors, and resource hands
//! - The JSON wire protocol shared with clients
//! - The per-game session state machine
//! - The lobby that matches connections to sessions
//!
//! # Architecture
//!
//! Nothing here performs I/O: the session state machine consumes decoded
//! client messages and returns addressed outbound messages, and the server
//! binary owns the sockets. That keeps every rule testable without a
//! runtime.
//!
//! # Modules
//!
//! - [`topology`]: the immutable board graph and its index tables
//! - [`board`]: per-game tile layout and ownership state
//! - [`player`]: seats, colors, and resource hands
//! - [`protocol`]: client/server message types
//! - [`session`]: the game session state machine
//! - [`lobby`]: session registry and matchmaking

pub mod board;
pub mod lobby;
pub mod player;
pub mod protocol;
pub mod session;
pub mod topology;

// Re-export commonly used types
pub use board::{BoardState, PlayerId, Resource, Tile, TileType};
pub use lobby::{Lobby, LobbyError};
pub use player::{PlayerColor, ResourceHand, Seat, MAX_PLAYERS};
pub use protocol::{
    ClientMessage, ConnId, GameId, HostOptions, PlayerInfo, SelectionKind, ServerMessage,
};
pub use session::{GamePhase, GameSession, Outbound, SetupPlacing};
