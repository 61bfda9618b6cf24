//! Player identity and resource management.
//!
//! This module contains:
//! - The player color palette
//! - ResourceHand for managing resource counts
//! - Seat state for one connection within a session
//! - Username validation

use crate::board::Resource;
use crate::protocol::ConnId;
use serde::{Deserialize, Serialize};

/// Player color chosen during player setup.
///
/// One entry per supported seat, which is where the six-player cap comes
/// from: colors must be unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
    Purple,
    Brown,
    Gray,
    Yellow,
}

impl PlayerColor {
    /// All selectable colors
    pub const ALL: [PlayerColor; 6] = [
        PlayerColor::White,
        PlayerColor::Black,
        PlayerColor::Purple,
        PlayerColor::Brown,
        PlayerColor::Gray,
        PlayerColor::Yellow,
    ];
}

/// Maximum seats in one session, bounded by the color palette.
pub const MAX_PLAYERS: u8 = PlayerColor::ALL.len() as u8;

/// Whether `name` is an acceptable username: 2 to 9 ASCII characters.
///
/// Uniqueness within a session is checked separately by the session.
pub fn is_valid_username(name: &str) -> bool {
    (2..=9).contains(&name.len()) && name.is_ascii()
}

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// Total number of cards in the hand
    pub fn total(&self) -> u32 {
        self.brick + self.lumber + self.ore + self.grain + self.wool
    }

    /// Whether the hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get the count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    /// Add resources of a specific type
    pub fn add(&mut self, resource: Resource, amount: u32) {
        match resource {
            Resource::Brick => self.brick += amount,
            Resource::Lumber => self.lumber += amount,
            Resource::Ore => self.ore += amount,
            Resource::Grain => self.grain += amount,
            Resource::Wool => self.wool += amount,
        }
    }

    /// Add all resources from another hand
    pub fn add_hand(&mut self, other: &ResourceHand) {
        self.brick += other.brick;
        self.lumber += other.lumber;
        self.ore += other.ore;
        self.grain += other.grain;
        self.wool += other.wool;
    }
}

/// One seat in a game session.
///
/// A seat is reserved for a connection when it joins the lobby; username and
/// color stay unset until the player-setup negotiation accepts a proposal.
/// The seat index in the session's list is the player's id and turn position.
#[derive(Debug, Clone)]
pub struct Seat {
    pub conn: ConnId,
    pub username: Option<String>,
    pub color: Option<PlayerColor>,
    pub resources: ResourceHand,
}

impl Seat {
    /// Reserve a seat for a connection, identity not yet negotiated.
    pub fn new(conn: ConnId) -> Self {
        Self {
            conn,
            username: None,
            color: None,
            resources: ResourceHand::new(),
        }
    }

    /// Whether both username and color have been accepted.
    pub fn is_identified(&self) -> bool {
        self.username.is_some() && self.color.is_some()
    }
}
