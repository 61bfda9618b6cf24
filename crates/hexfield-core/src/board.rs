//! Per-game board state: tile layout, ownership, and placement legality.
//!
//! This module contains:
//! - Resource and tile types
//! - The fixed default layout and roll-number frequency sequence
//! - `assign_layout` for default and randomized boards
//! - `BoardState` with legality checks and mutations
//!
//! All operations are index-based against the tables in [`crate::topology`];
//! out-of-range indices from clients are treated as illegal, never as a
//! reason to panic.

use crate::player::ResourceHand;
use crate::topology::{self, NUM_NODES, NUM_ROADS, NUM_TILES, ROAD_ENDPOINTS};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Player identifier within one session (seat index in turn order).
pub type PlayerId = u8;

/// Resource types produced by tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];
}

/// Type of hex tile on the board.
///
/// Serialized as a bare snake_case string so the `game_board` layout message
/// is a flat list of 19 type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
    /// The single non-producing tile. Never carries a roll number.
    Desert,
}

impl TileType {
    /// The resource this tile produces, if any.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            TileType::Brick => Some(Resource::Brick),
            TileType::Lumber => Some(Resource::Lumber),
            TileType::Ore => Some(Resource::Ore),
            TileType::Grain => Some(Resource::Grain),
            TileType::Wool => Some(Resource::Wool),
            TileType::Desert => None,
        }
    }
}

/// The beginner layout from the rulebook, in board order.
///
/// 4 lumber, 4 grain, 4 wool, 3 ore, 3 brick, 1 desert.
pub const DEFAULT_LAYOUT: [TileType; NUM_TILES] = [
    TileType::Lumber,
    TileType::Wool,
    TileType::Grain,
    TileType::Brick,
    TileType::Ore,
    TileType::Brick,
    TileType::Wool,
    TileType::Desert,
    TileType::Lumber,
    TileType::Grain,
    TileType::Lumber,
    TileType::Grain,
    TileType::Brick,
    TileType::Wool,
    TileType::Wool,
    TileType::Ore,
    TileType::Ore,
    TileType::Grain,
    TileType::Lumber,
];

/// Roll-number frequency for each board slot, fixed regardless of layout.
///
/// The 0 marks the slot the desert occupies in the default layout; when the
/// tile types are shuffled, whichever producing tile lands there inherits
/// the roll number displaced from under the desert. Keeping this sequence
/// bound to slots preserves the count of tiles producing on each of 2..12.
pub const ROLL_FREQUENCIES: [u8; NUM_TILES] =
    [11, 12, 9, 4, 6, 5, 10, 0, 3, 11, 4, 8, 8, 10, 9, 3, 5, 2, 6];

/// A single hex tile: its type and the dice roll that makes it produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    /// 2..=12, `None` for the desert.
    pub roll_number: Option<u8>,
}

/// Build the 19-tile assignment for a new board.
///
/// With `randomize` false this reproduces the default layout exactly. With
/// `randomize` true the tile *types* are permuted uniformly while the
/// frequency sequence stays bound to board slots; the roll number the desert
/// displaces is then handed to whichever tile sits on the zero-frequency
/// slot.
pub fn assign_layout<R: Rng>(randomize: bool, rng: &mut R) -> [Tile; NUM_TILES] {
    let mut types = DEFAULT_LAYOUT;
    if randomize {
        types.shuffle(rng);
    }

    // Exactly one desert exists, so this lookup cannot fail.
    let desert_slot = types
        .iter()
        .position(|t| *t == TileType::Desert)
        .unwrap_or(0);
    let displaced = ROLL_FREQUENCIES[desert_slot];

    let mut tiles = [Tile {
        tile_type: TileType::Desert,
        roll_number: None,
    }; NUM_TILES];

    for (slot, tile) in tiles.iter_mut().enumerate() {
        tile.tile_type = types[slot];
        tile.roll_number = if types[slot] == TileType::Desert {
            None
        } else if ROLL_FREQUENCIES[slot] == 0 {
            Some(displaced)
        } else {
            Some(ROLL_FREQUENCIES[slot])
        };
    }

    tiles
}

/// State of one settlement node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Set at most once; settlements are never removed.
    pub owner: Option<PlayerId>,
    /// Reserved for city upgrades (unused by the current rules scope).
    pub city: bool,
}

/// Mutable board state for one game session.
#[derive(Debug, Clone)]
pub struct BoardState {
    tiles: [Tile; NUM_TILES],
    nodes: [NodeState; NUM_NODES],
    roads: [Option<PlayerId>; NUM_ROADS],
}

impl BoardState {
    /// Create a board, shuffling the tile types if `randomize` is set.
    pub fn new(randomize: bool) -> Self {
        let mut rng = rand::thread_rng();
        Self::new_with_rng(randomize, &mut rng)
    }

    /// Create a board with a provided RNG for deterministic generation.
    pub fn new_with_rng<R: Rng>(randomize: bool, rng: &mut R) -> Self {
        Self {
            tiles: assign_layout(randomize, rng),
            nodes: [NodeState::default(); NUM_NODES],
            roads: [None; NUM_ROADS],
        }
    }

    // ==================== Query Methods ====================

    /// Get a tile by index.
    pub fn tile(&self, tile: usize) -> Option<&Tile> {
        self.tiles.get(tile)
    }

    /// The 19 tile types in board order, as sent in the `game_board` message.
    pub fn tile_types(&self) -> Vec<TileType> {
        self.tiles.iter().map(|t| t.tile_type).collect()
    }

    /// Owner of a node, if any (`None` also for out-of-range indices).
    pub fn node_owner(&self, node: usize) -> Option<PlayerId> {
        self.nodes.get(node).and_then(|n| n.owner)
    }

    /// Owner of a road, if any.
    pub fn road_owner(&self, road: usize) -> Option<PlayerId> {
        self.roads.get(road).copied().flatten()
    }

    // ==================== Validation Methods ====================

    /// Check the settlement placement rules for `node`: the node exists, is
    /// unowned, and no neighboring node is owned by anyone (the distance
    /// rule).
    pub fn is_settlement_placement_legal(&self, node: usize) -> bool {
        let Some(state) = self.nodes.get(node) else {
            return false;
        };
        if state.owner.is_some() {
            return false;
        }
        topology::neighbors(node)
            .iter()
            .all(|&n| self.nodes[n as usize].owner.is_none())
    }

    /// Check the road placement rules for `road` and `player`: the road
    /// exists, is unowned, and either an endpoint node is owned by `player`,
    /// or an endpoint is unowned and already has another road of `player`
    /// incident to it. A junction settled by a different player blocks
    /// extension through it.
    pub fn is_road_placement_legal(&self, road: usize, player: PlayerId) -> bool {
        let Some(owner) = self.roads.get(road) else {
            return false;
        };
        if owner.is_some() {
            return false;
        }

        ROAD_ENDPOINTS[road]
            .iter()
            .any(|&endpoint| match self.nodes[endpoint as usize].owner {
                Some(p) => p == player,
                None => topology::incident_roads(endpoint as usize)
                    .any(|r| r != road && self.roads[r] == Some(player)),
            })
    }

    // ==================== Mutation Methods ====================

    /// Record `player` as the owner of `node`.
    ///
    /// Callers must have validated with [`Self::is_settlement_placement_legal`]
    /// first. Out-of-range indices are ignored.
    pub fn place_settlement(&mut self, node: usize, player: PlayerId) {
        if let Some(state) = self.nodes.get_mut(node) {
            state.owner = Some(player);
        }
    }

    /// Record `player` as the owner of `road`.
    ///
    /// Same contract as [`Self::place_settlement`].
    pub fn place_road(&mut self, road: usize, player: PlayerId) {
        if let Some(owner) = self.roads.get_mut(road) {
            *owner = Some(player);
        }
    }

    // ==================== Resource Distribution ====================

    /// One resource per producing tile touching `node`, skipping the desert.
    ///
    /// Used to grant starting resources for the second initial settlement.
    pub fn resources_adjacent_to(&self, node: usize) -> ResourceHand {
        let mut hand = ResourceHand::new();
        for tile in topology::tiles_touching_node(node) {
            if let Some(resource) = self.tiles[tile].tile_type.resource() {
                hand.add(resource, 1);
            }
        }
        hand
    }
}
