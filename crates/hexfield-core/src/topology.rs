//! Fixed board topology for the standard 19-hex board.
//!
//! Every game shares the same graph: 54 nodes (settlement corners), 72 roads
//! (edges between adjacent nodes) and 19 hex tiles, each bounded by 6 nodes.
//! The tables below are the single source of truth for what a node/road/tile
//! index means on the wire, so they must never be reordered.
//!
//! Nodes are numbered from the top row of hexes outward; see the road and
//! neighbor tables for the resulting adjacency.

/// Number of settlement nodes on the board.
pub const NUM_NODES: usize = 54;

/// Number of road slots on the board.
pub const NUM_ROADS: usize = 72;

/// Number of hex tiles on the board.
pub const NUM_TILES: usize = 19;

/// The two endpoint nodes of every road, indexed by road id.
pub const ROAD_ENDPOINTS: [[u8; 2]; NUM_ROADS] = [
    [0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 0],
    [6, 7], [7, 0], [5, 8], [8, 9], [9, 6], [10, 11],
    [11, 6], [9, 12], [12, 13], [13, 10], [3, 14],
    [14, 15], [15, 16], [16, 17], [17, 4], [17, 18],
    [18, 19], [8, 19], [19, 20], [20, 21], [22, 13],
    [12, 21], [21, 23], [23, 24], [24, 22], [15, 25],
    [25, 26], [26, 27], [27, 28], [28, 16], [28, 29],
    [29, 30], [30, 18], [30, 31], [31, 32], [32, 20],
    [32, 33], [33, 34], [34, 23], [35, 24], [34, 36],
    [36, 37], [37, 35], [27, 38], [38, 39], [39, 40],
    [40, 29], [40, 41], [41, 42], [42, 31], [42, 43],
    [43, 44], [44, 33], [44, 45], [45, 46], [46, 36],
    [39, 47], [47, 48], [48, 49], [49, 41], [49, 50],
    [50, 51], [51, 43], [51, 52], [52, 53], [53, 45],
];

/// Neighboring nodes of every node, indexed by node id.
///
/// Corner nodes have two neighbors, interior nodes three. This table must
/// agree with [`ROAD_ENDPOINTS`]: `b` is a neighbor of `a` iff some road
/// connects `a` and `b` (checked by tests).
pub const NODE_NEIGHBORS: [&[u8]; NUM_NODES] = [
    &[1, 5, 7],
    &[0, 2],
    &[1, 3],
    &[2, 4, 14],
    &[3, 5, 17],
    &[0, 4, 8],
    &[7, 9, 11],
    &[0, 6],
    &[5, 9, 19],
    &[6, 8, 12],
    &[11, 13],
    &[6, 10],
    &[9, 13, 21],
    &[10, 12, 22],
    &[3, 15],
    &[14, 16, 25],
    &[15, 17, 28],
    &[4, 16, 18],
    &[17, 19, 30],
    &[8, 18, 20],
    &[19, 21, 32],
    &[12, 20, 23],
    &[13, 24],
    &[21, 24, 34],
    &[22, 23, 35],
    &[15, 26],
    &[25, 27],
    &[26, 28, 38],
    &[16, 27, 29],
    &[28, 30, 40],
    &[18, 29, 31],
    &[30, 32, 42],
    &[20, 31, 33],
    &[32, 34, 44],
    &[23, 33, 36],
    &[24, 37],
    &[34, 37, 46],
    &[35, 36],
    &[27, 39],
    &[38, 40, 47],
    &[29, 39, 41],
    &[40, 42, 49],
    &[31, 41, 43],
    &[42, 44, 51],
    &[33, 43, 45],
    &[44, 46, 53],
    &[36, 45],
    &[39, 48],
    &[47, 49],
    &[41, 48, 50],
    &[49, 51],
    &[43, 50, 52],
    &[51, 53],
    &[45, 52],
];

/// The six boundary nodes of every hex tile, indexed by tile id.
///
/// Tiles run in reading order: a row of 3, then 4, then 5, then 4, then 3.
pub const TILE_NODES: [[u8; 6]; NUM_TILES] = [
    [0, 1, 2, 3, 4, 5],
    [6, 7, 0, 5, 8, 9],
    [10, 11, 6, 9, 12, 13],
    [4, 3, 14, 15, 16, 17],
    [8, 5, 4, 17, 18, 19],
    [12, 9, 8, 19, 20, 21],
    [22, 13, 12, 21, 23, 24],
    [16, 15, 25, 26, 27, 28],
    [18, 17, 16, 28, 29, 30],
    [20, 19, 18, 30, 31, 32],
    [23, 21, 20, 32, 33, 34],
    [35, 24, 23, 34, 36, 37],
    [29, 28, 27, 38, 39, 40],
    [31, 30, 29, 40, 41, 42],
    [33, 32, 31, 42, 43, 44],
    [36, 34, 33, 44, 45, 46],
    [41, 40, 39, 47, 48, 49],
    [43, 42, 41, 49, 50, 51],
    [45, 44, 43, 51, 52, 53],
];

/// Neighboring nodes of `node`, or an empty slice for an out-of-range index.
pub fn neighbors(node: usize) -> &'static [u8] {
    NODE_NEIGHBORS.get(node).copied().unwrap_or(&[])
}

/// Road ids incident to `node`.
pub fn incident_roads(node: usize) -> impl Iterator<Item = usize> {
    ROAD_ENDPOINTS
        .iter()
        .enumerate()
        .filter(move |(_, [a, b])| *a as usize == node || *b as usize == node)
        .map(|(road, _)| road)
}

/// Tile ids whose boundary contains `node` (between 1 and 3 tiles).
pub fn tiles_touching_node(node: usize) -> impl Iterator<Item = usize> {
    TILE_NODES
        .iter()
        .enumerate()
        .filter(move |(_, nodes)| nodes.iter().any(|&n| n as usize == node))
        .map(|(tile, _)| tile)
}
