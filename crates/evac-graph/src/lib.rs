//! `evac-graph` — the building graph, its JSON config loader, and the
//! pathfinding services used by the kernel and both planners.
//!
//! # Data layout
//!
//! The graph is an arena: vertices and edges live in flat `Vec`s keyed by
//! dense [`VertexId`]/[`EdgeId`], and adjacency is a per-vertex list of
//! `(neighbor, edge)` pairs.  There are no cyclic references; shortest-path
//! routines scan contiguous memory.
//!
//! # Ownership
//!
//! `BuildingGraph` holds only **static** topology and attributes.  Runtime
//! state (edge existence, smoke, occupants) is owned by the simulation kernel;
//! every routing function takes the graph plus an `exists: &[bool]` slice so
//! planners and the kernel always route over the graph *as it currently is*.

pub mod config;
pub mod error;
pub mod graph;
pub mod route;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{
    BuildingConfig, BuildingParams, EdgeConfig, FireParams, OccupancyConfig, OccupancyRange,
    VertexConfig,
};
pub use error::{GraphError, GraphResult};
pub use graph::{BuildingGraph, Edge, GraphBuilder, Point, Vertex};
pub use route::{
    bfs_distance, bfs_distances_from, bfs_next_step, bfs_path, dijkstra_from, find_exits,
    nearest_exit, DistanceMatrix, ShortestPaths,
};
