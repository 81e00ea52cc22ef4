//! `evac-sweep` — phase-one partition-and-cover exploration.
//!
//! # Algorithm
//!
//! 1. Partition the unvisited rooms across responders with k-medoids over
//!    BFS hop distances (corridor distance, never Euclidean).
//! 2. Per cluster: complete graph over `cluster ∪ {responder start}`, Prim
//!    MST, DFS preorder — the classic "DFS 2×" tour whose walked length is
//!    bounded by twice the MST weight.
//! 3. Dispatch tick by tick: instruct capable occupants on contact, pick up
//!    incapable occupants opportunistically, drop them when passing an exit,
//!    otherwise step along the tour via current shortest paths.
//!
//! The tour stores room *order*; each hop is resolved against the live graph
//! at dispatch time, so a burned corridor reroutes automatically and a room
//! that becomes unreachable is deferred rather than chased forever.

pub mod cluster;
pub mod coordinator;
pub mod tour;

#[cfg(test)]
mod tests;

pub use cluster::{k_medoids, HopMatrix};
pub use coordinator::SweepCoordinator;
pub use tour::{dfs_preorder, prim_mst};
