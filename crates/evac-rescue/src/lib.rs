//! `evac-rescue` — the phase-two optimizer.
//!
//! # Pipeline
//!
//! 1. All-pairs shortest paths over `rooms-with-incapable ∪ exits`.
//! 2. Item generation: every room subset up to the carry capacity, every
//!    positive allocation within observed supply, best permutation and exit
//!    pair per allocation, carrying legs charged at twice their length.
//! 3. Streaming domination pruning: single-room items are generated first and
//!    a multi-room item is dropped on production when it cannot beat running
//!    its per-room singles back to back.
//! 4. Assignment behind the [`ItemAssigner`] trait: greedy value density by
//!    default, an LP relaxation (`minilp`) rounded greedily as the optional
//!    variant.  Solver failure falls back to greedy.
//!
//! Item generation is bounded by an evaluation budget; a building that would
//! blow past it is retried with a smaller effective capacity rather than
//! stalling the tick loop.

pub mod assign;
pub mod error;
pub mod item;
pub mod optimizer;

#[cfg(test)]
mod tests;

pub use assign::{AssignmentInput, GreedyAssigner, ItemAssigner, LpAssigner};
pub use error::{RescueError, RescueResult};
pub use item::RescueItem;
pub use optimizer::RescueOptimizer;
