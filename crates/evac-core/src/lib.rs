//! `evac-core` — foundational types for the evac building-evacuation engine.
//!
//! This crate is a dependency of every other `evac-*` crate.  It intentionally
//! has no `evac-*` dependencies and minimal external ones (only `rand`,
//! `serde`, and `thiserror`).
//!
//! # What lives here
//!
//! | Module     | Contents                                          |
//! |------------|---------------------------------------------------|
//! | [`ids`]    | `VertexId`, `EdgeId`, `ResponderId`               |
//! | [`kind`]   | `VertexKind` enum                                 |
//! | [`time`]   | `Tick`, `SimClock`                                |
//! | [`rng`]    | `SimRng` (seeded stream)                          |
//! | [`error`]  | `CoreError`, `CoreResult`                         |

pub mod error;
pub mod ids;
pub mod kind;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, ResponderId, VertexId};
pub use kind::VertexKind;
pub use rng::SimRng;
pub use time::{SimClock, Tick};
