//! `evac-sim` — the discrete-tick simulation kernel.
//!
//! # Tick contract
//!
//! ```text
//! for each tick:
//!   ① Responder actions — ascending responder id, each list in order,
//!       up to A action points; failed actions still consume their point.
//!   ② Instructed egress — capable occupants that have been instructed
//!       advance one hop toward their exit, bounded by edge flow and
//!       destination capacity.
//!   ③ Edge burn-out  — each existing edge independently clears with a
//!       probability driven by time, fire distance, and corridor width.
//!   ④ Fire          — intensity growth, preheating, ignition; rooms that
//!       cross the ignition threshold burn down and kill their occupants.
//!   ⑤ Smoke         — generation, diffusion, per-person casualty rolls.
//!   ⑥ Tick counter advances; a `TickResult` is returned.
//! ```
//!
//! # Fog of war
//!
//! [`Simulation::read`] returns a [`Snapshot`] that reveals topology, edge
//! existence, smoke, and burn flags everywhere, but occupant counts only for
//! vertices some responder has visited.  Planners never see kernel-internal
//! counts of unvisited rooms.
//!
//! # Determinism
//!
//! All stochastic decisions draw from one seeded stream in a fixed sequence;
//! identical (config, seed, action trace) reproduces identical tick results.

pub mod action;
pub mod error;
pub mod fire;
pub mod result;
pub mod sim;
pub mod smoke;
pub mod snapshot;
pub mod state;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use action::{Action, ActionMap};
pub use error::{SimError, SimResult};
pub use result::{ActionOutcome, ActionRecord, RejectReason, SimEvent, TickResult};
pub use sim::{ResponderParams, Simulation, Stats};
pub use snapshot::{OccupantCounts, ResponderView, Snapshot};
pub use state::{Responder, VertexState};
