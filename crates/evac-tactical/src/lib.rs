//! `evac-tactical` — turns assigned rescue items into per-tick actions.
//!
//! Each responder owns an ordered queue of [`ItemExecutionPlan`]s.  Every
//! tick the coordinator walks the active plan: travel to the entry exit,
//! follow the precomputed path, pick up at visit rooms, drop at the drop
//! exit, advance to the next plan.
//!
//! Emitted moves are pre-validated against the snapshot (edge existence and
//! a local per-tick flow budget), so a move the coordinator emits is one the
//! kernel will accept.  A hop whose edge has burned since the path was built
//! simply stalls the plan; the model facade notices the graph change next
//! tick and calls [`TacticalCoordinator::handle_graph_change`], which
//! truncates plans, collects unreachable pickups, and re-optimizes them onto
//! the responders that still have a way out.

pub mod coordinator;
pub mod plan;


pub use coordinator::TacticalCoordinator;
pub use plan::{ItemExecutionPlan, PlanPhase};
