//! `evac-model` — the two-phase responder controller.
//!
//! Phase one sweeps the building (`evac-sweep`); once the sweep completion
//! predicate fires, the optimizer (`evac-rescue`) runs exactly once on the
//! snapshot, its assignments load into the tactical coordinator
//! (`evac-tactical`), and phase two executes them with replanning whenever
//! the fire removes edges.  The phase switch is monotonic and happens on
//! sweep completion alone — a building with no incapable occupants simply
//! transitions with zero items.
//!
//! Drivers use it as:
//!
//! ```rust,ignore
//! let mut model = RescueModel::new(ModelConfig::default());
//! loop {
//!     let snap = sim.read();
//!     let actions = model.decide(&snap);
//!     sim.update(&actions);
//! }
//! ```

pub mod model;

#[cfg(test)]
mod tests;

pub use model::{ModelConfig, Phase, RescueModel};
