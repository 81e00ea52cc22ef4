//! Phase orchestration and the replan trigger.

use std::collections::BTreeMap;

use evac_core::VertexId;
use evac_rescue::{
    AssignmentInput, GreedyAssigner, ItemAssigner, LpAssigner, RescueOptimizer,
};
use evac_sim::{ActionMap, Snapshot};
use evac_sweep::SweepCoordinator;
use evac_tactical::TacticalCoordinator;

// ── Phase ─────────────────────────────────────────────────────────────────────

/// The controller's phase.  Monotonic: once `Rescue`, never back.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    Sweep,
    Rescue,
}

// ── ModelConfig ───────────────────────────────────────────────────────────────

/// Tuning knobs, all explicit at construction.  No global state.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Select the LP assignment variant instead of greedy.
    pub use_lp: bool,
    /// Fire-proximity boost weight `w_f ≥ 0`.
    pub fire_priority_weight: f64,
    /// Under-capacity penalty `α ∈ [0, 1]`.
    pub under_capacity_penalty: f64,
    /// Carry capacity the optimizer plans against.
    pub k_capacity: u32,
    /// Seed for k-medoids tie-breaking.
    pub sweep_seed: u64,
    /// Sweep stall window W in ticks.
    pub stall_window_ticks: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            use_lp: false,
            fire_priority_weight: 0.0,
            under_capacity_penalty: 0.0,
            k_capacity: 3,
            sweep_seed: 0,
            stall_window_ticks: 20,
        }
    }
}

// ── RescueModel ───────────────────────────────────────────────────────────────

/// The two-phase controller: `decide` maps a snapshot to this tick's actions.
pub struct RescueModel {
    phase: Phase,
    sweep: SweepCoordinator,
    optimizer: RescueOptimizer,
    assigner: Box<dyn ItemAssigner>,
    tactical: TacticalCoordinator,
    /// Missing-edge count at the last decide; growth means a replan event.
    missing_edges: usize,
    replan_count: u32,
}

impl RescueModel {
    pub fn new(config: ModelConfig) -> Self {
        let assigner: Box<dyn ItemAssigner> = if config.use_lp {
            Box::new(LpAssigner)
        } else {
            Box::new(GreedyAssigner)
        };
        Self {
            phase: Phase::Sweep,
            sweep: SweepCoordinator::new(config.stall_window_ticks, config.sweep_seed),
            optimizer: RescueOptimizer {
                capacity: config.k_capacity.max(1),
                fire_weight: config.fire_priority_weight,
                under_capacity_penalty: config.under_capacity_penalty,
                ..Default::default()
            },
            assigner,
            tactical: TacticalCoordinator::new(),
            missing_edges: 0,
            replan_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replan events handled across both phases.
    pub fn replan_count(&self) -> u32 {
        self.replan_count + self.sweep.replan_count()
    }

    /// `true` once the rescue phase has nothing queued anywhere.
    pub fn idle(&self) -> bool {
        self.phase == Phase::Rescue && self.tactical.idle()
    }

    // ── Per-tick decision ─────────────────────────────────────────────────

    pub fn decide(&mut self, snap: &Snapshot<'_>) -> ActionMap {
        match self.phase {
            Phase::Sweep => {
                if self.sweep.is_complete(snap) {
                    self.transition(snap);
                    self.dispatch_rescue(snap)
                } else {
                    self.sweep.actions(snap)
                }
            }
            Phase::Rescue => self.dispatch_rescue(snap),
        }
    }

    /// One-time switch to the rescue phase: generate items over everything
    /// discovered, assign, and load the tactical queues.
    fn transition(&mut self, snap: &Snapshot<'_>) {
        self.phase = Phase::Rescue;
        self.missing_edges = snap.missing_edge_count();

        let supply: BTreeMap<VertexId, u32> = snap.rooms_with_incapable().into_iter().collect();
        if supply.is_empty() {
            return; // nothing to plan; the run winds down
        }

        let items = self.optimizer.generate_items(snap, &supply);
        if items.is_empty() {
            return;
        }

        let responders: Vec<_> = snap.responders.keys().copied().collect();
        let input = AssignmentInput {
            responders: &responders,
            supply: &supply,
        };
        self.tactical.load(self.assigner.assign(&items, &input));
    }

    fn dispatch_rescue(&mut self, snap: &Snapshot<'_>) -> ActionMap {
        let missing = snap.missing_edge_count();
        if missing > self.missing_edges {
            self.tactical
                .handle_graph_change(snap, &self.optimizer, self.assigner.as_ref());
            self.replan_count += 1;
        }
        self.missing_edges = missing;
        self.tactical.actions(snap)
    }
}
