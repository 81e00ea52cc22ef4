//! Per-tick result bundle: action outcomes and kernel events.

use std::collections::BTreeMap;

use evac_core::{EdgeId, ResponderId, Tick, VertexId};

use crate::action::Action;

// ── Action outcomes ───────────────────────────────────────────────────────────

/// Why an action was rejected.  Rejections consume the action point but leave
/// state untouched; subsequent actions for the same responder still run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Move target is not a vertex of this building.
    UnknownTarget,
    /// Move target is not adjacent to the responder's position.
    NotAdjacent,
    /// The connecting edge has burned out.
    EdgeMissing,
    /// The edge's per-tick flow budget is spent.
    FlowExhausted,
    /// Pick-up of zero occupants.
    ZeroCount,
    /// Fewer incapable occupants present than requested.
    TooFewIncapable,
    /// Pick-up would exceed carry capacity.
    OverCapacity,
    /// Drop-off attempted while carrying nobody.
    NothingCarried,
    /// Drop-off attempted away from an exit-kind vertex.
    NotAnExit,
    /// Instruct with no capable occupants present.
    NoCapablePresent,
    /// Instruct with no exit reachable from here.
    NoExitReachable,
}

/// What a single action did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Moved,
    PickedUp(u32),
    DroppedOff(u32),
    Instructed(u32),
    Rejected(RejectReason),
}

impl ActionOutcome {
    #[inline]
    pub fn succeeded(self) -> bool {
        !matches!(self, ActionOutcome::Rejected(_))
    }
}

/// One attempted action and its outcome, in submission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: Action,
    pub outcome: ActionOutcome,
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Kernel events raised during a tick, in occurrence order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// An edge burned out and is gone for the rest of the run.
    EdgeBurned { edge: EdgeId },
    /// Fire intensity crossed the ignition threshold; all occupants died.
    RoomBurned { vertex: VertexId, deaths: u32 },
    /// Smoke casualty rolls killed occupants here this tick.
    SmokeDeaths { vertex: VertexId, deaths: u32 },
    /// Instructed occupants advanced one hop toward their exit.
    InstructedMoved {
        from: VertexId,
        to: VertexId,
        count: u32,
    },
    /// Instructed occupants reached an exit and are safe.
    InstructedRescued { vertex: VertexId, count: u32 },
    /// Instructed occupants have no remaining path to any exit.
    InstructedTrapped { vertex: VertexId, count: u32 },
}

// ── TickResult ────────────────────────────────────────────────────────────────

/// Everything that happened in one `update` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// The tick these results belong to (pre-increment).
    pub tick: Tick,
    /// Outcomes per responder, in submission order.
    pub action_results: BTreeMap<ResponderId, Vec<ActionRecord>>,
    pub events: Vec<SimEvent>,
    pub rescued_this_tick: u32,
    pub dead_this_tick: u32,
}

impl TickResult {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }
}
