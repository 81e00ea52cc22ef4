//! Observable state returned by `Simulation::read`.
//!
//! The snapshot respects fog of war: occupant counts appear only for vertices
//! that some responder has visited, and never for exit-kind vertices.  Hazard
//! fields (smoke, burn flags, edge existence) are fully visible — the layout
//! is known from blueprints and the incident commander watches the building.

use std::collections::BTreeMap;

use evac_core::{EdgeId, ResponderId, Tick, VertexId};
use evac_graph::BuildingGraph;

// ── Component views ───────────────────────────────────────────────────────────

/// Last observed occupant counts of one discovered vertex.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupantCounts {
    pub capable: u32,
    pub incapable: u32,
    pub instructed: u32,
}

/// One responder as the planner sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponderView {
    pub position: VertexId,
    pub carrying: u32,
    pub capacity: u32,
    pub actions_per_tick: u32,
    /// Dense visited bitmap indexed by `VertexId`.
    pub visited: Vec<bool>,
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// A fog-of-war view of the simulation at one tick.
///
/// Borrows the static graph; reading twice without an intervening `update`
/// yields equal state.
pub struct Snapshot<'a> {
    pub tick: Tick,
    pub graph: &'a BuildingGraph,
    /// Edge existence indexed by `EdgeId`; cleared edges never return.
    pub edge_exists: Vec<bool>,
    /// Burn flags indexed by `VertexId`.
    pub burned: Vec<bool>,
    /// Smoke concentration fraction in [0, 1], indexed by `VertexId`.
    pub smoke_level: Vec<f64>,
    pub responders: BTreeMap<ResponderId, ResponderView>,
    /// Occupant counts for visited non-exit vertices only.
    pub discovered: BTreeMap<VertexId, OccupantCounts>,
    pub fire_origin: VertexId,
}

impl Snapshot<'_> {
    #[inline]
    pub fn edge_exists(&self, e: EdgeId) -> bool {
        self.edge_exists[e.index()]
    }

    /// Number of edges that have burned out so far.  The model facade watches
    /// this count grow to detect replan events.
    pub fn missing_edge_count(&self) -> usize {
        self.edge_exists.iter().filter(|&&x| !x).count()
    }

    /// Discovered rooms that still hold incapable occupants, in id order.
    pub fn rooms_with_incapable(&self) -> Vec<(VertexId, u32)> {
        self.discovered
            .iter()
            .filter(|&(_, counts)| counts.incapable > 0)
            .map(|(&v, counts)| (v, counts.incapable))
            .collect()
    }

    /// Room-kind vertices some responder has visited, in id order.
    pub fn visited_rooms(&self) -> Vec<VertexId> {
        self.graph
            .rooms()
            .into_iter()
            .filter(|&room| {
                self.responders
                    .values()
                    .any(|r| r.visited[room.index()])
            })
            .collect()
    }
}
