//! Mutable runtime state: per-vertex occupants and hazards, per-responder
//! position and cargo.

use evac_core::{ResponderId, VertexId};

// ── VertexState ───────────────────────────────────────────────────────────────

/// Runtime state of one vertex.  Static attributes (kind, area, capacity)
/// live in the building graph.
#[derive(Clone, Debug, Default)]
pub struct VertexState {
    /// Occupants who can walk but have not yet been told to evacuate.
    pub capable: u32,
    /// Occupants who must be carried out.
    pub incapable: u32,
    /// Capable occupants already instructed and moving on their own.
    pub instructed: u32,
    /// Exit the instructed occupants here are heading for.
    pub instructed_exit: Option<VertexId>,
    /// Smoke volume in m³, capped at the vertex volume.
    pub smoke_m3: f64,
    /// Fire intensity in [0, 1]; pinned at 1.0 once burned.
    pub fire_intensity: f64,
    /// Sticky burn flag.  A burned vertex has no occupants.
    pub burned: bool,
}

impl VertexState {
    /// Everyone currently in the vertex, of all three classes.
    #[inline]
    pub fn occupants(&self) -> u32 {
        self.capable + self.incapable + self.instructed
    }

    /// Smoke concentration as a fraction of the vertex volume in [0, 1].
    /// Zero-volume vertices (hallways, exits) report zero.
    pub fn smoke_level(&self, volume: f64) -> f64 {
        if volume <= 0.0 {
            return 0.0;
        }
        (self.smoke_m3 / volume).min(1.0)
    }

    /// Kill every occupant and mark the vertex burned.  Returns the deaths.
    pub fn burn_down(&mut self, volume: f64) -> u32 {
        let deaths = self.occupants();
        self.capable = 0;
        self.incapable = 0;
        self.instructed = 0;
        self.burned = true;
        self.fire_intensity = 1.0;
        self.smoke_m3 = volume;
        deaths
    }
}

// ── Responder ─────────────────────────────────────────────────────────────────

/// One firefighter.
#[derive(Clone, Debug)]
pub struct Responder {
    pub id: ResponderId,
    /// Current vertex.  Always valid; responders are never mid-edge between
    /// ticks.
    pub position: VertexId,
    /// Incapable occupants currently carried, `0 ..= capacity`.
    pub carrying: u32,
    /// Carry capacity K.
    pub capacity: u32,
    /// Action points A per tick.
    pub actions_per_tick: u32,
    /// Dense visited bitmap indexed by `VertexId`; drives fog-of-war
    /// discovery in the snapshot.
    pub visited: Vec<bool>,
}

impl Responder {
    pub fn new(
        id: ResponderId,
        position: VertexId,
        capacity: u32,
        actions_per_tick: u32,
        vertex_count: usize,
    ) -> Self {
        let mut visited = vec![false; vertex_count];
        visited[position.index()] = true;
        Self {
            id,
            position,
            carrying: 0,
            capacity,
            actions_per_tick,
            visited,
        }
    }

    #[inline]
    pub fn mark_visited(&mut self, v: VertexId) {
        self.visited[v.index()] = true;
    }
}
