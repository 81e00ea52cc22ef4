//! Mutable execution wrapper around one rescue item.

use std::collections::BTreeMap;

use evac_core::VertexId;
use evac_graph::{bfs_path, BuildingGraph};
use evac_rescue::RescueItem;

/// Where the responder is in the plan's lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlanPhase {
    /// Walking to the item's entry exit before the scripted path starts.
    TravelToEntry,
    /// Following `full_path`.
    Executing,
}

/// Execution state for one [`RescueItem`].
///
/// The item's fields are copied in; `vector` shrinks when rooms are cut off,
/// while `original_vector` keeps the full commitment for affected-pickup
/// accounting.
#[derive(Clone, Debug)]
pub struct ItemExecutionPlan {
    pub vector: BTreeMap<VertexId, u32>,
    pub visit_sequence: Vec<VertexId>,
    pub entry_exit: VertexId,
    pub drop_exit: VertexId,
    pub full_path: Vec<VertexId>,
    /// Pickups completed so far, per room.
    pub picked_up: BTreeMap<VertexId, u32>,
    /// Index into `full_path` of the next waypoint.
    pub path_index: usize,
    pub phase: PlanPhase,
    original_vector: BTreeMap<VertexId, u32>,
    /// Rooms cut off by a replan, with their pending counts already handed
    /// back to the optimizer.
    pub affected: Vec<VertexId>,
    pub truncated: bool,
}

impl ItemExecutionPlan {
    pub fn new(item: RescueItem) -> Self {
        let picked_up = item.vector.keys().map(|&room| (room, 0)).collect();
        Self {
            original_vector: item.vector.clone(),
            vector: item.vector,
            visit_sequence: item.visit_sequence,
            entry_exit: item.entry_exit,
            drop_exit: item.drop_exit,
            full_path: item.full_path,
            picked_up,
            path_index: 0,
            phase: PlanPhase::TravelToEntry,
            affected: Vec::new(),
            truncated: false,
        }
    }

    /// The next waypoint on the path, or `None` when the path is exhausted.
    #[inline]
    pub fn current_waypoint(&self) -> Option<VertexId> {
        self.full_path.get(self.path_index).copied()
    }

    #[inline]
    pub fn advance(&mut self) {
        self.path_index += 1;
    }

    /// Pickups still owed at `room`.
    pub fn pending_at(&self, room: VertexId) -> u32 {
        let owed = self.vector.get(&room).copied().unwrap_or(0);
        let done = self.picked_up.get(&room).copied().unwrap_or(0);
        owed.saturating_sub(done)
    }

    pub fn record_pickup(&mut self, room: VertexId, count: u32) {
        *self.picked_up.entry(room).or_insert(0) += count;
    }

    pub fn all_picked_up(&self) -> bool {
        self.vector.keys().all(|&room| self.pending_at(room) == 0)
    }

    /// Rooms with pending pickups, in visit order.
    pub fn remaining_rooms(&self) -> Vec<VertexId> {
        self.visit_sequence
            .iter()
            .copied()
            .filter(|&room| self.pending_at(room) > 0)
            .collect()
    }

    /// Pending pickups per room (what a trapped responder abandons).
    pub fn pending_vector(&self) -> BTreeMap<VertexId, u32> {
        self.vector
            .keys()
            .filter_map(|&room| {
                let pending = self.pending_at(room);
                (pending > 0).then_some((room, pending))
            })
            .collect()
    }

    /// Fully executed: path walked, every pickup made, cargo dropped.
    pub fn is_complete(&self, carrying: u32) -> bool {
        self.path_index >= self.full_path.len() && self.all_picked_up() && carrying == 0
    }

    /// Rewrite the plan to visit only `reachable` rooms and finish at
    /// `fallback_exit`, rebuilding `full_path` from `anchor` over the
    /// current graph.  Returns the pending pickups of the `unreachable`
    /// rooms, which the caller re-optimizes.
    ///
    /// The anchor becomes the plan's new entry point: a responder not
    /// already standing there walks to it first (`TravelToEntry`), which is
    /// how a queued plan re-anchored at its entry exit stays executable.
    pub fn truncate_to_unaltered(
        &mut self,
        reachable: &[VertexId],
        unreachable: &[VertexId],
        fallback_exit: VertexId,
        graph: &BuildingGraph,
        exists: &[bool],
        anchor: VertexId,
    ) -> BTreeMap<VertexId, u32> {
        let mut affected_vector = BTreeMap::new();
        for &room in unreachable {
            let pending = self.pending_at(room);
            if pending > 0 {
                affected_vector.insert(room, pending);
            }
            self.vector.remove(&room);
            self.affected.push(room);
        }

        self.visit_sequence = reachable.to_vec();
        self.drop_exit = fallback_exit;
        self.truncated = true;
        self.entry_exit = anchor;
        self.phase = PlanPhase::TravelToEntry;

        let mut path = vec![anchor];
        let mut current = anchor;
        for &room in reachable {
            if current == room {
                continue;
            }
            if let Some(leg) = bfs_path(graph, exists, current, room) {
                path.extend(&leg[1..]);
                current = room;
            }
        }
        if current != fallback_exit {
            if let Some(leg) = bfs_path(graph, exists, current, fallback_exit) {
                path.extend(&leg[1..]);
            }
        }

        self.full_path = path;
        self.path_index = 0;

        affected_vector
    }

    /// The pickups this plan originally promised, for reporting.
    pub fn original_vector(&self) -> &BTreeMap<VertexId, u32> {
        &self.original_vector
    }
}
