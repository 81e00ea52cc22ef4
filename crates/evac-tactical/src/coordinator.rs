//! Per-responder queues and the tick dispatch loop.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use evac_core::{EdgeId, ResponderId, VertexId};
use evac_graph::{bfs_next_step, bfs_path, nearest_exit};
use evac_rescue::{AssignmentInput, ItemAssigner, RescueItem, RescueOptimizer};
use evac_sim::{Action, ActionMap, Snapshot};

use crate::plan::{ItemExecutionPlan, PlanPhase};

/// Owns every responder's ordered item queue and translates the active plan
/// into concrete actions each tick.
#[derive(Default)]
pub struct TacticalCoordinator {
    queues: BTreeMap<ResponderId, VecDeque<ItemExecutionPlan>>,
    /// Responders with no remaining path to any exit.  Sticky: edges never
    /// come back, so neither do they.
    trapped: BTreeSet<ResponderId>,
}

impl TacticalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly assigned items to the responder queues.
    pub fn load(&mut self, assignments: BTreeMap<ResponderId, Vec<RescueItem>>) {
        for (rid, items) in assignments {
            let queue = self.queues.entry(rid).or_default();
            queue.extend(items.into_iter().map(ItemExecutionPlan::new));
        }
    }

    /// `true` when every queue has drained.
    pub fn idle(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    pub fn trapped(&self) -> &BTreeSet<ResponderId> {
        &self.trapped
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Emit up to A actions per responder.
    ///
    /// Moves are pre-validated against snapshot edge existence and a local
    /// flow budget shared across this tick's emissions, so every `Move`
    /// emitted here succeeds in the kernel.  A hop invalidated by a burned
    /// edge emits nothing; the replan hook picks it up next tick.
    pub fn actions(&mut self, snap: &Snapshot<'_>) -> ActionMap {
        let mut edge_flow: BTreeMap<EdgeId, u32> = BTreeMap::new();
        let mut actions = ActionMap::new();

        for (&rid, view) in &snap.responders {
            if self.trapped.contains(&rid) {
                continue;
            }
            let queue = self.queues.entry(rid).or_default();

            let mut list = Vec::new();
            let mut pos = view.position;
            let mut carrying = view.carrying;

            for _ in 0..view.actions_per_tick {
                // Completed plans fall off the front of the queue.
                while queue
                    .front()
                    .is_some_and(|plan| plan.is_complete(carrying))
                {
                    queue.pop_front();
                }
                let action = match queue.front_mut() {
                    Some(plan) => {
                        plan_step(plan, snap, &mut pos, &mut carrying, view.capacity, &mut edge_flow)
                    }
                    // No plan but still loaded (opportunistic sweep pickups):
                    // ferry the cargo to the nearest exit.
                    None if carrying > 0 => {
                        ferry_step(snap, &mut pos, &mut carrying, &mut edge_flow)
                    }
                    None => break,
                };
                match action {
                    Some(action) => list.push(action),
                    None => break,
                }
            }
            actions.insert(rid, list);
        }
        actions
    }

    // ── Replanning ────────────────────────────────────────────────────────

    /// React to burned edges: truncate every queued plan onto the surviving
    /// graph, collect pickups that are no longer reachable, declare trapped
    /// responders, and re-optimize the affected pickups onto everyone else.
    ///
    /// Returns the number of people whose pickups were affected.
    pub fn handle_graph_change(
        &mut self,
        snap: &Snapshot<'_>,
        optimizer: &RescueOptimizer,
        assigner: &dyn ItemAssigner,
    ) -> u32 {
        let graph = snap.graph;
        let exists = &snap.edge_exists;
        let mut affected: BTreeMap<VertexId, u32> = BTreeMap::new();

        for (&rid, view) in &snap.responders {
            if self.trapped.contains(&rid) {
                continue;
            }

            // A responder that cannot reach any exit is trapped; everything
            // it still owed goes back into the pool.
            let Some(fallback) = nearest_exit(graph, exists, view.position) else {
                self.trapped.insert(rid);
                if let Some(queue) = self.queues.get_mut(&rid) {
                    for plan in queue.drain(..) {
                        merge_vector(&mut affected, &plan.pending_vector());
                    }
                }
                continue;
            };

            let Some(queue) = self.queues.get_mut(&rid) else {
                continue;
            };
            for (i, plan) in queue.iter_mut().enumerate() {
                // The active plan resumes from where the responder stands;
                // queued plans re-anchor at their entry exit when it is still
                // reachable, else at the responder's position.
                let origin = if i == 0
                    || bfs_path(graph, exists, view.position, plan.entry_exit).is_none()
                {
                    view.position
                } else {
                    plan.entry_exit
                };

                let remaining = plan.remaining_rooms();
                let (reachable, unreachable): (Vec<VertexId>, Vec<VertexId>) = remaining
                    .into_iter()
                    .partition(|&room| bfs_path(graph, exists, origin, room).is_some());

                let lost =
                    plan.truncate_to_unaltered(&reachable, &unreachable, fallback, graph, exists, origin);
                merge_vector(&mut affected, &lost);
            }
        }

        let total: u32 = affected.values().sum();
        if total == 0 {
            return 0;
        }

        // Give the lost pickups to whoever can still get out.
        let eligible: Vec<ResponderId> = snap
            .responders
            .keys()
            .copied()
            .filter(|rid| !self.trapped.contains(rid))
            .collect();
        if eligible.is_empty() {
            return total;
        }

        let items = optimizer.generate_items(snap, &affected);
        if !items.is_empty() {
            let input = AssignmentInput {
                responders: &eligible,
                supply: &affected,
            };
            self.load(assigner.assign(&items, &input));
        }

        total
    }
}

// ── Plan stepping ─────────────────────────────────────────────────────────────

/// One dispatch step for the active plan.  `pos` and `carrying` simulate the
/// responder within the tick so several coherent actions can be emitted.
fn plan_step(
    plan: &mut ItemExecutionPlan,
    snap: &Snapshot<'_>,
    pos: &mut VertexId,
    carrying: &mut u32,
    capacity: u32,
    edge_flow: &mut BTreeMap<EdgeId, u32>,
) -> Option<Action> {
    let graph = snap.graph;

    // Phase 0: walk to the entry exit.
    if plan.phase == PlanPhase::TravelToEntry {
        if *pos == plan.entry_exit {
            plan.phase = PlanPhase::Executing;
        } else {
            let next = bfs_next_step(graph, &snap.edge_exists, *pos, plan.entry_exit)?;
            return emit_move(graph, snap, pos, next, edge_flow);
        }
    }

    // Skip waypoints already reached.
    while plan.current_waypoint() == Some(*pos) {
        plan.advance();
    }

    // Pickups due here.
    let pending = plan.pending_at(*pos);
    if pending > 0 {
        let present = snap
            .discovered
            .get(pos)
            .map(|counts| counts.incapable)
            .unwrap_or(0);
        if present == 0 {
            // Nobody left to lift (smoke or fire got here first); the plan
            // moves on rather than waiting for the dead.
            plan.record_pickup(*pos, pending);
        } else if *carrying < capacity {
            let count = pending.min(present).min(capacity - *carrying);
            plan.record_pickup(*pos, count);
            *carrying += count;
            return Some(Action::PickUp { count });
        }
    }

    // Cargo delivered at the drop exit.
    if *pos == plan.drop_exit && *carrying > 0 {
        *carrying = 0;
        return Some(Action::DropOff);
    }

    // Follow the precomputed path.
    if let Some(waypoint) = plan.current_waypoint() {
        return emit_move(graph, snap, pos, waypoint, edge_flow);
    }

    // Path exhausted while still loaded (early drop rerouting): head for the
    // drop exit over the live graph.
    if *carrying > 0 && *pos != plan.drop_exit {
        let next = bfs_next_step(graph, &snap.edge_exists, *pos, plan.drop_exit)?;
        return emit_move(graph, snap, pos, next, edge_flow);
    }

    None
}

/// Carry stranded cargo to the nearest exit and set it down.
fn ferry_step(
    snap: &Snapshot<'_>,
    pos: &mut VertexId,
    carrying: &mut u32,
    edge_flow: &mut BTreeMap<EdgeId, u32>,
) -> Option<Action> {
    if snap.graph.vertex(*pos).kind.is_exit() {
        *carrying = 0;
        return Some(Action::DropOff);
    }
    let exit = nearest_exit(snap.graph, &snap.edge_exists, *pos)?;
    let next = bfs_next_step(snap.graph, &snap.edge_exists, *pos, exit)?;
    emit_move(snap.graph, snap, pos, next, edge_flow)
}

/// Emit a pre-validated move: the edge must exist in the snapshot and have
/// per-tick flow left, otherwise the step stalls for this tick.
fn emit_move(
    graph: &evac_graph::BuildingGraph,
    snap: &Snapshot<'_>,
    pos: &mut VertexId,
    target: VertexId,
    edge_flow: &mut BTreeMap<EdgeId, u32>,
) -> Option<Action> {
    let &(_, edge) = graph
        .neighbors(*pos)
        .iter()
        .find(|&&(n, _)| n == target)?;
    if !snap.edge_exists(edge) {
        return None;
    }
    let used = edge_flow.entry(edge).or_insert(0);
    if *used >= graph.edge(edge).max_flow {
        return None;
    }
    *used += 1;
    *pos = target;
    Some(Action::Move { target })
}

fn merge_vector(into: &mut BTreeMap<VertexId, u32>, from: &BTreeMap<VertexId, u32>) {
    for (&room, &count) in from {
        *into.entry(room).or_insert(0) += count;
    }
}
