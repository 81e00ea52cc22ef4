//! Tick-by-tick sweep dispatch, replanning, and stall detection.

use std::collections::{BTreeMap, BTreeSet};

use evac_core::{ResponderId, SimRng, VertexId};
use evac_graph::{bfs_next_step, bfs_path, nearest_exit};
use evac_sim::{Action, ActionMap, Snapshot};

use crate::cluster::{k_medoids, HopMatrix};
use crate::tour::{dfs_preorder, prim_mst};

/// Ticks of global idleness that confirm the fast-path completion check.
const IDLE_CONFIRM_TICKS: u32 = 2;

/// Phase-one coordinator: partitions the rooms, walks each responder through
/// its cluster tour, and decides when the sweep is over.
pub struct SweepCoordinator {
    stall_window: u32,
    rng: SimRng,
    initialized: bool,
    /// Remaining room visit order per responder.
    tours: BTreeMap<ResponderId, Vec<VertexId>>,
    tour_index: BTreeMap<ResponderId, usize>,
    home_exit: BTreeMap<ResponderId, VertexId>,
    /// Rooms found unreachable mid-tour; re-added on replan if a path returns.
    deferred: BTreeSet<VertexId>,
    replan_count: u32,
    last_missing_edges: usize,
    ticks_since_progress: u32,
    last_visited_count: usize,
}

impl SweepCoordinator {
    pub fn new(stall_window: u32, seed: u64) -> Self {
        Self {
            stall_window,
            rng: SimRng::new(seed),
            initialized: false,
            tours: BTreeMap::new(),
            tour_index: BTreeMap::new(),
            home_exit: BTreeMap::new(),
            deferred: BTreeSet::new(),
            replan_count: 0,
            last_missing_edges: 0,
            ticks_since_progress: 0,
            last_visited_count: 0,
        }
    }

    pub fn replan_count(&self) -> u32 {
        self.replan_count
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Emit up to A actions per responder for this tick.
    pub fn actions(&mut self, snap: &Snapshot<'_>) -> ActionMap {
        let missing = snap.missing_edge_count();
        if !self.initialized {
            self.plan(snap);
            self.initialized = true;
        } else if missing > self.last_missing_edges {
            // Burned edges invalidate the hop distances the partition was
            // built on; re-partition whatever is still unvisited.
            self.plan(snap);
            self.replan_count += 1;
        }
        self.last_missing_edges = missing;

        let visited: BTreeSet<VertexId> = snap.visited_rooms().into_iter().collect();
        // Local copies so one tick never double-instructs or double-picks.
        let mut capable_left: BTreeMap<VertexId, u32> = snap
            .discovered
            .iter()
            .map(|(&v, c)| (v, c.capable))
            .collect();
        let mut incapable_left: BTreeMap<VertexId, u32> = snap
            .discovered
            .iter()
            .map(|(&v, c)| (v, c.incapable))
            .collect();

        let mut actions = ActionMap::new();
        for (&rid, view) in &snap.responders {
            let mut list = Vec::new();
            let mut pos = view.position;
            let mut carrying = view.carrying;

            for _ in 0..view.actions_per_tick {
                let action = self.next_action(
                    rid,
                    snap,
                    &visited,
                    &mut capable_left,
                    &mut incapable_left,
                    &mut pos,
                    &mut carrying,
                    view.capacity,
                );
                match action {
                    Some(a) => {
                        // Stepping into an undiscovered room ends the tick's
                        // emission: its occupants are unknown until the next
                        // snapshot, and instructing or picking up comes first.
                        let entered_unknown = matches!(a, Action::Move { target }
                            if snap.graph.vertex(target).kind.is_room()
                                && !visited.contains(&target));
                        list.push(a);
                        if entered_unknown {
                            break;
                        }
                    }
                    None => break,
                }
            }
            actions.insert(rid, list);
        }
        actions
    }

    /// One dispatch step for one responder, simulating position and cargo
    /// locally so a tick can hold several coherent actions.
    #[allow(clippy::too_many_arguments)]
    fn next_action(
        &mut self,
        rid: ResponderId,
        snap: &Snapshot<'_>,
        visited: &BTreeSet<VertexId>,
        capable_left: &mut BTreeMap<VertexId, u32>,
        incapable_left: &mut BTreeMap<VertexId, u32>,
        pos: &mut VertexId,
        carrying: &mut u32,
        capacity: u32,
    ) -> Option<Action> {
        let graph = snap.graph;

        // ① Instruct capable occupants on contact.
        if capable_left.get(pos).copied().unwrap_or(0) > 0 {
            capable_left.insert(*pos, 0);
            return Some(Action::Instruct);
        }

        // ② Opportunistic pickup with spare capacity.
        let present = incapable_left.get(pos).copied().unwrap_or(0);
        if present > 0 && *carrying < capacity {
            let count = present.min(capacity - *carrying);
            incapable_left.insert(*pos, present - count);
            *carrying += count;
            return Some(Action::PickUp { count });
        }

        // ③ Passing an exit while loaded: unload.
        if *carrying > 0 && graph.vertex(*pos).kind.is_exit() {
            *carrying = 0;
            return Some(Action::DropOff);
        }

        // ④ Tour navigation.
        let tour = self.tours.entry(rid).or_default().clone();
        let mut idx = *self.tour_index.entry(rid).or_insert(0);
        while idx < tour.len() {
            let target = tour[idx];
            if target == *pos || self.deferred.contains(&target) {
                idx += 1;
                continue;
            }
            match bfs_next_step(graph, &snap.edge_exists, *pos, target) {
                Some(next) => {
                    self.tour_index.insert(rid, idx);
                    *pos = next;
                    return Some(Action::Move { target: next });
                }
                None => {
                    // Cut off; come back to it if a replan restores a path.
                    self.deferred.insert(target);
                    idx += 1;
                }
            }
        }
        self.tour_index.insert(rid, idx);

        // ⑤ Post-tour: chase discovered rooms still holding capable occupants.
        let capable_rooms: Vec<VertexId> = capable_left
            .iter()
            .filter(|&(_, &n)| n > 0)
            .map(|(&v, _)| v)
            .collect();
        if let Some(next) = self.step_toward_nearest(snap, *pos, &capable_rooms) {
            *pos = next;
            return Some(Action::Move { target: next });
        }

        // ⑥ Then any still-unvisited reachable rooms.
        let unvisited: Vec<VertexId> = graph
            .rooms()
            .into_iter()
            .filter(|room| !visited.contains(room))
            .collect();
        if let Some(next) = self.step_toward_nearest(snap, *pos, &unvisited) {
            *pos = next;
            return Some(Action::Move { target: next });
        }

        // ⑦ Loaded with nothing left to visit: head for an exit.
        if *carrying > 0 {
            if let Some(exit) = nearest_exit(graph, &snap.edge_exists, *pos) {
                if let Some(next) = bfs_next_step(graph, &snap.edge_exists, *pos, exit) {
                    *pos = next;
                    return Some(Action::Move { target: next });
                }
            }
        }

        // ⑧ Park at the home exit.
        if let Some(&home) = self.home_exit.get(&rid) {
            if *pos != home {
                if let Some(next) = bfs_next_step(graph, &snap.edge_exists, *pos, home) {
                    *pos = next;
                    return Some(Action::Move { target: next });
                }
            }
        }

        None
    }

    /// First hop toward the hop-nearest reachable target, if any.
    fn step_toward_nearest(
        &self,
        snap: &Snapshot<'_>,
        pos: VertexId,
        targets: &[VertexId],
    ) -> Option<VertexId> {
        targets
            .iter()
            .filter_map(|&t| {
                let path = bfs_path(snap.graph, &snap.edge_exists, pos, t)?;
                (path.len() > 1).then(|| (path.len(), t, path[1]))
            })
            .min_by_key(|&(len, t, _)| (len, t))
            .map(|(_, _, next)| next)
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// (Re)partition the unvisited rooms and rebuild every responder's tour
    /// from its current position.
    fn plan(&mut self, snap: &Snapshot<'_>) {
        let graph = snap.graph;
        let visited: BTreeSet<VertexId> = snap.visited_rooms().into_iter().collect();
        let rooms: Vec<VertexId> = graph
            .rooms()
            .into_iter()
            .filter(|room| !visited.contains(room))
            .collect();

        self.deferred.clear();
        self.tours.clear();
        self.tour_index.clear();

        let responder_ids: Vec<ResponderId> = snap.responders.keys().copied().collect();
        let starts: Vec<VertexId> = responder_ids
            .iter()
            .map(|rid| snap.responders[rid].position)
            .collect();

        // Home exits are fixed on first planning and survive replans.
        if self.home_exit.is_empty() {
            for (rid, &start) in responder_ids.iter().zip(&starts) {
                if let Some(exit) = nearest_exit(graph, &snap.edge_exists, start) {
                    self.home_exit.insert(*rid, exit);
                }
            }
        }

        let clusters = k_medoids(graph, &snap.edge_exists, &rooms, &starts, &mut self.rng);

        // Everything k-medoids left out is unreachable right now.
        let clustered: BTreeSet<VertexId> = clusters.iter().flatten().copied().collect();
        for &room in &rooms {
            if !clustered.contains(&room) {
                self.deferred.insert(room);
            }
        }

        for ((rid, cluster), &start) in responder_ids.iter().zip(clusters).zip(&starts) {
            if cluster.is_empty() {
                self.tours.insert(*rid, Vec::new());
                self.tour_index.insert(*rid, 0);
                continue;
            }
            let mut nodes = cluster.clone();
            nodes.push(start);
            let hops = HopMatrix::build(graph, &snap.edge_exists, &nodes);
            let mst = prim_mst(&nodes, start, &hops);
            let tour: Vec<VertexId> = dfs_preorder(&mst, start)
                .into_iter()
                .filter(|v| cluster.contains(v))
                .collect();
            self.tours.insert(*rid, tour);
            self.tour_index.insert(*rid, 0);
        }
    }

    // ── Completion ────────────────────────────────────────────────────────

    /// Sweep completion predicate: every room visited or unreachable, and no
    /// uninstructed capable occupants left in discovered rooms.  A stall
    /// window guards against chasing rooms the fire has cut off.
    pub fn is_complete(&mut self, snap: &Snapshot<'_>) -> bool {
        let graph = snap.graph;
        let rooms: BTreeSet<VertexId> = graph.rooms().into_iter().collect();
        let visited: BTreeSet<VertexId> = snap.visited_rooms().into_iter().collect();

        let all_capable_instructed = snap
            .discovered
            .values()
            .all(|counts| counts.capable == 0);

        if rooms.is_subset(&visited) && all_capable_instructed {
            return true;
        }

        // Progress means another room entered the visited set.
        if visited.len() > self.last_visited_count {
            self.last_visited_count = visited.len();
            self.ticks_since_progress = 0;
        } else {
            self.ticks_since_progress += 1;
        }

        // Fast path: every responder parked at its home exit with a finished
        // tour means whatever is left cannot be reached.
        if self.initialized && self.ticks_since_progress >= IDLE_CONFIRM_TICKS {
            let all_idle = snap.responders.iter().all(|(rid, view)| {
                let finished = self
                    .tours
                    .get(rid)
                    .map(|tour| {
                        let idx = self.tour_index.get(rid).copied().unwrap_or(0);
                        idx >= tour.len()
                    })
                    .unwrap_or(true);
                finished && self.home_exit.get(rid) == Some(&view.position)
            });
            if all_idle && all_capable_instructed {
                return true;
            }
        }

        if self.ticks_since_progress < self.stall_window {
            return false;
        }

        // Stalled for the whole window: are the leftovers provably cut off?
        let unvisited: Vec<VertexId> = rooms.difference(&visited).copied().collect();
        if unvisited.is_empty() {
            return true;
        }
        let any_reachable = snap.responders.values().any(|view| {
            unvisited
                .iter()
                .any(|&room| bfs_path(graph, &snap.edge_exists, view.position, room).is_some())
        });
        if any_reachable {
            // Something is still reachable; keep sweeping.
            self.ticks_since_progress = 0;
            return false;
        }
        true
    }
}
