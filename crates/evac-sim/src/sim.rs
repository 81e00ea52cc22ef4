//! The `Simulation` struct and its tick loop.

use std::collections::BTreeMap;

use evac_core::{ResponderId, SimClock, SimRng, Tick, VertexId};
use evac_graph::{bfs_path, nearest_exit, BuildingConfig, BuildingGraph};

use crate::action::{Action, ActionMap};
use crate::error::{SimError, SimResult};
use crate::result::{ActionOutcome, ActionRecord, RejectReason, SimEvent, TickResult};
use crate::snapshot::{OccupantCounts, ResponderView, Snapshot};
use crate::state::{Responder, VertexState};
use crate::{fire, smoke};

// ── Responder parameters ──────────────────────────────────────────────────────

/// Per-responder tuning shared by every responder of a run.
#[derive(Copy, Clone, Debug)]
pub struct ResponderParams {
    /// Carry capacity K.
    pub carry_capacity: u32,
    /// Action points A per tick.
    pub actions_per_tick: u32,
}

impl Default for ResponderParams {
    fn default() -> Self {
        Self {
            carry_capacity: 3,
            actions_per_tick: 2,
        }
    }
}

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Cumulative run statistics.  `rescued + dead + remaining == total_initial`
/// holds at every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub tick: Tick,
    pub rescued: u32,
    pub dead: u32,
    /// Occupants still in the building, including those being carried.
    pub remaining: u32,
    pub total_initial: u32,
    pub time_minutes: f64,
    /// Tick of the most recent rescue, if any occurred yet.
    pub last_rescue_tick: Option<Tick>,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The simulation kernel: owns the graph, all runtime state, and the seeded
/// RNG.  Drivers call [`read`](Self::read) / [`update`](Self::update) in a
/// loop; planners only ever see the snapshot.
pub struct Simulation {
    graph: BuildingGraph,
    clock: SimClock,
    rng: SimRng,
    fire_origin: VertexId,
    floor_height_m: f64,
    vertices: Vec<VertexState>,
    edge_exists: Vec<bool>,
    /// Distance from each edge midpoint to the nearest burning vertex,
    /// refreshed after fire spreads.
    edge_fire_dist: Vec<f64>,
    responders: Vec<Responder>,
    rescued: u32,
    dead: u32,
    total_initial: u32,
    last_rescue_tick: Option<Tick>,
}

impl Simulation {
    /// Build a simulation with default responder parameters (K = 3, A = 2).
    pub fn new(
        config: &BuildingConfig,
        num_responders: u32,
        fire_origin: &str,
        seed: u64,
    ) -> SimResult<Self> {
        Self::with_params(
            config,
            num_responders,
            fire_origin,
            seed,
            ResponderParams::default(),
        )
    }

    /// Build a simulation with explicit responder parameters.
    ///
    /// Validates the config (graph structure, exits, fire origin), draws the
    /// initial occupants from the seeded stream, places responders
    /// round-robin across the exits, and ignites the fire origin.
    pub fn with_params(
        config: &BuildingConfig,
        num_responders: u32,
        fire_origin: &str,
        seed: u64,
        params: ResponderParams,
    ) -> SimResult<Self> {
        let graph = config.build_graph()?;
        let origin = graph
            .vertex_by_name(fire_origin)
            .ok_or_else(|| SimError::UnknownFireOrigin(fire_origin.to_string()))?;

        let mut rng = SimRng::new(seed);
        let mut vertices = vec![VertexState::default(); graph.vertex_count()];

        // Occupants are drawn in vertex-id order so the stream position is
        // independent of config map ordering.
        let mut total_initial = 0;
        for v in graph.vertex_ids() {
            let vertex = graph.vertex(v);
            if !vertex.kind.is_room() {
                continue;
            }
            let Some(occ) = config.occupancy_probabilities.get(graph.name(v)) else {
                continue;
            };
            let vs = &mut vertices[v.index()];
            vs.capable = rng
                .gen_range(occ.capable.min..=occ.capable.max.max(occ.capable.min))
                .min(vertex.capacity);
            let spare = vertex.capacity - vs.capable;
            vs.incapable = rng
                .gen_range(occ.incapable.min..=occ.incapable.max.max(occ.incapable.min))
                .min(spare);
            total_initial += vs.capable + vs.incapable;
        }

        // Ignite the origin.
        let origin_state = &mut vertices[origin.index()];
        origin_state.fire_intensity = fire::ORIGIN_INITIAL_INTENSITY;
        origin_state.smoke_m3 = config
            .fire_params
            .initial_smoke_level
            .min(graph.vertex(origin).volume());

        // Responders start distributed across the exits.
        let exits = evac_graph::find_exits(&graph);
        let responders = (0..num_responders)
            .map(|i| {
                Responder::new(
                    ResponderId(i),
                    exits[i as usize % exits.len()],
                    params.carry_capacity,
                    params.actions_per_tick,
                    graph.vertex_count(),
                )
            })
            .collect();

        let edge_exists = vec![true; graph.edge_count()];
        let edge_fire_dist =
            fire::edge_fire_distances(&graph, &vertices, origin, config.floor_height_m());

        Ok(Self {
            graph,
            clock: SimClock::default(),
            rng,
            fire_origin: origin,
            floor_height_m: config.floor_height_m(),
            vertices,
            edge_exists,
            edge_fire_dist,
            responders,
            rescued: 0,
            dead: 0,
            total_initial,
            last_rescue_tick: None,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &BuildingGraph {
        &self.graph
    }

    pub fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Execute one simulation tick.
    ///
    /// Order within the tick: responder actions (ascending id), instructed
    /// egress, stochastic edge burn-out, fire propagation and burndown, smoke
    /// diffusion and casualties, tick increment.
    pub fn update(&mut self, actions: &ActionMap) -> TickResult {
        let tick = self.clock.current_tick;
        let tick_secs = self.clock.tick_duration_secs;
        let mut result = TickResult::new(tick);

        // Shared per-tick edge flow budget: responders first, then occupants.
        let mut edge_flow = vec![0u32; self.graph.edge_count()];

        // ── ① Responder actions ───────────────────────────────────────────
        for (&rid, list) in actions {
            if rid.index() >= self.responders.len() {
                continue;
            }
            let budget = self.responders[rid.index()].actions_per_tick as usize;
            let mut records = Vec::with_capacity(list.len().min(budget));
            for action in list.iter().take(budget) {
                let outcome = self.execute_action(rid, action, &mut edge_flow, tick);
                if let ActionOutcome::DroppedOff(n) = outcome {
                    result.rescued_this_tick += n;
                }
                records.push(ActionRecord {
                    action: action.clone(),
                    outcome,
                });
            }
            result.action_results.insert(rid, records);
        }

        // ── ② Instructed egress ───────────────────────────────────────────
        self.move_instructed(&mut edge_flow, &mut result, tick);

        // ── ③ Stochastic edge burn-out ────────────────────────────────────
        let elapsed = self.clock.elapsed_secs();
        for e in self.graph.edge_ids() {
            if !self.edge_exists[e.index()] {
                continue;
            }
            let edge = self.graph.edge(e);
            let p = fire::edge_burn_probability(
                edge.base_burn_rate,
                edge.width_m,
                self.edge_fire_dist[e.index()],
                elapsed,
                tick_secs,
            );
            if self.rng.gen_bool(p) {
                self.edge_exists[e.index()] = false;
                result.events.push(SimEvent::EdgeBurned { edge: e });
            }
        }

        // ── ④ Fire propagation and burndown ───────────────────────────────
        let burned = fire::propagate(
            &self.graph,
            &mut self.vertices,
            &self.edge_exists,
            self.floor_height_m,
            tick_secs,
        );
        for (vertex, deaths) in burned {
            self.dead += deaths;
            result.dead_this_tick += deaths;
            result.events.push(SimEvent::RoomBurned { vertex, deaths });
        }

        // ── ⑤ Smoke diffusion and casualties ──────────────────────────────
        smoke::diffuse(&self.graph, &mut self.vertices, &self.edge_exists, tick_secs);
        self.apply_smoke_deaths(&mut result, tick_secs);

        // Fire distances feed next tick's burn rolls.
        self.edge_fire_dist = fire::edge_fire_distances(
            &self.graph,
            &self.vertices,
            self.fire_origin,
            self.floor_height_m,
        );

        // ── ⑥ Advance ─────────────────────────────────────────────────────
        self.clock.advance();
        result
    }

    // ── Action execution ──────────────────────────────────────────────────

    fn execute_action(
        &mut self,
        rid: ResponderId,
        action: &Action,
        edge_flow: &mut [u32],
        tick: Tick,
    ) -> ActionOutcome {
        use ActionOutcome::*;
        use RejectReason::*;

        let pos = self.responders[rid.index()].position;

        match *action {
            Action::Move { target } => {
                if target.index() >= self.graph.vertex_count() {
                    return Rejected(UnknownTarget);
                }
                let Some(&(_, edge)) = self
                    .graph
                    .neighbors(pos)
                    .iter()
                    .find(|&&(n, _)| n == target)
                else {
                    return Rejected(NotAdjacent);
                };
                if !self.edge_exists[edge.index()] {
                    return Rejected(EdgeMissing);
                }
                if edge_flow[edge.index()] >= self.graph.edge(edge).max_flow {
                    return Rejected(FlowExhausted);
                }
                edge_flow[edge.index()] += 1;
                let responder = &mut self.responders[rid.index()];
                responder.position = target;
                responder.mark_visited(target);
                Moved
            }

            Action::PickUp { count } => {
                if count == 0 {
                    return Rejected(ZeroCount);
                }
                let responder = &self.responders[rid.index()];
                if self.vertices[pos.index()].incapable < count {
                    return Rejected(TooFewIncapable);
                }
                if responder.carrying + count > responder.capacity {
                    return Rejected(OverCapacity);
                }
                self.vertices[pos.index()].incapable -= count;
                self.responders[rid.index()].carrying += count;
                PickedUp(count)
            }

            Action::DropOff => {
                let carrying = self.responders[rid.index()].carrying;
                if carrying == 0 {
                    return Rejected(NothingCarried);
                }
                if !self.graph.vertex(pos).kind.is_exit() {
                    return Rejected(NotAnExit);
                }
                self.responders[rid.index()].carrying = 0;
                self.rescued += carrying;
                self.last_rescue_tick = Some(tick);
                DroppedOff(carrying)
            }

            Action::Instruct => {
                if self.vertices[pos.index()].capable == 0 {
                    return Rejected(NoCapablePresent);
                }
                let Some(exit) = nearest_exit(&self.graph, &self.edge_exists, pos) else {
                    return Rejected(NoExitReachable);
                };
                let vs = &mut self.vertices[pos.index()];
                let count = vs.capable;
                vs.capable = 0;
                vs.instructed += count;
                vs.instructed_exit = Some(exit);
                Instructed(count)
            }
        }
    }

    // ── Instructed egress ─────────────────────────────────────────────────

    /// Advance instructed occupants one hop toward their exits.
    ///
    /// Vertices are snapshotted first so nobody moves twice in one tick.
    /// Edge flow is shared with responder movement; destination capacity
    /// bounds arrivals.
    fn move_instructed(&mut self, edge_flow: &mut [u32], result: &mut TickResult, tick: Tick) {
        let pending: Vec<(VertexId, u32)> = self
            .graph
            .vertex_ids()
            .filter(|&v| self.vertices[v.index()].instructed > 0)
            .map(|v| (v, self.vertices[v.index()].instructed))
            .collect();

        for (v, count) in pending {
            // Anyone standing on an exit is safe.
            if self.graph.vertex(v).kind.is_exit() {
                self.vertices[v.index()].instructed -= count;
                self.rescued += count;
                self.last_rescue_tick = Some(tick);
                result.rescued_this_tick += count;
                result
                    .events
                    .push(SimEvent::InstructedRescued { vertex: v, count });
                continue;
            }

            // Re-target if the stored exit is gone; people head for whatever
            // exit is nearest through the surviving graph.
            let target = self.vertices[v.index()].instructed_exit.filter(|&exit| {
                bfs_path(&self.graph, &self.edge_exists, v, exit).is_some()
            });
            let target = match target.or_else(|| nearest_exit(&self.graph, &self.edge_exists, v)) {
                Some(t) => t,
                None => {
                    result
                        .events
                        .push(SimEvent::InstructedTrapped { vertex: v, count });
                    continue;
                }
            };
            self.vertices[v.index()].instructed_exit = Some(target);

            let Some(path) = bfs_path(&self.graph, &self.edge_exists, v, target) else {
                result
                    .events
                    .push(SimEvent::InstructedTrapped { vertex: v, count });
                continue;
            };
            let next = path[1];
            let Some(&(_, edge)) = self
                .graph
                .neighbors(v)
                .iter()
                .find(|&&(n, _)| n == next)
            else {
                continue;
            };

            let flow_left = self
                .graph
                .edge(edge)
                .max_flow
                .saturating_sub(edge_flow[edge.index()]);
            let spare = self
                .graph
                .vertex(next)
                .capacity
                .saturating_sub(self.vertices[next.index()].occupants());
            let movers = count.min(flow_left).min(spare);
            if movers == 0 {
                continue;
            }

            self.vertices[v.index()].instructed -= movers;
            self.vertices[next.index()].instructed += movers;
            self.vertices[next.index()].instructed_exit = Some(target);
            edge_flow[edge.index()] += movers;
            result.events.push(SimEvent::InstructedMoved {
                from: v,
                to: next,
                count: movers,
            });
        }
    }

    // ── Smoke casualties ──────────────────────────────────────────────────

    fn apply_smoke_deaths(&mut self, result: &mut TickResult, tick_secs: f64) {
        for v in self.graph.vertex_ids() {
            let volume = self.graph.vertex(v).volume();
            let vs = &mut self.vertices[v.index()];
            if vs.burned || vs.occupants() == 0 {
                continue;
            }
            let p = smoke::death_probability(vs.smoke_level(volume)) * tick_secs;
            if p <= 0.0 {
                continue;
            }

            let mut deaths = 0;
            for _ in 0..vs.capable {
                if self.rng.gen_bool(p) {
                    deaths += 1;
                }
            }
            vs.capable -= deaths;
            let mut class_deaths = 0;
            for _ in 0..vs.incapable {
                if self.rng.gen_bool(p) {
                    class_deaths += 1;
                }
            }
            vs.incapable -= class_deaths;
            deaths += class_deaths;
            class_deaths = 0;
            for _ in 0..vs.instructed {
                if self.rng.gen_bool(p) {
                    class_deaths += 1;
                }
            }
            vs.instructed -= class_deaths;
            deaths += class_deaths;

            if deaths > 0 {
                self.dead += deaths;
                result.dead_this_tick += deaths;
                result
                    .events
                    .push(SimEvent::SmokeDeaths { vertex: v, deaths });
            }
        }
    }

    // ── Observation ───────────────────────────────────────────────────────

    /// Build the fog-of-war snapshot planners decide against.
    pub fn read(&self) -> Snapshot<'_> {
        let responders: BTreeMap<ResponderId, ResponderView> = self
            .responders
            .iter()
            .map(|r| {
                (
                    r.id,
                    ResponderView {
                        position: r.position,
                        carrying: r.carrying,
                        capacity: r.capacity,
                        actions_per_tick: r.actions_per_tick,
                        visited: r.visited.clone(),
                    },
                )
            })
            .collect();

        // Discovered occupants: union of visited vertices, exits excluded.
        let mut discovered = BTreeMap::new();
        for v in self.graph.vertex_ids() {
            if self.graph.vertex(v).kind.is_exit() {
                continue;
            }
            if !self.responders.iter().any(|r| r.visited[v.index()]) {
                continue;
            }
            let vs = &self.vertices[v.index()];
            discovered.insert(
                v,
                OccupantCounts {
                    capable: vs.capable,
                    incapable: vs.incapable,
                    instructed: vs.instructed,
                },
            );
        }

        Snapshot {
            tick: self.clock.current_tick,
            graph: &self.graph,
            edge_exists: self.edge_exists.clone(),
            burned: self.vertices.iter().map(|vs| vs.burned).collect(),
            smoke_level: self
                .graph
                .vertex_ids()
                .map(|v| self.vertices[v.index()].smoke_level(self.graph.vertex(v).volume()))
                .collect(),
            responders,
            discovered,
            fire_origin: self.fire_origin,
        }
    }

    /// Cumulative run statistics.
    pub fn stats(&self) -> Stats {
        let in_building: u32 = self.vertices.iter().map(VertexState::occupants).sum();
        let carried: u32 = self.responders.iter().map(|r| r.carrying).sum();
        Stats {
            tick: self.clock.current_tick,
            rescued: self.rescued,
            dead: self.dead,
            remaining: in_building + carried,
            total_initial: self.total_initial,
            time_minutes: self.clock.elapsed_minutes(),
            last_rescue_tick: self.last_rescue_tick,
        }
    }
}
