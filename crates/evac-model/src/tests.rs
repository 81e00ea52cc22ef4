//! Integration tests for the two-phase model: the seed scenarios.
//!
//! Configs avoid floor-plan positions unless a test wants stochastic edge
//! burn-out, because positionless edges never burn and the run is then
//! deterministic whatever the seed.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeMap;

    use evac_core::VertexKind;
    use evac_graph::config::{
        BuildingConfig, EdgeConfig, FireParams, OccupancyConfig, OccupancyRange, VertexConfig,
        VisualPosition,
    };

    pub fn vertex(id: &str, kind: VertexKind) -> VertexConfig {
        VertexConfig {
            id: id.to_string(),
            kind,
            floor: 1,
            capacity: 100,
            priority: 1,
            sweep_time: 2,
            area_m2: 20.0,
            ceiling_height_m: 3.0,
            visual_position: None,
            room_type: None,
            staircase_group: None,
        }
    }

    pub fn positioned(id: &str, kind: VertexKind, x: f64, y: f64) -> VertexConfig {
        let mut v = vertex(id, kind);
        v.visual_position = Some(VisualPosition { x, y });
        v
    }

    pub fn edge(id: &str, a: &str, b: &str) -> EdgeConfig {
        EdgeConfig {
            id: id.to_string(),
            vertex_a: a.to_string(),
            vertex_b: b.to_string(),
            max_flow: 5,
            width_m: 2.0,
            base_burn_rate: 0.0001,
            unit_length: 1.0,
            kind: None,
        }
    }

    pub fn occ(capable: u32, incapable: u32) -> OccupancyConfig {
        OccupancyConfig {
            capable: OccupancyRange {
                min: capable,
                max: capable,
            },
            incapable: OccupancyRange {
                min: incapable,
                max: incapable,
            },
        }
    }

    pub fn occupancy(entries: &[(&str, OccupancyConfig)]) -> BTreeMap<String, OccupancyConfig> {
        entries
            .iter()
            .map(|(id, occ)| (id.to_string(), *occ))
            .collect()
    }

    pub fn fire(origin: &str) -> FireParams {
        FireParams {
            origin_vertex_id: origin.to_string(),
            initial_smoke_level: 0.0,
        }
    }
}

#[cfg(test)]
mod scenarios {
    use evac_core::VertexKind;
    use evac_graph::config::BuildingConfig;
    use evac_sim::Simulation;

    use super::helpers::{edge, fire, occ, occupancy, positioned, vertex};
    use crate::{ModelConfig, Phase, RescueModel};

    /// Drive the loop until everyone is accounted for or the tick cap hits.
    /// Returns the number of updates performed.
    fn run(sim: &mut Simulation, model: &mut RescueModel, max_ticks: u64) -> u64 {
        for tick in 0..max_ticks {
            if sim.stats().remaining == 0 {
                return tick;
            }
            let actions = {
                let snap = sim.read();
                model.decide(&snap)
            };
            sim.update(&actions);
        }
        max_ticks
    }

    // ── S1: trivial success ───────────────────────────────────────────────

    #[test]
    fn s1_single_room_rescued_within_three_ticks() {
        let config = BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("room_1", VertexKind::Room),
            ],
            edges: vec![edge("e0", "exit_0", "room_1")],
            occupancy_probabilities: occupancy(&[("room_1", occ(1, 1))]),
            fire_params: fire("room_1"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 1, "room_1", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        let ticks = run(&mut sim, &mut model, 10);
        let stats = sim.stats();
        assert_eq!(stats.rescued, 2);
        assert_eq!(stats.dead, 0);
        assert!(ticks <= 3, "took {ticks} ticks");
    }

    // ── S2: one responder, K = 3, corridor of three singles ───────────────

    #[test]
    fn s2_corridor_of_three_all_survive() {
        let config = BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("room_1", VertexKind::Room),
                vertex("room_2", VertexKind::Room),
                vertex("room_3", VertexKind::Room),
            ],
            edges: vec![
                edge("e0", "exit_0", "room_1"),
                edge("e1", "room_1", "room_2"),
                edge("e2", "room_2", "room_3"),
            ],
            occupancy_probabilities: occupancy(&[
                ("room_1", occ(0, 1)),
                ("room_2", occ(0, 1)),
                ("room_3", occ(0, 1)),
            ]),
            fire_params: fire("room_3"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 1, "room_3", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        run(&mut sim, &mut model, 300);
        let stats = sim.stats();
        assert_eq!(stats.rescued, 3, "all three incapable must survive");
        assert_eq!(stats.remaining, 0);
        assert_eq!(model.phase(), Phase::Rescue);
    }

    // ── S3: fire isolates a room ──────────────────────────────────────────

    #[test]
    fn s3_burned_edge_triggers_replan_without_early_deaths() {
        // room_b sits behind an edge whose burn probability clamps to 1 on
        // the very first roll, cutting it off before anyone can get there.
        let mut hot = edge("e1", "room_a", "room_b");
        hot.base_burn_rate = 2.0;
        let config = BuildingConfig {
            vertices: vec![
                positioned("exit_0", VertexKind::Exit, 0.0, 0.0),
                positioned("room_a", VertexKind::Room, 1.0, 0.0),
                positioned("room_b", VertexKind::Room, 1.0, 0.05),
            ],
            edges: vec![edge("e0", "exit_0", "room_a"), hot],
            occupancy_probabilities: occupancy(&[
                ("room_a", occ(0, 1)),
                ("room_b", occ(0, 1)),
            ]),
            fire_params: fire("room_b"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 1, "room_b", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        // Tick 0 burns e1 (edge e0 keeps probability ≈ 0 via its tiny base
        // rate at distance ~1).  Run a while and observe.
        for _ in 0..60 {
            let actions = {
                let snap = sim.read();
                model.decide(&snap)
            };
            sim.update(&actions);
        }

        let snap = sim.read();
        assert!(!snap.edge_exists(evac_core::EdgeId(1)), "hot edge must burn");
        assert!(model.replan_count() >= 1);
        // room_a's occupant is rescuable; room_b's is stranded but must not
        // be counted dead until fire or smoke actually kills them.
        let stats = sim.stats();
        assert!(stats.rescued >= 1, "reachable occupant must be rescued");
        assert_eq!(
            stats.rescued + stats.remaining,
            stats.total_initial - stats.dead
        );
        if stats.dead > 0 {
            // Only the burned/smoked room may account for deaths.
            let room_b = sim.graph().vertex_by_name("room_b").unwrap();
            assert!(
                snap.burned[room_b.index()] || snap.smoke_level[room_b.index()] >= 0.3,
                "deaths without a killing hazard in the stranded room"
            );
        }
    }

    // ── S4: capable-only evacuation ───────────────────────────────────────

    #[test]
    fn s4_capable_only_run_completes_with_zero_items() {
        let config = BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("hall_0", VertexKind::Hallway),
                vertex("room_1", VertexKind::Room),
                vertex("room_2", VertexKind::Room),
            ],
            edges: vec![
                edge("e0", "exit_0", "hall_0"),
                edge("e1", "hall_0", "room_1"),
                edge("e2", "hall_0", "room_2"),
            ],
            occupancy_probabilities: occupancy(&[
                ("room_1", occ(3, 0)),
                ("room_2", occ(2, 0)),
            ]),
            fire_params: fire("room_1"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 2, "room_1", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        run(&mut sim, &mut model, 200);
        let stats = sim.stats();
        assert_eq!(stats.rescued, stats.total_initial);
        assert_eq!(stats.dead, 0);
        // The optimizer ran on an empty supply: phase switched, nothing queued.
        assert_eq!(model.phase(), Phase::Rescue);
        assert!(model.idle());
    }

    // ── S5: stall detection ───────────────────────────────────────────────

    #[test]
    fn s5_unreachable_room_forces_phase_transition_within_window() {
        let config = BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("room_1", VertexKind::Room),
                vertex("island", VertexKind::Room),
            ],
            edges: vec![edge("e0", "exit_0", "room_1")],
            occupancy_probabilities: occupancy(&[("room_1", occ(1, 0))]),
            fire_params: fire("room_1"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 1, "room_1", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        let mut transition_tick = None;
        for tick in 0..60 {
            let actions = {
                let snap = sim.read();
                model.decide(&snap)
            };
            if model.phase() == Phase::Rescue && transition_tick.is_none() {
                transition_tick = Some(tick);
            }
            sim.update(&actions);
        }

        let transition_tick = transition_tick.expect("phase must transition despite the island");
        assert!(
            transition_tick <= 30,
            "stall window must force the transition, got tick {transition_tick}"
        );
        // The island was never planned against; the run settles idle.
        assert!(model.idle());
    }

    // ── Phase monotonicity ────────────────────────────────────────────────

    #[test]
    fn phase_never_reverts_to_sweep() {
        let config = BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("room_1", VertexKind::Room),
            ],
            edges: vec![edge("e0", "exit_0", "room_1")],
            occupancy_probabilities: occupancy(&[("room_1", occ(1, 1))]),
            fire_params: fire("room_1"),
            building_params: None,
        };
        let mut sim = Simulation::new(&config, 1, "room_1", 42).unwrap();
        let mut model = RescueModel::new(ModelConfig::default());

        let mut seen_rescue = false;
        for _ in 0..50 {
            let actions = {
                let snap = sim.read();
                model.decide(&snap)
            };
            if model.phase() == Phase::Rescue {
                seen_rescue = true;
            }
            assert!(
                !(seen_rescue && model.phase() == Phase::Sweep),
                "phase reverted"
            );
            sim.update(&actions);
        }
        assert!(seen_rescue);
    }
}
