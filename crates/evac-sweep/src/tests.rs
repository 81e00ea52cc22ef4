//! Unit tests for evac-sweep.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeMap;

    use evac_core::VertexKind;
    use evac_graph::config::{
        BuildingConfig, EdgeConfig, FireParams, OccupancyConfig, OccupancyRange, VertexConfig,
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

    /// Star of four rooms around a hallway, one exit:
    ///
    ///   exit ─ hall ─ {r1, r2, r3, r4}
    pub fn star_config(occupancy: BTreeMap<String, OccupancyConfig>) -> BuildingConfig {
        BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("hall_0", VertexKind::Hallway),
                vertex("room_1", VertexKind::Room),
                vertex("room_2", VertexKind::Room),
                vertex("room_3", VertexKind::Room),
                vertex("room_4", VertexKind::Room),
            ],
            edges: vec![
                edge("e0", "exit_0", "hall_0"),
                edge("e1", "hall_0", "room_1"),
                edge("e2", "hall_0", "room_2"),
                edge("e3", "hall_0", "room_3"),
                edge("e4", "hall_0", "room_4"),
            ],
            occupancy_probabilities: occupancy,
            fire_params: FireParams {
                origin_vertex_id: "room_1".to_string(),
                initial_smoke_level: 0.0,
            },
            building_params: None,
        }
    }
}

#[cfg(test)]
mod clustering {
    use evac_core::SimRng;
    use evac_sim::Simulation;

    use super::helpers::star_config;
    use crate::cluster::{k_medoids, HopMatrix};

    #[test]
    fn hop_matrix_measures_corridor_distance() {
        let sim = Simulation::new(&star_config(Default::default()), 1, "room_1", 42).unwrap();
        let g = sim.graph();
        let r1 = g.vertex_by_name("room_1").unwrap();
        let r2 = g.vertex_by_name("room_2").unwrap();
        let exists = vec![true; g.edge_count()];
        let m = HopMatrix::build(g, &exists, &[r1]);
        assert_eq!(m.hops(r1, r1), Some(0));
        assert_eq!(m.hops(r1, r2), Some(2)); // via the hallway
        assert_eq!(m.hops(r2, r1), None); // r2 is not a source
    }

    #[test]
    fn every_reachable_room_lands_in_exactly_one_cluster() {
        let sim = Simulation::new(&star_config(Default::default()), 2, "room_1", 42).unwrap();
        let g = sim.graph();
        let rooms = g.rooms();
        let exit = g.vertex_by_name("exit_0").unwrap();
        let exists = vec![true; g.edge_count()];
        let mut rng = SimRng::new(7);

        let clusters = k_medoids(g, &exists, &rooms, &[exit, exit], &mut rng);
        assert_eq!(clusters.len(), 2);
        let total: usize = clusters.iter().map(Vec::len).sum();
        assert_eq!(total, rooms.len(), "no room may be dropped or duplicated");
        for room in &rooms {
            let owners = clusters.iter().filter(|c| c.contains(room)).count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn cluster_sizes_respect_balance_bounds() {
        let sim = Simulation::new(&star_config(Default::default()), 2, "room_1", 42).unwrap();
        let g = sim.graph();
        let rooms = g.rooms(); // 4 rooms, 2 clusters → each within 1..=3
        let exit = g.vertex_by_name("exit_0").unwrap();
        let exists = vec![true; g.edge_count()];
        let mut rng = SimRng::new(7);

        let clusters = k_medoids(g, &exists, &rooms, &[exit, exit], &mut rng);
        let hi = rooms.len().div_ceil(2) + 1;
        for c in &clusters {
            assert!(c.len() <= hi, "cluster of {} exceeds bound {hi}", c.len());
        }
    }

    #[test]
    fn unreachable_rooms_are_excluded() {
        let sim = Simulation::new(&star_config(Default::default()), 1, "room_1", 42).unwrap();
        let g = sim.graph();
        let rooms = g.rooms();
        let exit = g.vertex_by_name("exit_0").unwrap();
        // Clear the hallway spoke to room_4 (edge e4, id 4).
        let mut exists = vec![true; g.edge_count()];
        exists[4] = false;
        let mut rng = SimRng::new(7);

        let clusters = k_medoids(g, &exists, &rooms, &[exit], &mut rng);
        let r4 = g.vertex_by_name("room_4").unwrap();
        assert!(!clusters[0].contains(&r4));
        assert_eq!(clusters[0].len(), rooms.len() - 1);
    }
}

#[cfg(test)]
mod tours {
    use std::collections::BTreeMap;

    use evac_core::VertexId;
    use evac_sim::Simulation;

    use super::helpers::star_config;
    use crate::cluster::HopMatrix;
    use crate::tour::{dfs_preorder, prim_mst};

    #[test]
    fn mst_spans_the_cluster() {
        let sim = Simulation::new(&star_config(Default::default()), 1, "room_1", 42).unwrap();
        let g = sim.graph();
        let exit = g.vertex_by_name("exit_0").unwrap();
        let mut nodes = g.rooms();
        nodes.push(exit);
        let exists = vec![true; g.edge_count()];
        let hops = HopMatrix::build(g, &exists, &nodes);

        let mst = prim_mst(&nodes, exit, &hops);
        assert_eq!(mst.len(), nodes.len(), "MST must span every node");
        let edge_count: usize = mst.values().map(Vec::len).sum::<usize>() / 2;
        assert_eq!(edge_count, nodes.len() - 1);
    }

    #[test]
    fn preorder_visits_each_node_once() {
        let sim = Simulation::new(&star_config(Default::default()), 1, "room_1", 42).unwrap();
        let g = sim.graph();
        let exit = g.vertex_by_name("exit_0").unwrap();
        let mut nodes = g.rooms();
        nodes.push(exit);
        let exists = vec![true; g.edge_count()];
        let hops = HopMatrix::build(g, &exists, &nodes);

        let mst = prim_mst(&nodes, exit, &hops);
        let order = dfs_preorder(&mst, exit);
        assert_eq!(order[0], exit);
        assert_eq!(order.len(), nodes.len());
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), nodes.len());
    }

    #[test]
    fn empty_cluster_gives_empty_structures() {
        let nodes: Vec<VertexId> = Vec::new();
        let mst = prim_mst(&nodes, VertexId(0), &HopMatrix::build_empty());
        assert!(mst.is_empty());
        let order = dfs_preorder(&BTreeMap::new(), VertexId(0));
        assert_eq!(order, vec![VertexId(0)]);
    }
}

#[cfg(test)]
mod dispatch {
    use std::collections::BTreeMap;

    use evac_sim::Simulation;

    use super::helpers::{occ, star_config};
    use crate::SweepCoordinator;

    fn run_sweep(sim: &mut Simulation, sweep: &mut SweepCoordinator, max_ticks: u32) -> u32 {
        for tick in 0..max_ticks {
            let snap = sim.read();
            if sweep.is_complete(&snap) {
                return tick;
            }
            let actions = sweep.actions(&snap);
            sim.update(&actions);
        }
        max_ticks
    }

    #[test]
    fn sweep_visits_every_room() {
        let mut occupancy = BTreeMap::new();
        occupancy.insert("room_2".to_string(), occ(2, 0));
        let mut sim = Simulation::new(&star_config(occupancy), 1, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        run_sweep(&mut sim, &mut sweep, 200);

        let snap = sim.read();
        assert_eq!(
            snap.visited_rooms().len(),
            sim.graph().rooms().len(),
            "all four rooms must be visited"
        );
    }

    #[test]
    fn sweep_instructs_capable_occupants() {
        let mut occupancy = BTreeMap::new();
        occupancy.insert("room_2".to_string(), occ(3, 0));
        occupancy.insert("room_3".to_string(), occ(1, 0));
        let mut sim = Simulation::new(&star_config(occupancy), 1, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        run_sweep(&mut sim, &mut sweep, 200);

        // All capable were instructed and self-evacuated through the exit.
        assert_eq!(sim.stats().rescued, 4);
        assert_eq!(sim.stats().remaining, 0);
    }

    #[test]
    fn sweep_delivers_opportunistic_pickups() {
        let mut occupancy = BTreeMap::new();
        occupancy.insert("room_2".to_string(), occ(0, 2));
        let mut sim = Simulation::new(&star_config(occupancy), 1, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        run_sweep(&mut sim, &mut sweep, 300);

        assert_eq!(sim.stats().rescued, 2, "picked-up occupants reach an exit");
    }

    #[test]
    fn moves_always_target_existing_edges() {
        let mut occupancy = BTreeMap::new();
        occupancy.insert("room_1".to_string(), occ(1, 1));
        let mut sim = Simulation::new(&star_config(occupancy), 2, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        for _ in 0..100 {
            let snap = sim.read();
            if sweep.is_complete(&snap) {
                break;
            }
            let actions = sweep.actions(&snap);
            // Every emitted move must cross an edge that existed in the
            // snapshot the decision was made against.
            for (rid, list) in &actions {
                let mut pos = snap.responders[rid].position;
                for action in list {
                    if let evac_sim::Action::Move { target } = action {
                        let ok = snap.graph.neighbors(pos).iter().any(|&(n, e)| {
                            n == *target && snap.edge_exists(e)
                        });
                        assert!(ok, "move across a missing or non-adjacent edge");
                        pos = *target;
                    }
                }
            }
            sim.update(&actions);
        }
    }
}

#[cfg(test)]
mod completion {
    use std::collections::BTreeMap;

    use evac_core::VertexKind;
    use evac_graph::config::{BuildingConfig, FireParams};
    use evac_sim::Simulation;

    use super::helpers::{edge, occ, vertex};
    use crate::SweepCoordinator;

    /// A room no corridor reaches: exit ─ room_1, plus island room_2.
    fn island_config() -> BuildingConfig {
        BuildingConfig {
            vertices: vec![
                vertex("exit_0", VertexKind::Exit),
                vertex("room_1", VertexKind::Room),
                vertex("room_2", VertexKind::Room),
            ],
            edges: vec![edge("e0", "exit_0", "room_1")],
            occupancy_probabilities: {
                let mut m = BTreeMap::new();
                m.insert("room_1".to_string(), occ(0, 1));
                m
            },
            fire_params: FireParams {
                origin_vertex_id: "room_1".to_string(),
                initial_smoke_level: 0.0,
            },
            building_params: None,
        }
    }

    #[test]
    fn unreachable_room_triggers_stall_completion() {
        let mut sim = Simulation::new(&island_config(), 1, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        let mut completed_at = None;
        for tick in 0..60 {
            let snap = sim.read();
            if sweep.is_complete(&snap) {
                completed_at = Some(tick);
                break;
            }
            let actions = sweep.actions(&snap);
            sim.update(&actions);
        }

        let completed_at = completed_at.expect("sweep must complete despite the island room");
        assert!(
            completed_at <= 30,
            "stall detection should fire within the window, got {completed_at}"
        );
    }

    #[test]
    fn complete_when_everything_visited_and_instructed() {
        let mut occupancy = BTreeMap::new();
        occupancy.insert("room_1".to_string(), occ(1, 0));
        let config = super::helpers::star_config(occupancy);
        let mut sim = Simulation::new(&config, 2, "room_1", 42).unwrap();
        let mut sweep = SweepCoordinator::new(20, 1);

        let mut done = false;
        for _ in 0..200 {
            let snap = sim.read();
            if sweep.is_complete(&snap) {
                done = true;
                break;
            }
            let actions = sweep.actions(&snap);
            sim.update(&actions);
        }
        assert!(done, "sweep never completed");
    }
}
