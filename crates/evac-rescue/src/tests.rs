//! Unit tests for evac-rescue.
//!
//! Snapshots are hand-assembled: the optimizer only reads topology, edge
//! existence, and the fire origin, so tests construct exactly that.

#[cfg(test)]
mod helpers {
    use std::collections::BTreeMap;

    use evac_core::{VertexId, VertexKind};
    use evac_graph::{BuildingGraph, GraphBuilder, Vertex};
    use evac_sim::Snapshot;

    pub fn plain(kind: VertexKind) -> Vertex {
        Vertex {
            kind,
            floor: 1,
            position: None,
            area_m2: 20.0,
            ceiling_m: 3.0,
            capacity: 100,
            priority: 1,
            sweep_ticks: 2,
        }
    }

    /// exit ─ r1 ─ r2 ─ r3, unit-length corridor.
    pub fn corridor() -> (BuildingGraph, VertexId, [VertexId; 3]) {
        let mut b = GraphBuilder::new();
        let exit = b.add_vertex("exit_0", plain(VertexKind::Exit));
        let r1 = b.add_vertex("room_1", plain(VertexKind::Room));
        let r2 = b.add_vertex("room_2", plain(VertexKind::Room));
        let r3 = b.add_vertex("room_3", plain(VertexKind::Room));
        b.add_edge(exit, r1, 5, 2.0, 0.0001, 1.0);
        b.add_edge(r1, r2, 5, 2.0, 0.0001, 1.0);
        b.add_edge(r2, r3, 5, 2.0, 0.0001, 1.0);
        (b.build(), exit, [r1, r2, r3])
    }

    pub fn snapshot<'a>(graph: &'a BuildingGraph, fire_origin: VertexId) -> Snapshot<'a> {
        Snapshot {
            tick: evac_core::Tick(0),
            graph,
            edge_exists: vec![true; graph.edge_count()],
            burned: vec![false; graph.vertex_count()],
            smoke_level: vec![0.0; graph.vertex_count()],
            responders: BTreeMap::new(),
            discovered: BTreeMap::new(),
            fire_origin,
        }
    }

    pub fn supply_of(entries: &[(VertexId, u32)]) -> BTreeMap<VertexId, u32> {
        entries.iter().copied().collect()
    }
}

#[cfg(test)]
mod generation {
    use super::helpers::{corridor, snapshot, supply_of};
    use crate::RescueOptimizer;

    #[test]
    fn corridor_produces_exactly_one_three_room_item() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 1), (r2, 1), (r3, 1)]);

        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        let triples: Vec<_> = items
            .iter()
            .filter(|item| item.visit_sequence.len() == 3)
            .collect();
        assert_eq!(triples.len(), 1, "one allocation covers all three rooms");
        let triple = triples[0];
        assert_eq!(triple.people(), 3);
        // Walking deep while unloaded and picking up on the way back is
        // cheapest: entry leg 3 m, loaded legs (1 + 1 + 1) m doubled.
        assert_eq!(triple.visit_sequence, vec![r3, r2, r1]);
        assert!((triple.time - 9.0).abs() < 1e-9);
    }

    #[test]
    fn items_are_legal() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 2), (r2, 1), (r3, 1)]);

        let optimizer = RescueOptimizer::default();
        let items = optimizer.generate_items(&snap, &supply);
        assert!(!items.is_empty());

        for item in &items {
            assert!(item.people() <= optimizer.capacity);
            for (room, &count) in &item.vector {
                assert!(count >= 1);
                assert!(count <= supply[room]);
            }
            // The stitched path must start and end at the chosen exits and
            // cross only existing (adjacent) edges.
            assert_eq!(*item.full_path.first().unwrap(), item.entry_exit);
            assert_eq!(*item.full_path.last().unwrap(), item.drop_exit);
            for pair in item.full_path.windows(2) {
                let adjacent = snap
                    .graph
                    .neighbors(pair[0])
                    .iter()
                    .any(|&(n, e)| n == pair[1] && snap.edge_exists(e));
                assert!(adjacent, "path hop without an existing edge");
            }
        }
    }

    #[test]
    fn dominated_multi_room_items_are_pruned() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 1), (r2, 1), (r3, 1)]);

        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        // On a line every chained trip beats its sequential singles, so all
        // subsets survive: 3 singles + 3 pairs + 1 triple.
        assert_eq!(items.len(), 7);
        for item in &items {
            if item.visit_sequence.len() > 1 {
                // Pruning would have removed anything not strictly faster.
                let sequential: f64 = item
                    .visit_sequence
                    .iter()
                    .map(|&room| {
                        items
                            .iter()
                            .filter(|single| {
                                single.visit_sequence == vec![room]
                                    && single.vector[&room] == item.vector[&room]
                            })
                            .map(|single| single.time)
                            .fold(f64::INFINITY, f64::min)
                    })
                    .sum();
                assert!(item.time < sequential);
            }
        }
    }

    #[test]
    fn empty_supply_generates_nothing() {
        let (graph, _, [r1, ..]) = corridor();
        let snap = snapshot(&graph, r1);
        let items = RescueOptimizer::default().generate_items(&snap, &Default::default());
        assert!(items.is_empty());
    }

    #[test]
    fn unreachable_room_is_skipped() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let mut snap = snapshot(&graph, r1);
        snap.edge_exists[2] = false; // r2 ─ r3 burned
        let supply = supply_of(&[(r1, 1), (r3, 1)]);

        let items = RescueOptimizer::default().generate_items(&snap, &supply);
        assert!(!items.is_empty());
        assert!(
            items.iter().all(|item| !item.vector.contains_key(&r3)),
            "no item may promise a pickup in the cut-off room"
        );
        let _ = r2;
    }

    #[test]
    fn budget_overflow_degrades_to_singles() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 1), (r2, 1), (r3, 1)]);

        let optimizer = RescueOptimizer {
            eval_budget: 4,
            ..Default::default()
        };
        let items = optimizer.generate_items(&snap, &supply);
        assert!(!items.is_empty(), "degraded capacity must still rescue");
        assert!(
            items.iter().all(|item| item.visit_sequence.len() == 1),
            "capacity must shrink until generation fits the budget"
        );
    }
}

#[cfg(test)]
mod fire_priority {
    use evac_core::VertexKind;
    use evac_graph::GraphBuilder;

    use super::helpers::{plain, snapshot, supply_of};
    use crate::RescueOptimizer;

    #[test]
    fn near_fire_room_outranks_equidistant_far_room() {
        // fire ─ near ─ exit ─ far: equal hops from the exit, equal priority.
        let mut b = GraphBuilder::new();
        let fire = b.add_vertex("fire_room", plain(VertexKind::Room));
        let near = b.add_vertex("room_near", plain(VertexKind::Room));
        let exit = b.add_vertex("exit_0", plain(VertexKind::Exit));
        let far = b.add_vertex("room_far", plain(VertexKind::Room));
        b.add_edge(fire, near, 5, 2.0, 0.0001, 1.0);
        b.add_edge(near, exit, 5, 2.0, 0.0001, 1.0);
        b.add_edge(exit, far, 5, 2.0, 0.0001, 1.0);
        let graph = b.build();

        let snap = snapshot(&graph, fire);
        let supply = supply_of(&[(near, 1), (far, 1)]);

        let optimizer = RescueOptimizer {
            fire_weight: 1.0,
            ..Default::default()
        };
        let items = optimizer.generate_items(&snap, &supply);

        let value_of = |room| {
            items
                .iter()
                .filter(|item| item.visit_sequence == vec![room])
                .map(|item| item.value)
                .fold(f64::NEG_INFINITY, f64::max)
        };
        assert!(
            value_of(near) > value_of(far),
            "fire weighting must rank the near-fire room first"
        );
    }

    #[test]
    fn zero_weight_treats_rooms_equally() {
        let mut b = GraphBuilder::new();
        let fire = b.add_vertex("fire_room", plain(VertexKind::Room));
        let near = b.add_vertex("room_near", plain(VertexKind::Room));
        let exit = b.add_vertex("exit_0", plain(VertexKind::Exit));
        let far = b.add_vertex("room_far", plain(VertexKind::Room));
        b.add_edge(fire, near, 5, 2.0, 0.0001, 1.0);
        b.add_edge(near, exit, 5, 2.0, 0.0001, 1.0);
        b.add_edge(exit, far, 5, 2.0, 0.0001, 1.0);
        let graph = b.build();

        let snap = snapshot(&graph, fire);
        let supply = supply_of(&[(near, 1), (far, 1)]);
        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        let value_of = |room| {
            items
                .iter()
                .filter(|item| item.visit_sequence == vec![room])
                .map(|item| item.value)
                .fold(f64::NEG_INFINITY, f64::max)
        };
        assert!((value_of(near) - value_of(far)).abs() < 1e-9);
    }
}

#[cfg(test)]
mod fire_priority_assignment {
    use evac_core::{ResponderId, VertexKind};
    use evac_graph::{BuildingGraph, GraphBuilder};

    use super::helpers::{plain, snapshot, supply_of};
    use crate::{AssignmentInput, GreedyAssigner, ItemAssigner, RescueOptimizer};

    /// fire ─ near ─ mid ─ exit ─ far.  Far is cheaper to serve, so with no
    /// fire weighting its item ranks first; a large weight flips the order.
    fn lopsided() -> BuildingGraph {
        let mut b = GraphBuilder::new();
        let fire = b.add_vertex("fire_room", plain(VertexKind::Room));
        let near = b.add_vertex("room_near", plain(VertexKind::Room));
        let mid = b.add_vertex("mid_hall", plain(VertexKind::Hallway));
        let exit = b.add_vertex("exit_0", plain(VertexKind::Exit));
        let far = b.add_vertex("room_far", plain(VertexKind::Room));
        b.add_edge(fire, near, 5, 2.0, 0.0001, 1.0);
        b.add_edge(near, mid, 5, 2.0, 0.0001, 1.0);
        b.add_edge(mid, exit, 5, 2.0, 0.0001, 1.0);
        b.add_edge(exit, far, 5, 2.0, 0.0001, 1.0);
        b.build()
    }

    fn first_assigned_room(weight: f64) -> evac_core::VertexId {
        let graph = lopsided();
        let fire = graph.vertex_by_name("fire_room").unwrap();
        let near = graph.vertex_by_name("room_near").unwrap();
        let far = graph.vertex_by_name("room_far").unwrap();

        let snap = snapshot(&graph, fire);
        let supply = supply_of(&[(near, 1), (far, 1)]);
        let optimizer = RescueOptimizer {
            fire_weight: weight,
            ..Default::default()
        };
        let items = optimizer.generate_items(&snap, &supply);

        let responders = [ResponderId(0)];
        let input = AssignmentInput {
            responders: &responders,
            supply: &supply,
        };
        let assignments = GreedyAssigner.assign(&items, &input);
        assignments[&ResponderId(0)][0].visit_sequence[0]
    }

    #[test]
    fn fire_weight_puts_near_fire_item_first_in_queue() {
        let graph = lopsided();
        let near = graph.vertex_by_name("room_near").unwrap();
        assert_eq!(first_assigned_room(20.0), near);
    }

    #[test]
    fn zero_weight_puts_cheaper_item_first_in_queue() {
        let graph = lopsided();
        let far = graph.vertex_by_name("room_far").unwrap();
        assert_eq!(first_assigned_room(0.0), far);
    }
}

#[cfg(test)]
mod assignment {
    use evac_core::ResponderId;

    use super::helpers::{corridor, snapshot, supply_of};
    use crate::{AssignmentInput, GreedyAssigner, ItemAssigner, LpAssigner, RescueOptimizer};

    #[test]
    fn greedy_respects_supply_disjointness() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 2), (r2, 1), (r3, 1)]);
        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        let responders = [ResponderId(0), ResponderId(1)];
        let input = AssignmentInput {
            responders: &responders,
            supply: &supply,
        };
        let assignments = GreedyAssigner.assign(&items, &input);

        let mut taken = std::collections::BTreeMap::new();
        for items in assignments.values() {
            for item in items {
                for (room, count) in &item.vector {
                    *taken.entry(*room).or_insert(0u32) += count;
                }
            }
        }
        for (room, count) in &taken {
            assert!(count <= &supply[room], "room {room} over-assigned");
        }
        // Everything should be coverable here.
        let total: u32 = assignments
            .values()
            .flatten()
            .map(|item| item.people())
            .sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn greedy_prefers_less_loaded_responder() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 1), (r2, 1), (r3, 1)]);
        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        let responders = [ResponderId(0), ResponderId(1)];
        let input = AssignmentInput {
            responders: &responders,
            supply: &supply,
        };
        let assignments = GreedyAssigner.assign(&items, &input);

        // With two items selected, both responders get work.
        let busy = assignments.values().filter(|v| !v.is_empty()).count();
        assert!(busy >= 2 || assignments.values().map(Vec::len).sum::<usize>() < 2);
    }

    #[test]
    fn lp_assignment_is_disjoint_and_nonempty() {
        let (graph, _, [r1, r2, r3]) = corridor();
        let snap = snapshot(&graph, r3);
        let supply = supply_of(&[(r1, 1), (r2, 1), (r3, 1)]);
        let items = RescueOptimizer::default().generate_items(&snap, &supply);

        let responders = [ResponderId(0)];
        let input = AssignmentInput {
            responders: &responders,
            supply: &supply,
        };
        let assignments = LpAssigner.assign(&items, &input);

        let mut taken = std::collections::BTreeMap::new();
        let mut people = 0;
        for items in assignments.values() {
            for item in items {
                people += item.people();
                for (room, count) in &item.vector {
                    *taken.entry(*room).or_insert(0u32) += count;
                }
            }
        }
        assert!(people >= 3, "LP rounding should cover the whole supply here");
        for (room, count) in &taken {
            assert!(count <= &supply[room]);
        }
    }

    #[test]
    fn no_responders_means_no_assignments() {
        let (graph, _, [r1, ..]) = corridor();
        let snap = snapshot(&graph, r1);
        let supply = supply_of(&[(r1, 1)]);
        let items = RescueOptimizer::default().generate_items(&snap, &supply);
        let input = AssignmentInput {
            responders: &[],
            supply: &supply,
        };
        assert!(GreedyAssigner.assign(&items, &input).is_empty());
    }
}
