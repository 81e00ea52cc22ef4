//! Item generation: subset × allocation enumeration, best-permutation path
//! optimization, and streaming domination pruning.

use std::collections::BTreeMap;

use evac_core::VertexId;
use evac_graph::{dijkstra_from, find_exits, DistanceMatrix, ShortestPaths};
use evac_sim::Snapshot;

use crate::error::{RescueError, RescueResult};
use crate::item::RescueItem;

/// Floor on item time when computing value density.
const MIN_TIME: f64 = 0.1;

/// Generates candidate rescue items from a snapshot.
///
/// Stateless between calls: distances are recomputed against the snapshot's
/// edge existence every time, so items are always valid for the graph they
/// were generated on.
pub struct RescueOptimizer {
    /// Carry capacity K used for subset and allocation bounds.
    pub capacity: u32,
    /// Fire-proximity boost weight `w_f ≥ 0`; 0 disables the Dijkstra from
    /// the fire origin.
    pub fire_weight: f64,
    /// Under-capacity penalty `α ∈ [0, 1]` applied to items carrying fewer
    /// than K people.
    pub under_capacity_penalty: f64,
    /// Cap on (permutation × exit pair) evaluations per generation run.
    pub eval_budget: usize,
}

impl Default for RescueOptimizer {
    fn default() -> Self {
        Self {
            capacity: 3,
            fire_weight: 0.0,
            under_capacity_penalty: 0.0,
            eval_budget: 200_000,
        }
    }
}

impl RescueOptimizer {
    /// Generate all non-dominated items for the given per-room supply.
    ///
    /// `supply` is the incapable count the planner may draw on per room —
    /// discovered counts at phase transition, or the affected vector during a
    /// replan.  If the budget is exceeded the effective capacity shrinks one
    /// step at a time; the degenerate result is an empty item list, never an
    /// error.
    pub fn generate_items(
        &self,
        snap: &Snapshot<'_>,
        supply: &BTreeMap<VertexId, u32>,
    ) -> Vec<RescueItem> {
        let rooms: Vec<VertexId> = supply
            .iter()
            .filter(|&(_, &n)| n > 0)
            .map(|(&v, _)| v)
            .collect();
        if rooms.is_empty() {
            return Vec::new();
        }

        let exits = find_exits(snap.graph);
        let mut sources = rooms.clone();
        sources.extend(&exits);
        let matrix = DistanceMatrix::build(snap.graph, &snap.edge_exists, &sources);

        let fire_tree = (self.fire_weight > 0.0)
            .then(|| dijkstra_from(snap.graph, &snap.edge_exists, snap.fire_origin));

        let priorities: BTreeMap<VertexId, f64> = rooms
            .iter()
            .map(|&room| (room, snap.graph.vertex(room).priority as f64))
            .collect();

        let mut k_eff = self.capacity.max(1);
        loop {
            match self.generate_with_capacity(
                k_eff,
                &rooms,
                &exits,
                supply,
                &matrix,
                &fire_tree,
                &priorities,
            ) {
                Ok(items) => return items,
                Err(RescueError::BudgetExceeded(_)) if k_eff > 1 => k_eff -= 1,
                Err(_) => return Vec::new(),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_with_capacity(
        &self,
        k: u32,
        rooms: &[VertexId],
        exits: &[VertexId],
        supply: &BTreeMap<VertexId, u32>,
        matrix: &DistanceMatrix,
        fire_tree: &Option<ShortestPaths>,
        priorities: &BTreeMap<VertexId, f64>,
    ) -> RescueResult<Vec<RescueItem>> {
        let mut items = Vec::new();
        // Best time per (room, count) single, recorded while r = 1 runs so
        // multi-room items can be pruned the moment they are produced.
        let mut single_best: BTreeMap<(VertexId, u32), f64> = BTreeMap::new();
        let mut evals = 0usize;

        let max_rooms = (k as usize).min(rooms.len());
        for subset_size in 1..=max_rooms {
            let mut combo = Vec::with_capacity(subset_size);
            self.each_combination(
                rooms,
                0,
                subset_size,
                &mut combo,
                &mut |combo| -> RescueResult<()> {
                    let mut vector = BTreeMap::new();
                    each_allocation(combo, 0, k, supply, &mut vector, &mut |vector| {
                        self.emit_best_item(
                            vector,
                            combo,
                            exits,
                            matrix,
                            fire_tree,
                            priorities,
                            k,
                            &mut single_best,
                            &mut items,
                            &mut evals,
                        )
                    })
                },
            )?;
        }

        Ok(items)
    }

    /// Enumerate `size`-element combinations of `rooms[from..]`.
    fn each_combination(
        &self,
        rooms: &[VertexId],
        from: usize,
        size: usize,
        combo: &mut Vec<VertexId>,
        f: &mut dyn FnMut(&[VertexId]) -> RescueResult<()>,
    ) -> RescueResult<()> {
        if size == 0 {
            return f(combo);
        }
        for i in from..=rooms.len().saturating_sub(size) {
            combo.push(rooms[i]);
            self.each_combination(rooms, i + 1, size - 1, combo, f)?;
            combo.pop();
        }
        Ok(())
    }

    /// Evaluate every permutation × exit pair for one allocation, keep the
    /// fastest, prune against the singles, and push the survivor.
    #[allow(clippy::too_many_arguments)]
    fn emit_best_item(
        &self,
        vector: &BTreeMap<VertexId, u32>,
        combo: &[VertexId],
        exits: &[VertexId],
        matrix: &DistanceMatrix,
        fire_tree: &Option<ShortestPaths>,
        priorities: &BTreeMap<VertexId, f64>,
        k: u32,
        single_best: &mut BTreeMap<(VertexId, u32), f64>,
        items: &mut Vec<RescueItem>,
        evals: &mut usize,
    ) -> RescueResult<()> {
        let mut best: Option<(f64, Vec<VertexId>, VertexId, VertexId)> = None;

        let mut perm = Vec::with_capacity(combo.len());
        let mut used = vec![false; combo.len()];
        each_permutation(combo, &mut perm, &mut used, &mut |perm| {
            for &entry in exits {
                for &drop in exits {
                    *evals += 1;
                    if *evals > self.eval_budget {
                        return Err(RescueError::BudgetExceeded(*evals));
                    }
                    let Some(time) = tour_time(perm, entry, drop, matrix) else {
                        continue;
                    };
                    let better = match &best {
                        None => true,
                        Some((t, ..)) => time < *t,
                    };
                    if better {
                        best = Some((time, perm.to_vec(), entry, drop));
                    }
                }
            }
            Ok(())
        })?;

        let Some((time, sequence, entry, drop)) = best else {
            return Ok(()); // nothing reachable for this allocation
        };

        if combo.len() == 1 {
            let key = (combo[0], vector[&combo[0]]);
            let slot = single_best.entry(key).or_insert(f64::INFINITY);
            if time < *slot {
                *slot = time;
            }
        } else {
            // Domination check: a chained trip must beat its singles run
            // sequentially, else it only wastes carry slots.
            let sequential: f64 = sequence
                .iter()
                .map(|room| {
                    single_best
                        .get(&(*room, vector[room]))
                        .copied()
                        .unwrap_or(f64::INFINITY)
                })
                .sum();
            if time >= sequential {
                return Ok(());
            }
        }

        let Some(full_path) = stitch_path(&sequence, entry, drop, matrix) else {
            return Ok(());
        };

        let people: u32 = vector.values().sum();
        let value: f64 = vector
            .iter()
            .map(|(&room, &count)| {
                let boost = match fire_tree {
                    Some(tree) => match tree.distance_m(room) {
                        Some(d) => 1.0 + self.fire_weight / (1.0 + d),
                        None => 1.0,
                    },
                    None => 1.0,
                };
                count as f64 * priorities.get(&room).copied().unwrap_or(1.0) * boost
            })
            .sum();

        let item = RescueItem {
            vector: vector.clone(),
            visit_sequence: sequence,
            entry_exit: entry,
            drop_exit: drop,
            full_path,
            time,
            value: finalize_value(value, people, k, self.under_capacity_penalty, time),
        };
        items.push(item);
        Ok(())
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

/// Enumerate positive allocations over `combo`: every room gets at least one,
/// totals stay within `k` and per-room supply.
fn each_allocation(
    combo: &[VertexId],
    at: usize,
    remaining: u32,
    supply: &BTreeMap<VertexId, u32>,
    vector: &mut BTreeMap<VertexId, u32>,
    f: &mut dyn FnMut(&BTreeMap<VertexId, u32>) -> RescueResult<()>,
) -> RescueResult<()> {
    if at == combo.len() {
        return f(vector);
    }
    let room = combo[at];
    // Leave at least one unit of capacity per remaining room.
    let rooms_after = (combo.len() - at - 1) as u32;
    let max_here = supply
        .get(&room)
        .copied()
        .unwrap_or(0)
        .min(remaining.saturating_sub(rooms_after));
    for count in 1..=max_here {
        vector.insert(room, count);
        each_allocation(combo, at + 1, remaining - count, supply, vector, f)?;
    }
    vector.remove(&room);
    Ok(())
}

/// Enumerate permutations of `combo` via recursive selection.
fn each_permutation(
    combo: &[VertexId],
    perm: &mut Vec<VertexId>,
    used: &mut [bool],
    f: &mut dyn FnMut(&[VertexId]) -> RescueResult<()>,
) -> RescueResult<()> {
    if perm.len() == combo.len() {
        return f(perm);
    }
    for i in 0..combo.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        perm.push(combo[i]);
        each_permutation(combo, perm, used, f)?;
        perm.pop();
        used[i] = false;
    }
    Ok(())
}

/// Tour cost: one unloaded entry leg, then every leg after the first pickup
/// at double cost (carrying halves speed).
fn tour_time(
    sequence: &[VertexId],
    entry: VertexId,
    drop: VertexId,
    matrix: &DistanceMatrix,
) -> Option<f64> {
    let first = *sequence.first()?;
    let mut time = matrix.distance_m(entry, first)?;
    let mut loaded = 0.0;
    for pair in sequence.windows(2) {
        loaded += matrix.distance_m(pair[0], pair[1])?;
    }
    loaded += matrix.distance_m(*sequence.last()?, drop)?;
    time += 2.0 * loaded;
    Some(time)
}

/// Concatenate the concrete shortest paths along the tour.
fn stitch_path(
    sequence: &[VertexId],
    entry: VertexId,
    drop: VertexId,
    matrix: &DistanceMatrix,
) -> Option<Vec<VertexId>> {
    let mut path = vec![entry];
    let mut current = entry;
    for &room in sequence {
        if current != room {
            let leg = matrix.path(current, room)?;
            path.extend(&leg[1..]);
            current = room;
        }
    }
    if current != drop {
        let leg = matrix.path(current, drop)?;
        path.extend(&leg[1..]);
    }
    Some(path)
}

fn finalize_value(raw: f64, people: u32, k: u32, alpha: f64, time: f64) -> f64 {
    let mut v = raw;
    if people < k {
        v *= (1.0 - alpha * (k - people) as f64).max(0.0);
    }
    v / time.max(MIN_TIME)
}
