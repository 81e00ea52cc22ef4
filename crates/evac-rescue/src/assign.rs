//! Item assignment: greedy value density, with an optional LP relaxation.

use std::collections::BTreeMap;

use evac_core::{ResponderId, VertexId};
use minilp::{ComparisonOp, OptimizationDirection, Problem};

use crate::item::RescueItem;

/// Who can take items and how many occupants each room can still give up.
pub struct AssignmentInput<'a> {
    /// Eligible (non-trapped) responders in id order.
    pub responders: &'a [ResponderId],
    /// Remaining incapable supply per room.
    pub supply: &'a BTreeMap<VertexId, u32>,
}

/// Assignment policy selected at model construction.
///
/// Implementations must preserve disjointness: across all assigned items the
/// per-room totals never exceed the supply.
pub trait ItemAssigner {
    fn assign(
        &self,
        items: &[RescueItem],
        input: &AssignmentInput<'_>,
    ) -> BTreeMap<ResponderId, Vec<RescueItem>>;
}

// ── Greedy ────────────────────────────────────────────────────────────────────

/// Default policy: items in descending value density, each going to the
/// responder with the least accumulated execution time (ties: lowest id).
pub struct GreedyAssigner;

impl ItemAssigner for GreedyAssigner {
    fn assign(
        &self,
        items: &[RescueItem],
        input: &AssignmentInput<'_>,
    ) -> BTreeMap<ResponderId, Vec<RescueItem>> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| items[b].value.total_cmp(&items[a].value).then(a.cmp(&b)));
        select_in_order(&order, items, input)
    }
}

// ── LP ────────────────────────────────────────────────────────────────────────

/// LP relaxation: maximize `Σ xᵢ·valueᵢ` over `xᵢ ∈ [0, 1]` subject to
/// per-room supply constraints, then round greedily by descending `xᵢ`.
/// Solver failure (or an empty problem) falls back to [`GreedyAssigner`].
pub struct LpAssigner;

impl ItemAssigner for LpAssigner {
    fn assign(
        &self,
        items: &[RescueItem],
        input: &AssignmentInput<'_>,
    ) -> BTreeMap<ResponderId, Vec<RescueItem>> {
        if items.is_empty() {
            return BTreeMap::new();
        }

        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let vars: Vec<_> = items
            .iter()
            .map(|item| problem.add_var(item.value, (0.0, 1.0)))
            .collect();

        for (&room, &cap) in input.supply {
            let terms: Vec<(minilp::Variable, f64)> = items
                .iter()
                .zip(&vars)
                .filter_map(|(item, &var)| {
                    item.vector.get(&room).map(|&count| (var, count as f64))
                })
                .collect();
            if !terms.is_empty() {
                problem.add_constraint(&terms, ComparisonOp::Le, cap as f64);
            }
        }

        let solution = match problem.solve() {
            Ok(s) => s,
            Err(_) => return GreedyAssigner.assign(items, input),
        };

        // Round: take items by descending fractional selection; anything the
        // LP barely touched is dropped.
        let mut order: Vec<usize> = (0..items.len())
            .filter(|&i| solution[vars[i]] > 0.01)
            .collect();
        order.sort_by(|&a, &b| {
            solution[vars[b]]
                .total_cmp(&solution[vars[a]])
                .then(a.cmp(&b))
        });
        select_in_order(&order, items, input)
    }
}

// ── Shared selection loop ─────────────────────────────────────────────────────

/// Walk items in the given order, keeping those the remaining supply can
/// still cover, and hand each to the least-loaded responder.
fn select_in_order(
    order: &[usize],
    items: &[RescueItem],
    input: &AssignmentInput<'_>,
) -> BTreeMap<ResponderId, Vec<RescueItem>> {
    let mut remaining = input.supply.clone();
    let mut loads: BTreeMap<ResponderId, f64> = input
        .responders
        .iter()
        .map(|&rid| (rid, 0.0))
        .collect();
    let mut assignments: BTreeMap<ResponderId, Vec<RescueItem>> = BTreeMap::new();

    if loads.is_empty() {
        return assignments;
    }

    for &i in order {
        let item = &items[i];
        let feasible = item
            .vector
            .iter()
            .all(|(room, &count)| remaining.get(room).copied().unwrap_or(0) >= count);
        if !feasible {
            continue;
        }

        // Lowest accumulated time wins, ties to the lowest responder id.
        let rid = *loads
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
            .map(|(rid, _)| rid)
            .expect("at least one responder");

        for (room, &count) in &item.vector {
            if let Some(left) = remaining.get_mut(room) {
                *left -= count;
            }
        }
        *loads.get_mut(&rid).unwrap() += item.time;
        assignments.entry(rid).or_default().push(item.clone());
    }

    assignments
}
