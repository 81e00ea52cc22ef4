//! Per-cluster tour construction: Prim MST over the cluster's complete
//! graph, then a DFS preorder from the responder's start.
//!
//! The preorder is the room *visit order*; walking it with shortest paths
//! between consecutive rooms costs at most twice the MST weight.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use evac_core::VertexId;

use crate::cluster::HopMatrix;

/// Minimum spanning tree over `nodes` (complete graph weighted by hop
/// distance), grown from `start` with Prim's algorithm.
///
/// Returns an adjacency map.  Nodes unreachable from the growing tree are
/// left out entirely — the caller treats them as deferred.
pub fn prim_mst(
    nodes: &[VertexId],
    start: VertexId,
    hops: &HopMatrix,
) -> BTreeMap<VertexId, Vec<VertexId>> {
    let mut mst: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
    if nodes.is_empty() {
        return mst;
    }

    mst.insert(start, Vec::new());

    // Heap of (weight, from, to); VertexId tie-breaks keep this deterministic.
    let mut heap: BinaryHeap<Reverse<(u32, VertexId, VertexId)>> = BinaryHeap::new();
    for &node in nodes {
        if node == start {
            continue;
        }
        if let Some(w) = hops.hops(start, node) {
            heap.push(Reverse((w, start, node)));
        }
    }

    while let Some(Reverse((_, from, to))) = heap.pop() {
        if mst.contains_key(&to) {
            continue;
        }
        mst.entry(from).or_default().push(to);
        mst.entry(to).or_default().push(from);

        for &node in nodes {
            if mst.contains_key(&node) {
                continue;
            }
            if let Some(w) = hops.hops(to, node) {
                heap.push(Reverse((w, to, node)));
            }
        }
    }

    mst
}

/// DFS preorder over the MST from `start`.  Each node appears exactly once;
/// the duplicate visits of the classical 2× walk are implied by the shortest
/// paths stitched in at dispatch time.
pub fn dfs_preorder(
    mst: &BTreeMap<VertexId, Vec<VertexId>>,
    start: VertexId,
) -> Vec<VertexId> {
    let mut order = Vec::with_capacity(mst.len());
    let mut stack = vec![start];
    let mut seen = std::collections::BTreeSet::new();

    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        order.push(node);
        if let Some(children) = mst.get(&node) {
            // Reverse so the lowest-id child is visited first.
            for &child in children.iter().rev() {
                if !seen.contains(&child) {
                    stack.push(child);
                }
            }
        }
    }

    order
}
