//! Pathfinding services: BFS over existing edges, Dijkstra single-source,
//! memoized all-pairs, and exit discovery.
//!
//! # Cost units
//!
//! BFS distances are hop counts (the sweep planner's corridor metric).
//! Dijkstra costs are edge lengths in integer millimetres internally — the
//! heap orders on `u64` without floating-point comparisons — and are exposed
//! in metres.
//!
//! Every function takes the static graph plus an `exists: &[bool]` slice
//! indexed by `EdgeId`; cleared edges are invisible.  Results are only valid
//! for the existence snapshot they were computed against, so callers must
//! re-run after the kernel reports burned edges.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use evac_core::{EdgeId, VertexId};

use crate::graph::BuildingGraph;

// ── BFS ───────────────────────────────────────────────────────────────────────

/// Shortest unweighted path from `from` to `to` over existing edges.
///
/// Returns the full vertex sequence `[from, …, to]`, or `None` if `to` is
/// unreachable.  `from == to` yields a single-element path.
pub fn bfs_path(
    graph: &BuildingGraph,
    exists: &[bool],
    from: VertexId,
    to: VertexId,
) -> Option<Vec<VertexId>> {
    if from == to {
        return Some(vec![from]);
    }

    let mut prev = vec![VertexId::INVALID; graph.vertex_count()];
    let mut visited = vec![false; graph.vertex_count()];
    visited[from.index()] = true;

    let mut queue = VecDeque::new();
    queue.push_back(from);

    while let Some(node) = queue.pop_front() {
        for &(neighbor, edge) in graph.neighbors(node) {
            if !exists[edge.index()] || visited[neighbor.index()] {
                continue;
            }
            visited[neighbor.index()] = true;
            prev[neighbor.index()] = node;
            if neighbor == to {
                // Backtrack from the goal.
                let mut path = vec![to];
                let mut cur = node;
                while cur != VertexId::INVALID {
                    path.push(cur);
                    cur = prev[cur.index()];
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(neighbor);
        }
    }

    None
}

/// The next vertex to step to on a shortest path toward `to`, or `None` if
/// unreachable or already there.
pub fn bfs_next_step(
    graph: &BuildingGraph,
    exists: &[bool],
    from: VertexId,
    to: VertexId,
) -> Option<VertexId> {
    let path = bfs_path(graph, exists, from, to)?;
    path.get(1).copied()
}

/// BFS hop distance, or `None` if unreachable.
pub fn bfs_distance(
    graph: &BuildingGraph,
    exists: &[bool],
    from: VertexId,
    to: VertexId,
) -> Option<u32> {
    bfs_path(graph, exists, from, to).map(|p| (p.len() - 1) as u32)
}

/// Hop distances from `src` to every vertex; `None` entries are unreachable.
///
/// One scan serves many queries — the sweep planner's clustering metric calls
/// this once per room instead of running a BFS per pair.
pub fn bfs_distances_from(
    graph: &BuildingGraph,
    exists: &[bool],
    src: VertexId,
) -> Vec<Option<u32>> {
    let mut dist = vec![None; graph.vertex_count()];
    dist[src.index()] = Some(0);

    let mut queue = VecDeque::new();
    queue.push_back(src);

    while let Some(node) = queue.pop_front() {
        let d = dist[node.index()].unwrap_or(0);
        for &(neighbor, edge) in graph.neighbors(node) {
            if exists[edge.index()] && dist[neighbor.index()].is_none() {
                dist[neighbor.index()] = Some(d + 1);
                queue.push_back(neighbor);
            }
        }
    }

    dist
}

// ── Dijkstra ──────────────────────────────────────────────────────────────────

/// A single-source shortest-path tree produced by [`dijkstra_from`].
///
/// `distance(src, src)` is always `Some(0.0)` — items that rescue several
/// people from the same room rely on the zero self-distance.
pub struct ShortestPaths {
    pub source: VertexId,
    /// Cost in millimetres; `u64::MAX` marks unreachable vertices.
    dist_mm: Vec<u64>,
    prev: Vec<VertexId>,
}

impl ShortestPaths {
    /// Distance in metres, or `None` if unreachable.
    pub fn distance_m(&self, to: VertexId) -> Option<f64> {
        let d = self.dist_mm[to.index()];
        (d != u64::MAX).then(|| d as f64 / 1000.0)
    }

    /// Full vertex path `[source, …, to]`, or `None` if unreachable.
    pub fn path_to(&self, to: VertexId) -> Option<Vec<VertexId>> {
        if self.dist_mm[to.index()] == u64::MAX {
            return None;
        }
        let mut path = Vec::new();
        let mut cur = to;
        while cur != VertexId::INVALID {
            path.push(cur);
            cur = self.prev[cur.index()];
        }
        path.reverse();
        debug_assert_eq!(path[0], self.source);
        Some(path)
    }
}

/// Dijkstra's algorithm over existing edges, weighted by edge length.
///
/// Ties break on vertex id so the tree is deterministic.
pub fn dijkstra_from(graph: &BuildingGraph, exists: &[bool], src: VertexId) -> ShortestPaths {
    let n = graph.vertex_count();
    let mut dist_mm = vec![u64::MAX; n];
    let mut prev = vec![VertexId::INVALID; n];
    dist_mm[src.index()] = 0;

    // Min-heap via Reverse; secondary key VertexId for deterministic pops.
    let mut heap: BinaryHeap<Reverse<(u64, VertexId)>> = BinaryHeap::new();
    heap.push(Reverse((0, src)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if cost > dist_mm[node.index()] {
            continue; // stale heap entry
        }
        for &(neighbor, edge) in graph.neighbors(node) {
            if !exists[edge.index()] {
                continue;
            }
            let new_cost = cost.saturating_add(graph.edge(edge).length_mm as u64);
            if new_cost < dist_mm[neighbor.index()] {
                dist_mm[neighbor.index()] = new_cost;
                prev[neighbor.index()] = node;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    ShortestPaths {
        source: src,
        dist_mm,
        prev,
    }
}

// ── DistanceMatrix ────────────────────────────────────────────────────────────

/// Memoized all-pairs shortest paths over a source set (typically
/// `rooms-with-incapable ∪ exits`).  One Dijkstra tree per source.
pub struct DistanceMatrix {
    trees: BTreeMap<VertexId, ShortestPaths>,
}

impl DistanceMatrix {
    /// Run Dijkstra from every vertex in `sources`.
    pub fn build(graph: &BuildingGraph, exists: &[bool], sources: &[VertexId]) -> Self {
        let trees = sources
            .iter()
            .map(|&src| (src, dijkstra_from(graph, exists, src)))
            .collect();
        Self { trees }
    }

    /// Distance in metres from `a` to `b`; `None` if `a` is not a source or
    /// `b` is unreachable.
    pub fn distance_m(&self, a: VertexId, b: VertexId) -> Option<f64> {
        self.trees.get(&a)?.distance_m(b)
    }

    /// Concrete vertex path from `a` to `b`.
    pub fn path(&self, a: VertexId, b: VertexId) -> Option<Vec<VertexId>> {
        self.trees.get(&a)?.path_to(b)
    }
}

// ── Exits ─────────────────────────────────────────────────────────────────────

/// All exit-kind vertices in id order.
pub fn find_exits(graph: &BuildingGraph) -> Vec<VertexId> {
    graph
        .vertex_ids()
        .filter(|&v| graph.vertex(v).kind.is_exit())
        .collect()
}

/// The closest exit-kind vertex by BFS hops, or `None` if no exit is
/// reachable.  A responder standing on an exit gets that exit back.
pub fn nearest_exit(graph: &BuildingGraph, exists: &[bool], from: VertexId) -> Option<VertexId> {
    if graph.vertex(from).kind.is_exit() {
        return Some(from);
    }

    let mut visited = vec![false; graph.vertex_count()];
    visited[from.index()] = true;
    let mut queue = VecDeque::new();
    queue.push_back(from);

    while let Some(node) = queue.pop_front() {
        for &(neighbor, edge) in graph.neighbors(node) {
            if !exists[edge.index()] || visited[neighbor.index()] {
                continue;
            }
            if graph.vertex(neighbor).kind.is_exit() {
                return Some(neighbor);
            }
            visited[neighbor.index()] = true;
            queue.push_back(neighbor);
        }
    }

    None
}
