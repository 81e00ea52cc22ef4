//! k-medoids (PAM) partitioning over corridor distance.
//!
//! Distances are BFS hop counts on the current graph.  Euclidean distance is
//! deliberately not used: two rooms can share a wall yet be a full corridor
//! loop apart.

use std::collections::BTreeMap;

use evac_core::{SimRng, VertexId};
use evac_graph::{bfs_distances_from, BuildingGraph};

/// Swap-iteration cap for PAM refinement.
const MAX_PAM_ITERATIONS: usize = 20;

// ── HopMatrix ─────────────────────────────────────────────────────────────────

/// Memoized BFS hop distances from a set of source vertices.
pub struct HopMatrix {
    rows: BTreeMap<VertexId, Vec<Option<u32>>>,
}

impl HopMatrix {
    /// A matrix with no sources; every lookup misses.
    pub fn build_empty() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Run one BFS per source over the existing edges.
    pub fn build(graph: &BuildingGraph, exists: &[bool], sources: &[VertexId]) -> Self {
        let rows = sources
            .iter()
            .map(|&src| (src, bfs_distances_from(graph, exists, src)))
            .collect();
        Self { rows }
    }

    /// Hop distance from a source vertex; `None` if `from` is not a source or
    /// `to` is unreachable.
    pub fn hops(&self, from: VertexId, to: VertexId) -> Option<u32> {
        *self.rows.get(&from)?.get(to.index())?
    }
}

// ── k-medoids ─────────────────────────────────────────────────────────────────

/// Partition `rooms` into `starts.len()` clusters.
///
/// Medoids seed from the room nearest each start position (the responders'
/// exits), so cluster `i` naturally belongs to responder `i`.  After PAM
/// convergence a balance pass keeps cluster sizes within
/// `⌊N/R⌋−1 ..= ⌈N/R⌉+1` by moving boundary rooms into under-full clusters.
///
/// Rooms unreachable from every medoid are excluded from all clusters; the
/// caller defers them.  Returns one (possibly empty) room list per start, in
/// start order.
pub fn k_medoids(
    graph: &BuildingGraph,
    exists: &[bool],
    rooms: &[VertexId],
    starts: &[VertexId],
    rng: &mut SimRng,
) -> Vec<Vec<VertexId>> {
    let r = starts.len();
    if r == 0 || rooms.is_empty() {
        return vec![Vec::new(); r];
    }

    // One BFS per room and per start covers every distance the algorithm asks for.
    let mut sources: Vec<VertexId> = rooms.to_vec();
    for &s in starts {
        if !sources.contains(&s) {
            sources.push(s);
        }
    }
    let hops = HopMatrix::build(graph, exists, &sources);

    // ── Seed: nearest unclaimed room to each start ────────────────────────
    let mut medoids: Vec<VertexId> = Vec::with_capacity(r);
    for &start in starts {
        let nearest = rooms
            .iter()
            .filter(|room| !medoids.contains(room))
            .filter_map(|&room| hops.hops(start, room).map(|d| (d, room)))
            .min_by_key(|&(d, room)| (d, room));
        match nearest {
            Some((_, room)) => medoids.push(room),
            None => {
                // Start is cut off from every remaining room; seed from the
                // leftovers so the cluster count stays R.
                let leftover: Vec<VertexId> = rooms
                    .iter()
                    .copied()
                    .filter(|room| !medoids.contains(room))
                    .collect();
                match rng.choose(&leftover) {
                    Some(&room) => medoids.push(room),
                    None => medoids.push(VertexId::INVALID),
                }
            }
        }
    }

    // ── PAM refinement ────────────────────────────────────────────────────
    let mut clusters: Vec<Vec<VertexId>> = vec![Vec::new(); r];
    for _ in 0..MAX_PAM_ITERATIONS {
        // Assignment: each room to its nearest medoid (ties: lowest cluster).
        for c in &mut clusters {
            c.clear();
        }
        for &room in rooms {
            let nearest = (0..r)
                .filter(|&i| medoids[i] != VertexId::INVALID)
                .filter_map(|i| hops.hops(room, medoids[i]).map(|d| (d, i)))
                .min_by_key(|&(d, i)| (d, i));
            if let Some((_, i)) = nearest {
                clusters[i].push(room);
            }
            // Unreachable from every medoid: excluded, deferred by the caller.
        }

        // Update: the member minimizing total in-cluster distance.
        let mut next_medoids = medoids.clone();
        for (i, cluster) in clusters.iter().enumerate() {
            if cluster.is_empty() {
                continue;
            }
            let best = cluster
                .iter()
                .map(|&candidate| {
                    let total: u64 = cluster
                        .iter()
                        .map(|&other| hops.hops(candidate, other).unwrap_or(u32::MAX) as u64)
                        .sum();
                    (total, candidate)
                })
                .min()
                .map(|(_, candidate)| candidate);
            if let Some(m) = best {
                next_medoids[i] = m;
            }
        }

        if next_medoids == medoids {
            break;
        }
        medoids = next_medoids;
    }

    rebalance(&mut clusters, &medoids, &hops, rooms.len());
    clusters
}

/// Move boundary rooms out of over-full clusters until every cluster size is
/// within `⌊N/R⌋−1 ..= ⌈N/R⌉+1`, or no legal move remains.
fn rebalance(
    clusters: &mut [Vec<VertexId>],
    medoids: &[VertexId],
    hops: &HopMatrix,
    n: usize,
) {
    let r = clusters.len();
    if r == 0 || n == 0 {
        return;
    }
    let hi = n.div_ceil(r) + 1;

    // Each pass moves one room; bounded by the total room count.
    for _ in 0..n {
        let Some(over) = (0..r).find(|&i| clusters[i].len() > hi) else {
            break;
        };

        // The member farthest from its own medoid is the boundary room.
        let Some((_, room_pos)) = clusters[over]
            .iter()
            .enumerate()
            .map(|(pos, &room)| (hops.hops(room, medoids[over]).unwrap_or(u32::MAX), pos))
            .max()
        else {
            break;
        };
        let room = clusters[over][room_pos];

        // Receiving cluster: nearest under-full medoid the room can reach.
        let target = (0..r)
            .filter(|&i| i != over && clusters[i].len() < hi)
            .filter(|&i| medoids[i] != VertexId::INVALID)
            .filter_map(|i| hops.hops(room, medoids[i]).map(|d| (d, i)))
            .min_by_key(|&(d, i)| (d, i));
        let Some((_, target)) = target else {
            break;
        };

        clusters[over].remove(room_pos);
        clusters[target].push(room);
    }
}
