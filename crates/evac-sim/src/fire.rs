//! Fire physics: edge burn-out probability, intensity propagation, and
//! threshold ignition.
//!
//! Rates are per second and scaled by the tick duration at application time.
//! Distance terms use the floor-plan positions when present; vertices without
//! positions contribute no distance attenuation (graph connectivity only) and
//! edges without positions never burn stochastically.

use evac_core::VertexId;
use evac_graph::BuildingGraph;

use crate::state::VertexState;

/// Intensity the fire origin starts with.
pub const ORIGIN_INITIAL_INTENSITY: f64 = 0.3;

/// Intensity at which a vertex ignites, burns down, and kills its occupants.
pub const IGNITION_THRESHOLD: f64 = 1.0;

/// Cold-start growth of an already-burning vertex, per second.
const INTRINSIC_GROWTH_PER_SEC: f64 = 0.001;

/// Preheating contribution coefficient per burning neighbor.
const PREHEAT_COEFF: f64 = 0.0025;

/// Ignition spread coefficient from burning neighbors into cold vertices.
const IGNITION_SPREAD_COEFF: f64 = 0.005;

/// Fire crosses floors 30% slower.
const VERTICAL_MODIFIER: f64 = 0.7;

// ── Edge burn-out ─────────────────────────────────────────────────────────────

/// Probability that an edge burns out this tick.
///
/// `dist_to_fire` is the 3-D distance from the edge midpoint to the nearest
/// burning vertex; `f64::INFINITY` (no position data) disables burning.
/// The caller clamps into [0, 1] when rolling.
pub fn edge_burn_probability(
    base_burn_rate: f64,
    width_m: f64,
    dist_to_fire: f64,
    elapsed_secs: f64,
    tick_secs: f64,
) -> f64 {
    if !dist_to_fire.is_finite() {
        return 0.0;
    }
    let time_factor = 1.0 + elapsed_secs / 100.0;
    let distance_factor = 1.0 / (1.0 + dist_to_fire / 10.0);
    // 2 m reference width; wider corridors are harder to burn through.
    let width_factor = 2.0 / width_m.max(0.5);
    base_burn_rate * time_factor * distance_factor * width_factor * tick_secs
}

/// Recompute every edge's distance to the nearest burning vertex.
///
/// Burning means `fire_intensity > 0` or already burned; before anything
/// ignites the fire origin alone counts.  Vertical separation contributes
/// `floor_height_m` per floor.
pub fn edge_fire_distances(
    graph: &BuildingGraph,
    vertices: &[VertexState],
    fire_origin: VertexId,
    floor_height_m: f64,
) -> Vec<f64> {
    let mut burning: Vec<VertexId> = graph
        .vertex_ids()
        .filter(|&v| {
            let vs = &vertices[v.index()];
            vs.fire_intensity > 0.0 || vs.burned
        })
        .collect();
    if burning.is_empty() {
        burning.push(fire_origin);
    }

    graph
        .edge_ids()
        .map(|e| {
            let Some((mid, mid_floor)) = graph.edge_midpoint(e) else {
                return f64::INFINITY;
            };
            burning
                .iter()
                .filter_map(|&b| {
                    let pos = graph.vertex(b).position?;
                    let dx = mid.x - pos.x;
                    let dy = mid.y - pos.y;
                    let dz = (mid_floor - graph.vertex(b).floor as f64).abs() * floor_height_m;
                    Some((dx * dx + dy * dy + dz * dz).sqrt())
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

// ── Intensity propagation ─────────────────────────────────────────────────────

/// Advance fire intensity one tick and burn down vertices that cross the
/// ignition threshold.
///
/// Returns `(vertex, deaths)` for every vertex that burned this tick.
/// Intensities are computed against the pre-tick state so vertex iteration
/// order cannot leak into the result.
pub fn propagate(
    graph: &BuildingGraph,
    vertices: &mut [VertexState],
    exists: &[bool],
    floor_height_m: f64,
    tick_secs: f64,
) -> Vec<(VertexId, u32)> {
    let mut next = Vec::with_capacity(vertices.len());

    for v in graph.vertex_ids() {
        let vs = &vertices[v.index()];
        if vs.burned {
            next.push(1.0);
            continue;
        }

        let mut intensity = vs.fire_intensity;

        // Growth of an already-burning vertex: intrinsic plus preheating from
        // burning neighbors (radiant heat through corridors).
        if intensity > 0.0 {
            let mut preheat = 0.0;
            for &(n, e) in graph.neighbors(v) {
                if !exists[e.index()] {
                    continue;
                }
                let ns = &vertices[n.index()];
                if ns.fire_intensity <= 0.0 {
                    continue;
                }
                // 2 m reference; wider corridors transfer more heat.
                let width_factor = graph.edge(e).width_m / 2.0;
                let distance_factor = graph
                    .spatial_distance(v, n, floor_height_m)
                    .map(|d| 1.0 / d.max(1.0))
                    .unwrap_or(1.0);
                let vertical = cross_floor_modifier(graph, v, n);
                preheat += ns.fire_intensity * PREHEAT_COEFF * width_factor * distance_factor * vertical;
            }
            intensity = (intensity + (INTRINSIC_GROWTH_PER_SEC + preheat) * tick_secs).min(1.0);
        }

        // Ignition from burning neighbors; tapers off as the vertex ignites
        // so preheating takes over instead of a runaway feedback loop.
        for &(n, e) in graph.neighbors(v) {
            if !exists[e.index()] {
                continue;
            }
            let ns = &vertices[n.index()];
            if ns.fire_intensity <= 0.0 {
                continue;
            }
            let width_factor = 2.0 / graph.edge(e).width_m.max(0.5);
            let taper = (1.0 - intensity).max(0.0);
            let vertical = cross_floor_modifier(graph, v, n);
            let spread =
                ns.fire_intensity * IGNITION_SPREAD_COEFF * width_factor * taper * vertical * tick_secs;
            intensity = (intensity + spread).min(1.0);
        }

        next.push(intensity);
    }

    let mut burned = Vec::new();
    for v in graph.vertex_ids() {
        let intensity = next[v.index()];
        let vs = &mut vertices[v.index()];
        vs.fire_intensity = intensity;
        if !vs.burned && intensity >= IGNITION_THRESHOLD {
            let deaths = vs.burn_down(graph.vertex(v).volume());
            burned.push((v, deaths));
        }
    }
    burned
}

#[inline]
fn cross_floor_modifier(graph: &BuildingGraph, a: VertexId, b: VertexId) -> f64 {
    if graph.vertex(a).floor != graph.vertex(b).floor {
        VERTICAL_MODIFIER
    } else {
        1.0
    }
}
