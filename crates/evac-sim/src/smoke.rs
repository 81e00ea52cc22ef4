//! Smoke generation, diffusion, and casualty probability bands.
//!
//! Smoke is tracked as a volume (m³) per vertex, capped at the vertex volume.
//! Only rooms have volume; hallways and exits are connection points that hold
//! no smoke, so diffusion is effectively room-to-room through direct edges.

use evac_graph::BuildingGraph;

use crate::state::VertexState;

/// Generation rate at full fire intensity, m³ per second.
const GENERATION_RATE: f64 = 3.5;

/// Fraction of smoke retained each tick (the rest vents and dissipates).
const RETENTION: f64 = 0.85;

/// Base diffusion coefficient at the 2 m reference corridor width.
const DIFFUSION_COEFF: f64 = 0.45;

/// Smoke rises: flow to a higher floor is faster, to a lower floor slower.
const UPWARD_MODIFIER: f64 = 1.5;
const DOWNWARD_MODIFIER: f64 = 0.5;

// ── Casualty bands ────────────────────────────────────────────────────────────

/// Per-person death probability per second at smoke concentration `c`.
///
/// Banded: breathable below 0.3, then increasingly lethal.
pub fn death_probability(c: f64) -> f64 {
    if c < 0.3 {
        0.0
    } else if c < 0.5 {
        0.02
    } else if c < 0.7 {
        0.05
    } else {
        0.15
    }
}

// ── Diffusion ─────────────────────────────────────────────────────────────────

/// Advance smoke one tick: retention, inflow down the concentration gradient,
/// generation in burning vertices, volume cap.
///
/// Burned vertices stay completely smoke-filled.  New volumes are computed
/// against the pre-tick state, then applied.
pub fn diffuse(graph: &BuildingGraph, vertices: &mut [VertexState], exists: &[bool], tick_secs: f64) {
    let mut next = Vec::with_capacity(vertices.len());

    for v in graph.vertex_ids() {
        let vs = &vertices[v.index()];
        let volume = graph.vertex(v).volume();

        if vs.burned {
            next.push(volume);
            continue;
        }

        let mut smoke = vs.smoke_m3 * RETENTION;
        let my_level = vs.smoke_level(volume);

        for &(n, e) in graph.neighbors(v) {
            if !exists[e.index()] {
                continue;
            }
            let n_volume = graph.vertex(n).volume();
            let gradient = vertices[n.index()].smoke_level(n_volume) - my_level;
            if gradient <= 0.0 {
                continue;
            }
            let width_factor = graph.edge(e).width_m / 2.0;
            let vertical = match graph.vertex(v).floor.cmp(&graph.vertex(n).floor) {
                std::cmp::Ordering::Greater => UPWARD_MODIFIER,
                std::cmp::Ordering::Less => DOWNWARD_MODIFIER,
                std::cmp::Ordering::Equal => 1.0,
            };
            smoke += gradient * DIFFUSION_COEFF * width_factor * vertical * volume.min(n_volume);
        }

        if vs.fire_intensity > 0.0 {
            smoke += GENERATION_RATE * vs.fire_intensity * tick_secs;
        }

        next.push(smoke.min(volume));
    }

    for (vs, smoke) in vertices.iter_mut().zip(next) {
        vs.smoke_m3 = smoke;
    }
}
