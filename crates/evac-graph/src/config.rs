//! JSON building configuration.
//!
//! The config document mirrors the floor-plan authoring format: a vertex
//! list, an edge list, per-room occupancy ranges, fire parameters, and
//! optional multi-floor building parameters.  Unknown fields are ignored so
//! authoring tools can stash extra metadata.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use evac_core::VertexKind;

use crate::error::{GraphError, GraphResult};
use crate::graph::{BuildingGraph, GraphBuilder, Point, Vertex};

// ── Config documents ──────────────────────────────────────────────────────────

/// Top-level building configuration document.
#[derive(Clone, Debug, Deserialize)]
pub struct BuildingConfig {
    pub vertices: Vec<VertexConfig>,
    pub edges: Vec<EdgeConfig>,
    /// Per-room occupancy ranges, keyed by vertex id.  Entries for unknown
    /// or non-room vertices are ignored.
    #[serde(default)]
    pub occupancy_probabilities: BTreeMap<String, OccupancyConfig>,
    pub fire_params: FireParams,
    #[serde(default)]
    pub building_params: Option<BuildingParams>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VertexConfig {
    pub id: String,
    pub kind: VertexKind,
    #[serde(default = "default_floor")]
    pub floor: i32,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_sweep_time")]
    pub sweep_time: u32,
    #[serde(default = "default_area")]
    pub area_m2: f64,
    #[serde(default = "default_ceiling")]
    pub ceiling_height_m: f64,
    #[serde(default)]
    pub visual_position: Option<VisualPosition>,
    /// Authoring metadata ("office", "daycare", …); not used at runtime.
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub staircase_group: Option<String>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct VisualPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EdgeConfig {
    pub id: String,
    pub vertex_a: String,
    pub vertex_b: String,
    #[serde(default = "default_max_flow")]
    pub max_flow: u32,
    #[serde(default = "default_width")]
    pub width_m: f64,
    #[serde(default = "default_burn_rate")]
    pub base_burn_rate: f64,
    /// Traversal length in metres.  Horizontal corridors default to 1.0;
    /// stairwell edges configure their run length here.
    #[serde(default = "default_unit_length")]
    pub unit_length: f64,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Uniform occupancy range for one occupant class.
#[derive(Copy, Clone, Debug, Default, Deserialize)]
pub struct OccupancyRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Copy, Clone, Debug, Default, Deserialize)]
pub struct OccupancyConfig {
    #[serde(default)]
    pub capable: OccupancyRange,
    #[serde(default)]
    pub incapable: OccupancyRange,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FireParams {
    pub origin_vertex_id: String,
    #[serde(default)]
    pub initial_smoke_level: f64,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct BuildingParams {
    #[serde(default = "default_num_floors")]
    pub num_floors: u32,
    #[serde(default = "default_floor_height")]
    pub floor_height_m: f64,
}

impl Default for BuildingParams {
    fn default() -> Self {
        Self {
            num_floors: 1,
            floor_height_m: default_floor_height(),
        }
    }
}

fn default_floor() -> i32 {
    1
}
fn default_capacity() -> u32 {
    100
}
fn default_priority() -> u32 {
    1
}
fn default_sweep_time() -> u32 {
    2
}
fn default_area() -> f64 {
    100.0
}
fn default_ceiling() -> f64 {
    3.0
}
fn default_max_flow() -> u32 {
    5
}
fn default_width() -> f64 {
    2.0
}
fn default_burn_rate() -> f64 {
    0.0001
}
fn default_unit_length() -> f64 {
    1.0
}
fn default_num_floors() -> u32 {
    1
}
fn default_floor_height() -> f64 {
    3.0
}

// ── Loading and validation ────────────────────────────────────────────────────

impl BuildingConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a config file.
    pub fn from_path(path: &Path) -> GraphResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Floor height in metres (defaults apply when `building_params` is absent).
    pub fn floor_height_m(&self) -> f64 {
        self.building_params
            .map(|p| p.floor_height_m)
            .unwrap_or_else(default_floor_height)
    }

    /// Validate structure and build the static [`BuildingGraph`].
    ///
    /// Fails on: empty vertex list, duplicate vertex ids, edges referencing
    /// unknown vertices, no exit-kind vertex, or a fire origin that does not
    /// name a vertex.
    pub fn build_graph(&self) -> GraphResult<BuildingGraph> {
        if self.vertices.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        let mut seen = std::collections::HashSet::new();
        for vc in &self.vertices {
            if !seen.insert(vc.id.as_str()) {
                return Err(GraphError::DuplicateVertex(vc.id.clone()));
            }
        }

        let mut builder = GraphBuilder::new();
        for vc in &self.vertices {
            builder.add_vertex(
                vc.id.clone(),
                Vertex {
                    kind: vc.kind,
                    floor: vc.floor,
                    position: vc.visual_position.map(|p| Point { x: p.x, y: p.y }),
                    area_m2: vc.area_m2,
                    ceiling_m: vc.ceiling_height_m,
                    capacity: vc.capacity,
                    priority: vc.priority,
                    sweep_ticks: vc.sweep_time,
                },
            );
        }

        // Resolve edge endpoints against the vertex table before building.
        let lookup: BTreeMap<&str, usize> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, vc)| (vc.id.as_str(), i))
            .collect();

        for ec in &self.edges {
            let a = *lookup
                .get(ec.vertex_a.as_str())
                .ok_or_else(|| GraphError::UnknownEndpoint {
                    edge: ec.id.clone(),
                    vertex: ec.vertex_a.clone(),
                })?;
            let b = *lookup
                .get(ec.vertex_b.as_str())
                .ok_or_else(|| GraphError::UnknownEndpoint {
                    edge: ec.id.clone(),
                    vertex: ec.vertex_b.clone(),
                })?;
            builder.add_edge(
                evac_core::VertexId(a as u32),
                evac_core::VertexId(b as u32),
                ec.max_flow,
                ec.width_m,
                ec.base_burn_rate,
                ec.unit_length,
            );
        }

        let graph = builder.build();

        if !graph.vertex_ids().any(|v| graph.vertex(v).kind.is_exit()) {
            return Err(GraphError::NoExits);
        }
        if graph
            .vertex_by_name(&self.fire_params.origin_vertex_id)
            .is_none()
        {
            return Err(GraphError::UnknownVertex(
                self.fire_params.origin_vertex_id.clone(),
            ));
        }

        Ok(graph)
    }
}
