//! Building graph representation and builder.
//!
//! All edges are undirected; an edge appears once in the edge table and in
//! both endpoints' adjacency lists.  Edge lengths are stored internally as
//! integer millimetres so Dijkstra can order its heap without floating-point
//! comparisons; the public API speaks metres.

use std::collections::HashMap;

use evac_core::{EdgeId, VertexId, VertexKind};

// ── Point ─────────────────────────────────────────────────────────────────────

/// 2-D floor-plan position in unit lengths.  The vertical dimension comes
/// from the vertex's floor number times the building's floor height.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

// ── Vertex ────────────────────────────────────────────────────────────────────

/// Static attributes of one vertex.  Runtime state (occupants, smoke, fire)
/// lives in the simulation kernel.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub kind: VertexKind,
    /// Floor number, 1-indexed.
    pub floor: i32,
    /// Floor-plan position, if the config provided one.
    pub position: Option<Point>,
    /// Floor area in m².  Forced to zero for non-room vertices: hallways and
    /// exits are connection points and hold no smoke volume.
    pub area_m2: f64,
    pub ceiling_m: f64,
    pub capacity: u32,
    /// Rescue priority weight; higher is more valuable.
    pub priority: u32,
    pub sweep_ticks: u32,
}

impl Vertex {
    /// Room volume in m³ (area × ceiling height).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.area_m2 * self.ceiling_m
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// Static attributes of one undirected corridor edge.
#[derive(Clone, Debug)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    /// Maximum people that can traverse this edge per tick.
    pub max_flow: u32,
    pub width_m: f64,
    /// Base probability of burning out, per second.
    pub base_burn_rate: f64,
    /// Traversal length in millimetres (config `unit_length` × 1000).
    pub length_mm: u32,
}

impl Edge {
    /// The endpoint that is not `v`.
    #[inline]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.a == v {
            self.b
        } else {
            self.a
        }
    }

    /// Traversal length in metres.
    #[inline]
    pub fn length_m(&self) -> f64 {
        self.length_mm as f64 / 1000.0
    }
}

// ── BuildingGraph ─────────────────────────────────────────────────────────────

/// The immutable building topology.
///
/// Construct via [`GraphBuilder`] or [`crate::BuildingConfig::build_graph`].
pub struct BuildingGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// `adjacency[v]` lists `(neighbor, edge)` pairs in insertion order.
    adjacency: Vec<Vec<(VertexId, EdgeId)>>,
    /// Config-file vertex names, indexed by `VertexId`.
    names: Vec<String>,
    name_index: HashMap<String, VertexId>,
}

impl BuildingGraph {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    #[inline]
    pub fn name(&self, id: VertexId) -> &str {
        &self.names[id.index()]
    }

    /// Resolve a config-file vertex name to its dense id.
    pub fn vertex_by_name(&self, name: &str) -> Option<VertexId> {
        self.name_index.get(name).copied()
    }

    /// `(neighbor, edge)` pairs of `v`, ignoring edge existence.
    #[inline]
    pub fn neighbors(&self, v: VertexId) -> &[(VertexId, EdgeId)] {
        &self.adjacency[v.index()]
    }

    /// Iterator over all vertex ids in ascending order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    /// Iterator over all edge ids in ascending order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    /// All room-kind vertices in id order.
    pub fn rooms(&self) -> Vec<VertexId> {
        self.vertex_ids()
            .filter(|&v| self.vertex(v).kind.is_room())
            .collect()
    }

    // ── Spatial ───────────────────────────────────────────────────────────

    /// 3-D Euclidean distance between two vertices in unit lengths, counting
    /// `floor_height_m` per floor of vertical separation.  `None` if either
    /// vertex lacks a floor-plan position.
    pub fn spatial_distance(&self, a: VertexId, b: VertexId, floor_height_m: f64) -> Option<f64> {
        let pa = self.vertex(a).position?;
        let pb = self.vertex(b).position?;
        let dx = pa.x - pb.x;
        let dy = pa.y - pb.y;
        let dz = (self.vertex(a).floor - self.vertex(b).floor).abs() as f64 * floor_height_m;
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }

    /// Midpoint of an edge: 2-D average of its endpoints plus the average
    /// floor.  `None` if either endpoint lacks a position.
    pub fn edge_midpoint(&self, e: EdgeId) -> Option<(Point, f64)> {
        let edge = self.edge(e);
        let pa = self.vertex(edge.a).position?;
        let pb = self.vertex(edge.b).position?;
        let mid = Point {
            x: (pa.x + pb.x) / 2.0,
            y: (pa.y + pb.y) / 2.0,
        };
        let floor = (self.vertex(edge.a).floor + self.vertex(edge.b).floor) as f64 / 2.0;
        Some((mid, floor))
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

/// Construct a [`BuildingGraph`] incrementally, then call [`build`](Self::build).
pub struct GraphBuilder {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    names: Vec<String>,
    name_index: HashMap<String, VertexId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            names: Vec::new(),
            name_index: HashMap::new(),
        }
    }

    /// Add a vertex and return its dense id (sequential from 0).
    ///
    /// Non-room vertices get their area forced to zero regardless of what the
    /// caller supplied.
    pub fn add_vertex(&mut self, name: impl Into<String>, mut vertex: Vertex) -> VertexId {
        if !vertex.kind.is_room() {
            vertex.area_m2 = 0.0;
        }
        let id = VertexId(self.vertices.len() as u32);
        let name = name.into();
        self.name_index.insert(name.clone(), id);
        self.names.push(name);
        self.vertices.push(vertex);
        id
    }

    /// Add an undirected edge between `a` and `b`.  `unit_length` is in
    /// metres (default 1.0 for horizontal corridors; stairwell edges usually
    /// configure more).
    pub fn add_edge(
        &mut self,
        a: VertexId,
        b: VertexId,
        max_flow: u32,
        width_m: f64,
        base_burn_rate: f64,
        unit_length: f64,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            a,
            b,
            max_flow,
            width_m,
            base_burn_rate,
            length_mm: (unit_length * 1000.0).round() as u32,
        });
        id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Consume the builder and produce a [`BuildingGraph`].
    pub fn build(self) -> BuildingGraph {
        let mut adjacency = vec![Vec::new(); self.vertices.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            let id = EdgeId(i as u32);
            adjacency[edge.a.index()].push((edge.b, id));
            adjacency[edge.b.index()].push((edge.a, id));
        }
        BuildingGraph {
            vertices: self.vertices,
            edges: self.edges,
            adjacency,
            names: self.names,
            name_index: self.name_index,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
