//! The rescue item value type.

use std::collections::BTreeMap;

use evac_core::VertexId;

/// One candidate rescue trip: a set of room pickups bounded by carry
/// capacity, concrete entry/drop exits, and the stitched path between them.
///
/// Immutable once emitted by the optimizer; execution state lives in the
/// tactical coordinator's plan wrapper.
#[derive(Clone, Debug, PartialEq)]
pub struct RescueItem {
    /// How many incapable occupants to pick up per room.  Every entry is
    /// positive and within the observed supply at generation time.
    pub vector: BTreeMap<VertexId, u32>,
    /// Rooms in pickup order; exactly the keys of `vector`.
    pub visit_sequence: Vec<VertexId>,
    pub entry_exit: VertexId,
    pub drop_exit: VertexId,
    /// Concrete vertex sequence `[entry_exit, …, drop_exit]` over edges that
    /// existed at generation time.
    pub full_path: Vec<VertexId>,
    /// Traversal cost in metres, loaded legs doubled.
    pub time: f64,
    /// Priority-weighted value density (value per unit time).
    pub value: f64,
}

impl RescueItem {
    /// Total occupants this item rescues.
    #[inline]
    pub fn people(&self) -> u32 {
        self.vector.values().sum()
    }
}
