//! Vertex classification.

use serde::{Deserialize, Serialize};

/// What a graph vertex physically is.
///
/// Only `Room` vertices hold occupants, have area, and are targets of the
/// sweep and rescue planners.  `Exit` and `WindowExit` are the drop-off
/// points; everything else is connective tissue with zero area.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    Room,
    Hallway,
    Intersection,
    Stairwell,
    Exit,
    WindowExit,
}

impl VertexKind {
    /// `true` for both street-level and window exits.
    #[inline]
    pub fn is_exit(self) -> bool {
        matches!(self, VertexKind::Exit | VertexKind::WindowExit)
    }

    #[inline]
    pub fn is_room(self) -> bool {
        self == VertexKind::Room
    }
}
