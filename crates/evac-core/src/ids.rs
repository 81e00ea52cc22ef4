//! Strongly typed, zero-cost identifier wrappers.
//!
//! All ids are dense arena indices: `VertexId(3)` is row 3 of every per-vertex
//! table in the building graph and the kernel.  The inner integer is `pub` so
//! hot paths can index directly, but callers should prefer the `.index()`
//! helper for clarity.

use std::fmt;

/// Generate a typed id wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid id" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized ids are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Index of a vertex (room, hallway, exit, …) in the building graph.
    pub struct VertexId(u32);
}

typed_id! {
    /// Index of an undirected corridor edge in the building graph.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Index of a responder (firefighter) in the simulation.
    pub struct ResponderId(u32);
}
