//! Grid identifiers and the [`Coord`] type alias.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Prefix carried by every generated grid identifier.
pub const GRID_ID_PREFIX: &str = "g_";

/// Number of hex characters following [`GRID_ID_PREFIX`] (64 random bits).
pub const GRID_ID_HEX_LEN: usize = 16;

/// Opaque, globally unique identifier of a grid.
///
/// Generated ids look like `g_3f9a0c1d22e4b7a8`. Lookups accept any
/// string: an id that was never generated simply resolves to
/// [`GridError::GridNotFound`](crate::GridError::GridNotFound).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(String);

impl GridId {
    /// Generate a fresh identifier from 64 bits of thread-local randomness.
    pub fn generate() -> Self {
        let bits: u64 = rand::random();
        Self(format!("{GRID_ID_PREFIX}{bits:0width$x}", width = GRID_ID_HEX_LEN))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key of the grid's metadata record.
    pub fn meta_key(&self) -> String {
        format!("grid:{}:meta", self.0)
    }

    /// Storage key of the grid's claimed-cell collection.
    pub fn cells_key(&self) -> String {
        format!("grid:{}:cells", self.0)
    }

    /// Name of the grid's broadcast topic.
    pub fn events_topic(&self) -> String {
        format!("grid:{}:events", self.0)
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GridId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<&str> for GridId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

/// A coordinate in an N-dimensional grid.
///
/// Uses `SmallVec<[i64; 4]>` to avoid heap allocation for grids up to
/// 4 axes. Components are signed so that negative request values reach
/// bounds validation instead of failing at deserialization.
pub type Coord = SmallVec<[i64; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_prefix_and_hex_body() {
        let id = GridId::generate();
        let body = id.as_str().strip_prefix(GRID_ID_PREFIX).unwrap();
        assert_eq!(body.len(), GRID_ID_HEX_LEN);
        assert!(body.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_ids_differ() {
        let a = GridId::generate();
        let b = GridId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn storage_names_are_derived_from_id() {
        let id = GridId::from("g_00ff");
        assert_eq!(id.meta_key(), "grid:g_00ff:meta");
        assert_eq!(id.cells_key(), "grid:g_00ff:cells");
        assert_eq!(id.events_topic(), "grid:g_00ff:events");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = GridId::from("g_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"g_abc\"");
    }
}
