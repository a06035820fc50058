//! Read-only projection of a claimed cell.

use serde::{Deserialize, Serialize};

use crate::id::Coord;
use crate::Value;

/// A claimed cell as returned by bulk listing.
///
/// Has no identity of its own; unclaimed cells are never listed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    /// Coordinate of the cell.
    pub coord: Coord,
    /// The claim payload.
    pub value: Value,
}
