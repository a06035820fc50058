//! Core types and the coordinate codec for the Gridlock claim server.
//!
//! This is the leaf crate of the workspace. It defines the grid data
//! model shared by every other crate: grid identifiers, validated
//! dimensions, coordinates and their storage-key encoding, the live
//! event envelope, and the error taxonomy for grid operations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod codec;
pub mod error;
pub mod event;
pub mod grid;
pub mod id;

pub use cell::CellView;
pub use codec::{decode_coord, decode_dimensions, encode_coord, encode_dimensions};
pub use error::GridError;
pub use event::GridEvent;
pub use grid::{Dimensions, Grid};
pub use id::{Coord, GridId};

/// Arbitrary structured value carried by a claim or a grid default.
///
/// Passed through unchanged; the engine never interprets it.
pub type Value = serde_json::Value;
