//! Coordinate and dimension-list string codecs.
//!
//! A coordinate `[x, y, z]` is stored under the field name `"x:y:z"`.
//! The separator cannot occur inside a decimal integer, so the mapping
//! is collision-free across both values and axis counts.
//!
//! Both decoders share one segment rule: a segment is whatever
//! `i64::from_str` accepts, so an optional sign and leading zeros are
//! fine while surrounding whitespace is not.

use std::num::ParseIntError;

use smallvec::SmallVec;

use crate::error::GridError;
use crate::id::Coord;

/// Separator between coordinate components in a cell key.
pub const COORD_SEPARATOR: char = ':';

/// Separator between entries of a stored dimensions list.
pub const DIMENSION_SEPARATOR: char = ',';

/// Encode a coordinate as a cell key.
pub fn encode_coord(coord: &[i64]) -> String {
    let mut out = String::with_capacity(coord.len() * 4);
    for (i, c) in coord.iter().enumerate() {
        if i > 0 {
            out.push(COORD_SEPARATOR);
        }
        out.push_str(&c.to_string());
    }
    out
}

/// Decode a cell key back into a coordinate.
///
/// The empty key decodes to the empty coordinate. Any segment that is
/// not a decimal integer yields [`GridError::MalformedKey`].
pub fn decode_coord(key: &str) -> Result<Coord, GridError> {
    if key.is_empty() {
        return Ok(SmallVec::new());
    }
    key.split(COORD_SEPARATOR)
        .map(|segment| parse_segment(segment).map_err(|_| malformed(key)))
        .collect()
}

/// Encode a dimensions list for the grid metadata record.
pub fn encode_dimensions(dimensions: &[i64]) -> String {
    dimensions
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(&DIMENSION_SEPARATOR.to_string())
}

/// Decode a stored dimensions list. Empty segments are skipped.
pub fn decode_dimensions(raw: &str) -> Result<Vec<i64>, ParseIntError> {
    raw.split(DIMENSION_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(parse_segment)
        .collect()
}

fn parse_segment(segment: &str) -> Result<i64, ParseIntError> {
    segment.parse()
}

fn malformed(key: &str) -> GridError {
    GridError::MalformedKey {
        key: key.to_string(),
    }
}
