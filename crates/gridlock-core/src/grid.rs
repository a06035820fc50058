//! Grid metadata and coordinate validation.

use serde::Serialize;

use crate::error::GridError;
use crate::id::GridId;
use crate::Value;

/// Validated per-axis exclusive upper bounds of a grid.
///
/// Non-empty, every entry strictly positive. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dimensions(Vec<i64>);

impl Dimensions {
    /// Validate a raw dimensions list.
    ///
    /// Returns [`GridError::InvalidDimensions`] if the list is empty or
    /// any entry is zero or negative.
    pub fn new(dims: Vec<i64>) -> Result<Self, GridError> {
        if dims.is_empty() {
            return Err(GridError::InvalidDimensions {
                reason: "dimensions required".to_string(),
            });
        }
        if let Some((axis, d)) = dims.iter().enumerate().find(|(_, d)| **d <= 0) {
            return Err(GridError::InvalidDimensions {
                reason: format!("dimensions must be > 0 (axis {axis} is {d})"),
            });
        }
        Ok(Self(dims))
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Borrow the per-axis bounds.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Check that `coord` addresses a cell of this shape.
    ///
    /// Fails with [`GridError::DimensionMismatch`] on a wrong axis count
    /// and with [`GridError::OutOfBounds`] on the first component outside
    /// `[0, dims[axis])`. Pure; performs no I/O.
    pub fn validate_coord(&self, coord: &[i64]) -> Result<(), GridError> {
        if coord.len() != self.0.len() {
            return Err(GridError::DimensionMismatch {
                expected: self.0.len(),
                got: coord.len(),
            });
        }
        for (axis, (&value, &bound)) in coord.iter().zip(&self.0).enumerate() {
            if value < 0 || value >= bound {
                return Err(GridError::OutOfBounds { axis, value, bound });
            }
        }
        Ok(())
    }
}

/// An N-dimensional grid as stored by the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Globally unique identifier.
    pub id: GridId,
    /// Per-axis bounds.
    pub dimensions: Dimensions,
    /// Display-only default value; never enforced.
    pub default_value: Option<Value>,
}

impl Grid {
    /// Validate a coordinate against this grid's bounds.
    pub fn validate_coord(&self, coord: &[i64]) -> Result<(), GridError> {
        self.dimensions.validate_coord(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(dims: Vec<i64>) -> Grid {
        Grid {
            id: GridId::from("g_test"),
            dimensions: Dimensions::new(dims).unwrap(),
            default_value: None,
        }
    }

    #[test]
    fn rejects_empty_and_non_positive_dimensions() {
        assert!(matches!(
            Dimensions::new(vec![]),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Dimensions::new(vec![3, 0]),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Dimensions::new(vec![-2]),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn accepts_high_dimensional_shapes() {
        let d = Dimensions::new(vec![2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(d.ndim(), 6);
        assert!(d.validate_coord(&[1, 2, 3, 4, 5, 6]).is_ok());
    }

    #[test]
    fn bounds_are_exclusive_and_non_negative() {
        let g = grid(vec![3, 3]);
        assert!(g.validate_coord(&[0, 0]).is_ok());
        assert!(g.validate_coord(&[2, 2]).is_ok());
        assert_eq!(
            g.validate_coord(&[3, 0]),
            Err(GridError::OutOfBounds { axis: 0, value: 3, bound: 3 })
        );
        assert_eq!(
            g.validate_coord(&[-1, 0]),
            Err(GridError::OutOfBounds { axis: 0, value: -1, bound: 3 })
        );
        assert_eq!(
            g.validate_coord(&[0, 5]),
            Err(GridError::OutOfBounds { axis: 1, value: 5, bound: 3 })
        );
    }

    #[test]
    fn wrong_axis_count_is_mismatch() {
        let g = grid(vec![3, 3]);
        assert_eq!(
            g.validate_coord(&[0]),
            Err(GridError::DimensionMismatch { expected: 2, got: 1 })
        );
        assert_eq!(
            g.validate_coord(&[0, 0, 0]),
            Err(GridError::DimensionMismatch { expected: 2, got: 3 })
        );
    }
}
