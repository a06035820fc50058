use gridlock_core::{decode_coord, encode_coord, Dimensions, GridError};
use proptest::prelude::*;

fn arb_shape() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..20, 1..6)
}

proptest! {
    /// Every in-bounds coordinate of a grid survives the storage key
    /// round trip and still validates afterwards.
    #[test]
    fn in_bounds_coords_roundtrip_through_keys(
        (dims, coord) in arb_shape().prop_flat_map(|dims| {
            let coord = dims.iter().map(|d| 0..*d).collect::<Vec<_>>();
            (Just(dims), coord)
        })
    ) {
        let shape = Dimensions::new(dims).unwrap();
        prop_assert!(shape.validate_coord(&coord).is_ok());
        let decoded = decode_coord(&encode_coord(&coord)).unwrap();
        prop_assert_eq!(decoded.as_slice(), coord.as_slice());
        prop_assert!(shape.validate_coord(&decoded).is_ok());
    }

    /// Pushing any single axis to its bound is rejected on that axis.
    #[test]
    fn component_at_bound_is_out_of_bounds(dims in arb_shape(), pick in any::<prop::sample::Index>()) {
        let axis = pick.index(dims.len());
        let mut coord = vec![0i64; dims.len()];
        coord[axis] = dims[axis];
        let shape = Dimensions::new(dims.clone()).unwrap();
        prop_assert_eq!(
            shape.validate_coord(&coord),
            Err(GridError::OutOfBounds { axis, value: dims[axis], bound: dims[axis] })
        );
    }
}
