use fieldmerge_core::merge::{merge_fields, rotate_row, AlignmentOffset};
use fieldmerge_core::raster::Raster;
use proptest::prelude::*;

fn field_pair() -> impl Strategy<Value = (Raster, Raster)> {
    (1u32..12, 1u32..12, 1u8..=4).prop_flat_map(|(w, h, c)| {
        let len = (w * h * c as u32) as usize;
        (
            proptest::collection::vec(any::<u8>(), len),
            proptest::collection::vec(any::<u8>(), len),
        )
            .prop_map(move |(a, b)| {
                (
                    Raster::new(w, h, c, a).unwrap(),
                    Raster::new(w, h, c, b).unwrap(),
                )
            })
    })
}

fn offset() -> impl Strategy<Value = AlignmentOffset> {
    (-5i32..=5, -10i32..=10).prop_map(|(v, h)| AlignmentOffset::new(v, h))
}

proptest! {
    #[test]
    fn merge_is_deterministic((a, b) in field_pair(), off in offset()) {
        let first = merge_fields(&a, &b, off).unwrap();
        let second = merge_fields(&a, &b, off).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn even_rows_match_field_a((a, b) in field_pair(), off in offset()) {
        let merged = merge_fields(&a, &b, off).unwrap();
        prop_assert_eq!(merged.shape(), a.shape());
        for y in (0..a.height()).step_by(2) {
            prop_assert_eq!(merged.row(y), a.row(y));
        }
    }

    #[test]
    fn zero_offset_odd_rows_match_field_b((a, b) in field_pair()) {
        let merged = merge_fields(&a, &b, AlignmentOffset::default()).unwrap();
        for y in (1..a.height()).step_by(2) {
            prop_assert_eq!(merged.row(y), b.row(y));
        }
    }

    #[test]
    fn odd_rows_are_shifted_rotated_field_b_rows((a, b) in field_pair(), off in offset()) {
        let merged = merge_fields(&a, &b, off).unwrap();
        let rows = a.height() as i64;
        let channels = a.channels() as usize;
        for y in (1..a.height()).step_by(2) {
            let src = (y as i64 + off.vertical as i64).rem_euclid(rows) as u32;
            let mut expected = b.row(src).to_vec();
            rotate_row(&mut expected, channels, off.horizontal as i64);
            prop_assert_eq!(merged.row(y), expected.as_slice());
        }
    }

    #[test]
    fn full_width_rotation_is_identity(row in proptest::collection::vec(any::<u8>(), 1..40), turns in -3i64..3) {
        let width = row.len() as i64;
        let mut rotated = row.clone();
        rotate_row(&mut rotated, 1, width * turns);
        prop_assert_eq!(rotated, row);
    }
}

#[test]
fn wraparound_example_four_rows() {
    let a = Raster::new(1, 4, 1, vec![0, 0, 0, 0]).unwrap();
    let b = Raster::new(1, 4, 1, vec![10, 11, 12, 13]).unwrap();

    let merged = merge_fields(&a, &b, AlignmentOffset::new(-1, 0)).unwrap();
    assert_eq!(merged.as_bytes(), &[0, 10, 0, 12]);
}

#[test]
fn rotation_example_shifts_toward_higher_columns() {
    let a = Raster::new(4, 2, 1, vec![0; 8]).unwrap();
    let b = Raster::new(4, 2, 1, vec![0, 0, 0, 0, 1, 2, 3, 4]).unwrap();

    let merged = merge_fields(&a, &b, AlignmentOffset::new(0, 1)).unwrap();
    assert_eq!(merged.row(1), &[4, 1, 2, 3]);
}
