//! Interlaced field merge.
//!
//! Even rows of the output come straight from field A. Odd rows come from
//! field B after a vertical wrap-around shift and a horizontal circular
//! rotation, which lets the user line up two fields that were captured with
//! a small spatial offset.

use std::ops::RangeInclusive;

use fieldmerge_common::error::{FieldMergeError, FieldMergeResult};
use serde::{Deserialize, Serialize};

use crate::raster::{Field, MergedFrame, Raster};

/// Integer alignment applied to field B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignmentOffset {
    /// Added to the row index before looking up field B (wraps around).
    pub vertical: i32,
    /// Positive values move pixels toward higher column indices (wraps around).
    pub horizontal: i32,
}

impl AlignmentOffset {
    /// Slider range for the vertical shift in the interactive shell.
    pub const VERTICAL_RANGE: RangeInclusive<i32> = -5..=5;

    /// Slider range for the horizontal shift in the interactive shell.
    pub const HORIZONTAL_RANGE: RangeInclusive<i32> = -10..=10;

    pub fn new(vertical: i32, horizontal: i32) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// Clamp both components to the interactive slider ranges.
    ///
    /// The merge itself accepts any offset; this only mirrors the UI bounds.
    pub fn clamped_to_ui(self) -> Self {
        Self {
            vertical: self
                .vertical
                .clamp(*Self::VERTICAL_RANGE.start(), *Self::VERTICAL_RANGE.end()),
            horizontal: self
                .horizontal
                .clamp(*Self::HORIZONTAL_RANGE.start(), *Self::HORIZONTAL_RANGE.end()),
        }
    }
}

/// Interleave two fields into one frame.
///
/// Fails with [`FieldMergeError::DimensionMismatch`] when the fields differ in
/// width, height, or channel count; no partial frame is produced.
pub fn merge_fields(
    field_a: &Field,
    field_b: &Field,
    offset: AlignmentOffset,
) -> FieldMergeResult<MergedFrame> {
    if field_a.shape() != field_b.shape() {
        return Err(FieldMergeError::DimensionMismatch {
            field_a: field_a.shape(),
            field_b: field_b.shape(),
        });
    }

    let mut merged = Raster::zeroed(field_a.shape())?;
    let rows = field_a.height() as i64;
    if rows == 0 || field_a.width() == 0 {
        return Ok(merged);
    }

    let channels = field_a.channels() as usize;
    for y in 0..field_a.height() {
        let out = merged.row_mut(y);
        if y % 2 == 0 {
            out.copy_from_slice(field_a.row(y));
        } else {
            let src = (y as i64 + offset.vertical as i64).rem_euclid(rows) as u32;
            out.copy_from_slice(field_b.row(src));
            rotate_row(out, channels, offset.horizontal as i64);
        }
    }

    tracing::debug!(
        shape = %field_a.shape(),
        vertical = offset.vertical,
        horizontal = offset.horizontal,
        "Merged fields"
    );

    Ok(merged)
}

/// Circularly rotate a row of interleaved pixels in place.
///
/// The pixel at column `c` ends up at column `(c + shift) mod width`.
pub fn rotate_row(row: &mut [u8], channels: usize, shift: i64) {
    if channels == 0 || row.is_empty() {
        return;
    }
    let width = (row.len() / channels) as i64;
    let pixels = shift.rem_euclid(width) as usize;
    row.rotate_right(pixels * channels);
}
