//! Interactive merge session.
//!
//! Owns everything a front end would otherwise keep in globals: the two
//! loaded fields, the current alignment, the latest merged frame, and the
//! preview viewport. Every mutation that can fail leaves the previous state
//! intact.

use std::path::Path;

use fieldmerge_common::config::{AppConfig, ChannelMode};
use fieldmerge_common::error::{FieldMergeError, FieldMergeResult};
use image::RgbImage;

use crate::display::Viewport;
use crate::io::{load_field, save_frame};
use crate::merge::{merge_fields, AlignmentOffset};
use crate::raster::{Field, MergedFrame};

/// Which of the two inputs a field is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    /// Supplies the even rows.
    A,
    /// Supplies the odd rows.
    B,
}

#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    field_a: Option<Field>,
    field_b: Option<Field>,
    offset: AlignmentOffset,
    merged: Option<MergedFrame>,
    viewport: Viewport,
    channel_mode: ChannelMode,
}

impl MergeSession {
    pub fn new(channel_mode: ChannelMode) -> Self {
        Self {
            channel_mode,
            ..Self::default()
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            offset: AlignmentOffset::new(
                config.merge.vertical_shift,
                config.merge.horizontal_shift,
            ),
            viewport: Viewport::new(&config.display),
            channel_mode: config.merge.channel_mode,
            ..Self::default()
        }
    }

    /// Decode `path` into a slot and re-merge if both fields are present.
    ///
    /// A decode failure leaves the slot and the merged frame untouched. A
    /// successful load whose re-merge fails keeps the new field but returns
    /// the merge error; the previous merged frame stays in place.
    pub fn load_field(&mut self, slot: FieldSlot, path: &Path) -> FieldMergeResult<()> {
        let field = load_field(path, self.channel_mode)?;
        self.set_field(slot, field)
    }

    /// Install an already decoded field.
    pub fn set_field(&mut self, slot: FieldSlot, field: Field) -> FieldMergeResult<()> {
        match slot {
            FieldSlot::A => self.field_a = Some(field),
            FieldSlot::B => self.field_b = Some(field),
        }
        if self.has_both_fields() {
            self.remerge()?;
        }
        Ok(())
    }

    /// Change the alignment and recompute the merged frame.
    ///
    /// Without both fields loaded the offset is only stored.
    pub fn set_offset(&mut self, offset: AlignmentOffset) -> FieldMergeResult<()> {
        self.offset = offset;
        if self.has_both_fields() {
            self.remerge()?;
        }
        Ok(())
    }

    /// Recompute the merged frame from scratch.
    pub fn remerge(&mut self) -> FieldMergeResult<&MergedFrame> {
        let (Some(a), Some(b)) = (&self.field_a, &self.field_b) else {
            return Err(FieldMergeError::missing_input(
                "Both fields must be loaded before merging",
            ));
        };

        match merge_fields(a, b, self.offset) {
            Ok(frame) => Ok(self.merged.insert(frame)),
            Err(err) => {
                tracing::warn!(error = %err, "Merge rejected, keeping previous frame");
                Err(err)
            }
        }
    }

    /// Write the latest merged frame as PNG or JPEG.
    pub fn save_merged(&self, path: &Path) -> FieldMergeResult<()> {
        let frame = self
            .merged
            .as_ref()
            .ok_or_else(|| FieldMergeError::missing_input("No merged image to save"))?;
        save_frame(frame, path)
    }

    /// Compose the latest merged frame onto a preview canvas.
    pub fn render_view(&self, canvas_width: u32, canvas_height: u32) -> FieldMergeResult<RgbImage> {
        let frame = self
            .merged
            .as_ref()
            .ok_or_else(|| FieldMergeError::missing_input("No merged image to display"))?;
        self.viewport.compose(frame, canvas_width, canvas_height)
    }

    pub fn field(&self, slot: FieldSlot) -> Option<&Field> {
        match slot {
            FieldSlot::A => self.field_a.as_ref(),
            FieldSlot::B => self.field_b.as_ref(),
        }
    }

    pub fn has_both_fields(&self) -> bool {
        self.field_a.is_some() && self.field_b.is_some()
    }

    pub fn merged(&self) -> Option<&MergedFrame> {
        self.merged.as_ref()
    }

    pub fn offset(&self) -> AlignmentOffset {
        self.offset
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    fn field(width: u32, height: u32, value: u8) -> Raster {
        Raster::new(width, height, 3, vec![value; (width * height * 3) as usize]).unwrap()
    }

    #[test]
    fn test_merge_waits_for_both_fields() {
        let mut session = MergeSession::default();
        session.set_field(FieldSlot::A, field(4, 4, 1)).unwrap();
        assert!(session.merged().is_none());
        assert!(matches!(
            session.remerge(),
            Err(FieldMergeError::MissingInput { .. })
        ));

        session.set_field(FieldSlot::B, field(4, 4, 2)).unwrap();
        let merged = session.merged().unwrap();
        assert_eq!(merged.row(0)[0], 1);
        assert_eq!(merged.row(1)[0], 2);
    }

    #[test]
    fn test_offset_change_recomputes() {
        let mut session = MergeSession::default();
        let a = field(4, 4, 0);
        let b = Raster::new(4, 4, 1, (0..16).collect()).unwrap();
        let b3 = Raster::new(4, 4, 3, b.as_bytes().iter().flat_map(|&v| [v, v, v]).collect())
            .unwrap();
        session.set_field(FieldSlot::A, a).unwrap();
        session.set_field(FieldSlot::B, b3).unwrap();

        session.set_offset(AlignmentOffset::new(-1, 0)).unwrap();
        assert_eq!(session.offset(), AlignmentOffset::new(-1, 0));
        // Row 1 now sources field B row 0.
        assert_eq!(session.merged().unwrap().pixel(0, 1), Some(&[0u8, 0, 0][..]));
        assert_eq!(session.merged().unwrap().pixel(3, 1), Some(&[3u8, 3, 3][..]));
    }

    #[test]
    fn test_mismatch_keeps_previous_frame() {
        let mut session = MergeSession::default();
        session.set_field(FieldSlot::A, field(100, 100, 1)).unwrap();
        session.set_field(FieldSlot::B, field(100, 100, 2)).unwrap();
        let before = session.merged().cloned().unwrap();

        let err = session
            .set_field(FieldSlot::B, field(50, 100, 9))
            .unwrap_err();
        assert!(matches!(err, FieldMergeError::DimensionMismatch { .. }));
        assert_eq!(session.merged(), Some(&before));

        let err = session.set_offset(AlignmentOffset::new(2, 2)).unwrap_err();
        assert!(matches!(err, FieldMergeError::DimensionMismatch { .. }));
        assert_eq!(session.merged(), Some(&before));
    }

    #[test]
    fn test_failed_load_leaves_state_untouched() {
        let mut session = MergeSession::default();
        session.set_field(FieldSlot::A, field(4, 4, 1)).unwrap();
        session.set_field(FieldSlot::B, field(4, 4, 2)).unwrap();
        let before = session.merged().cloned();

        let err = session
            .load_field(FieldSlot::A, Path::new("/no/such/field.png"))
            .unwrap_err();
        assert!(matches!(err, FieldMergeError::Load { .. }));
        assert_eq!(session.field(FieldSlot::A), Some(&field(4, 4, 1)));
        assert_eq!(session.merged().cloned(), before);
    }

    #[test]
    fn test_save_without_merge_is_missing_input() {
        let session = MergeSession::default();
        let err = session.save_merged(Path::new("out.png")).unwrap_err();
        assert!(matches!(err, FieldMergeError::MissingInput { .. }));
    }

    #[test]
    fn test_from_config_applies_defaults() {
        let mut config = AppConfig::default();
        config.merge.vertical_shift = 2;
        config.merge.horizontal_shift = -3;
        config.merge.channel_mode = ChannelMode::Native;

        let session = MergeSession::from_config(&config);
        assert_eq!(session.offset(), AlignmentOffset::new(2, -3));
        assert_eq!(session.channel_mode(), ChannelMode::Native);
    }

    #[test]
    fn test_render_view_uses_viewport() {
        let mut session = MergeSession::default();
        session.set_field(FieldSlot::A, field(10, 10, 0)).unwrap();
        session.set_field(FieldSlot::B, field(10, 10, 0)).unwrap();
        session.viewport_mut().set_zoom(2.0);

        let canvas = session.render_view(40, 30).unwrap();
        assert_eq!(canvas.dimensions(), (40, 30));
        assert_eq!(canvas.get_pixel(19, 19).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(20, 20).0, [255, 255, 255]);
    }
}
