//! Preview adaptation: zooming and panning a merged frame onto a canvas.
//!
//! This is presentation only. The merge result is never modified; a scaled
//! copy is produced for every render.

use fieldmerge_common::config::DisplayConfig;
use fieldmerge_common::error::{FieldMergeError, FieldMergeResult};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::raster::Raster;

/// Canvas background behind the preview.
const CANVAS_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Zoom level and pan offset of the preview.
///
/// The pan offset is the canvas position (in pixels) of the scaled frame's
/// top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom: f64,
    zoom_step: f64,
    min_zoom: f64,
    pan_x: i64,
    pan_y: i64,
    #[serde(skip)]
    drag_anchor: Option<(i64, i64)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&DisplayConfig::default())
    }
}

impl Viewport {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            zoom: 1.0_f64.max(config.min_zoom),
            zoom_step: config.zoom_step,
            min_zoom: config.min_zoom,
            pan_x: 0,
            pan_y: 0,
            drag_anchor: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor; values below the minimum are raised to it.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_finite() {
            zoom.max(self.min_zoom)
        } else {
            self.min_zoom
        };
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step);
    }

    /// Apply a mouse wheel notch: positive deltas zoom in, negative zoom out.
    pub fn scroll(&mut self, delta: f64) {
        if delta > 0.0 {
            self.zoom_in();
        } else if delta < 0.0 {
            self.zoom_out();
        }
    }

    pub fn pan(&self) -> (i64, i64) {
        (self.pan_x, self.pan_y)
    }

    pub fn set_pan(&mut self, x: i64, y: i64) {
        self.pan_x = x;
        self.pan_y = y;
    }

    /// Remember where a drag gesture started.
    pub fn begin_drag(&mut self, x: i64, y: i64) {
        self.drag_anchor = Some((x, y));
    }

    /// Move the frame by the distance travelled since the last drag event.
    pub fn drag_to(&mut self, x: i64, y: i64) {
        let Some((last_x, last_y)) = self.drag_anchor else {
            return;
        };
        self.pan_x += x - last_x;
        self.pan_y += y - last_y;
        self.drag_anchor = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Size of a `width` x `height` frame at the current zoom, at least 1x1.
    ///
    /// Saturates at `u32::MAX` for extreme zoom levels.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            self.scaled_extent(width) as u32,
            self.scaled_extent(height) as u32,
        )
    }

    fn scaled_extent(&self, dim: u32) -> f64 {
        (dim as f64 * self.zoom).floor().max(1.0)
    }

    /// Place the scaled frame in the middle of the canvas.
    pub fn center_on_canvas(
        &mut self,
        canvas_width: u32,
        canvas_height: u32,
        image_width: u32,
        image_height: u32,
    ) {
        let (w, h) = self.scaled_size(image_width, image_height);
        self.pan_x = (canvas_width as i64 - w as i64).div_euclid(2);
        self.pan_y = (canvas_height as i64 - h as i64).div_euclid(2);
    }

    /// Resample the whole frame to the current zoom with a Lanczos filter.
    pub fn render(&self, frame: &Raster) -> FieldMergeResult<DynamicImage> {
        let image = frame.to_dynamic()?;
        let (w, h) = self.scaled_size(frame.width(), frame.height());
        if (w, h) == (frame.width(), frame.height()) {
            return Ok(image);
        }
        check_render_budget(w as u64, h as u64)?;
        Ok(image.resize_exact(w, h, FilterType::Lanczos3))
    }

    /// Render the frame at the current zoom and pan onto a white canvas.
    ///
    /// Only the source pixels that land on the canvas are resampled, so the
    /// cost follows the canvas size rather than the zoom level.
    pub fn compose(
        &self,
        frame: &Raster,
        canvas_width: u32,
        canvas_height: u32,
    ) -> FieldMergeResult<RgbImage> {
        let mut canvas = RgbImage::from_pixel(canvas_width, canvas_height, CANVAS_BACKGROUND);
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(canvas);
        }

        let columns = visible_span(
            self.pan_x,
            frame.width(),
            self.scaled_extent(frame.width()),
            canvas_width,
        );
        let rows = visible_span(
            self.pan_y,
            frame.height(),
            self.scaled_extent(frame.height()),
            canvas_height,
        );
        let (Some(columns), Some(rows)) = (columns, rows) else {
            return Ok(canvas);
        };
        check_render_budget(columns.scaled_len, rows.scaled_len)?;

        let visible = frame.to_dynamic()?.crop_imm(
            columns.src_start,
            rows.src_start,
            columns.src_len,
            rows.src_len,
        );
        let (w, h) = (columns.scaled_len as u32, rows.scaled_len as u32);
        let scaled = if (w, h) == (columns.src_len, rows.src_len) {
            visible.into_rgb8()
        } else {
            visible.resize_exact(w, h, FilterType::Lanczos3).into_rgb8()
        };
        imageops::overlay(&mut canvas, &scaled, columns.canvas_start, rows.canvas_start);
        Ok(canvas)
    }
}

/// Largest image the preview will resample, in pixels.
pub const MAX_RENDER_PIXELS: u64 = 1 << 26;

fn check_render_budget(width: u64, height: u64) -> FieldMergeResult<()> {
    if width.saturating_mul(height) > MAX_RENDER_PIXELS {
        return Err(FieldMergeError::unsupported(format!(
            "Preview of {width}x{height} pixels exceeds the render limit; lower the zoom"
        )));
    }
    Ok(())
}

/// One axis of the source region that is visible on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    src_start: u32,
    src_len: u32,
    canvas_start: i64,
    scaled_len: u64,
}

/// Map the canvas window `[0, canvas)` back onto source pixels along one axis.
///
/// `scaled` is the full scaled length of the frame and `pan` the canvas
/// position of its first pixel. Returns `None` when nothing is visible.
fn visible_span(pan: i64, src: u32, scaled: f64, canvas: u32) -> Option<Span> {
    let pan = pan as f64;
    let start = pan.max(0.0);
    let end = (pan + scaled).min(canvas as f64);
    if end <= start {
        return None;
    }

    let scale = scaled / src as f64;
    let src_start = (((start - pan) / scale).floor() as u32).min(src - 1);
    let src_end = (((end - pan) / scale).ceil() as u32).clamp(src_start + 1, src);

    let canvas_start = (pan + src_start as f64 * scale).floor();
    let canvas_end = (pan + src_end as f64 * scale).floor();
    Some(Span {
        src_start,
        src_len: src_end - src_start,
        canvas_start: canvas_start as i64,
        scaled_len: ((canvas_end - canvas_start) as u64).max(1),
    })
}
