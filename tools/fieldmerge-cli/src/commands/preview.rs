//! Render the preview canvas to an image file.

use std::path::PathBuf;

use fieldmerge_common::config::AppConfig;
use fieldmerge_core::io::{write_image, SaveFormat};

use super::{merged_session, surface};
use crate::MergeInputs;

/// Zoom, pan, and canvas size for a preview render.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub zoom: f64,
    pub pan: (i64, i64),
    pub center: bool,
    pub canvas: (u32, u32),
}

pub fn run(
    config: &AppConfig,
    inputs: MergeInputs,
    output: PathBuf,
    view: View,
) -> anyhow::Result<()> {
    let format = SaveFormat::from_path(&output).map_err(surface)?;

    println!("Rendering preview");
    let mut session = merged_session(config, &inputs)?;
    let (frame_w, frame_h) = match session.merged() {
        Some(frame) => (frame.width(), frame.height()),
        None => (0, 0),
    };

    let (canvas_w, canvas_h) = view.canvas;
    let viewport = session.viewport_mut();
    viewport.set_zoom(view.zoom);
    if view.center {
        viewport.center_on_canvas(canvas_w, canvas_h, frame_w, frame_h);
    } else {
        viewport.set_pan(view.pan.0, view.pan.1);
    }
    let zoom = viewport.zoom();
    let (pan_x, pan_y) = viewport.pan();

    let canvas = session.render_view(canvas_w, canvas_h).map_err(surface)?;
    write_image(&canvas.into(), &output, format).map_err(surface)?;

    println!("  Canvas: {canvas_w}x{canvas_h}, zoom {zoom:.2}, pan ({pan_x}, {pan_y})");
    println!("Preview saved: {}", output.display());
    Ok(())
}
