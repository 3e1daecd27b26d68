//! Fake filter backends for tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use fieldmerge_core::raster::Raster;

use crate::deinterlace::FilterBackend;

/// Runs `sh -c <script> sh <input> <output>` and records every input path.
pub(crate) struct ShellFilter {
    script: String,
    inputs: Mutex<Vec<PathBuf>>,
}

impl ShellFilter {
    pub(crate) fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn seen_inputs(&self) -> Vec<PathBuf> {
        self.inputs.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl FilterBackend for ShellFilter {
    fn name(&self) -> &str {
        "sh"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.to_path_buf());
        }
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.script).arg("sh").arg(input).arg(output);
        cmd
    }
}

/// RGB gradient frame with distinct rows and columns.
pub(crate) fn sample_frame(width: u32, height: u32) -> Raster {
    let data = (0..height)
        .flat_map(|y| (0..width).flat_map(move |x| [(x * 17) as u8, (y * 29) as u8, 128]))
        .collect();
    Raster::new(width, height, 3, data).unwrap()
}
