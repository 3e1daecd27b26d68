//! Deinterlace bridge.
//!
//! The merged frame is written to a uniquely named temporary PNG, handed to
//! an external filter process running an adaptive deinterlace filter graph,
//! and the filter's output is read back. Temporary files are owned by RAII
//! guards, so they are removed on every exit path.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use fieldmerge_common::config::{ChannelMode, DeinterlaceConfig};
use fieldmerge_common::error::{FieldMergeError, FieldMergeResult};
use fieldmerge_core::io::{save_frame, SaveFormat};
use fieldmerge_core::raster::{MergedFrame, Raster};
use image::ImageReader;
use tempfile::{NamedTempFile, TempDir};

/// An external program that can deinterlace a single image file.
pub trait FilterBackend: Send + Sync {
    /// Backend name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Build the command that reads `input` and writes the filtered image to `output`.
    fn command(&self, input: &Path, output: &Path) -> Command;
}

impl<T: FilterBackend + ?Sized> FilterBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        (**self).command(input, output)
    }
}

/// ffmpeg with a single video filter, `yadif` by default.
#[derive(Debug, Clone)]
pub struct FfmpegFilter {
    program: String,
    filter: String,
}

impl FfmpegFilter {
    pub fn new(program: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            filter: filter.into(),
        }
    }

    pub fn from_config(config: &DeinterlaceConfig) -> Self {
        Self::new(&config.program, &config.filter)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl Default for FfmpegFilter {
    fn default() -> Self {
        Self::from_config(&DeinterlaceConfig::default())
    }
}

impl FilterBackend for FfmpegFilter {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        let path = Path::new(&self.program);
        if path.components().count() > 1 {
            return path.is_file();
        }
        command_exists(&self.program)
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-vf", &self.filter])
            .arg(output);
        cmd
    }
}

/// Runs a [`FilterBackend`] on merged frames.
pub struct DeinterlaceBridge {
    backend: Box<dyn FilterBackend>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for DeinterlaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeinterlaceBridge")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeinterlaceBridge {
    /// Bridge without a timeout: the filter runs until it exits.
    pub fn new(backend: impl FilterBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            timeout: None,
        }
    }

    pub fn from_config(config: &DeinterlaceConfig) -> Self {
        Self::new(FfmpegFilter::from_config(config))
            .with_timeout(config.timeout_secs.map(Duration::from_secs))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Deinterlace `frame` and return the filtered image.
    ///
    /// The result keeps the channel layout of the input where the filter
    /// output allows it.
    pub async fn deinterlace(&self, frame: &MergedFrame) -> FieldMergeResult<MergedFrame> {
        let input = write_temp_input(frame)?;
        let out_dir: TempDir = tempfile::Builder::new()
            .prefix("fieldmerge-out-")
            .tempdir()
            .map_err(|e| {
                FieldMergeError::external_filter(
                    format!("Failed to create output directory: {e}"),
                    "",
                )
            })?;
        let output_path = out_dir.path().join("deinterlaced.png");

        self.run_filter(input.path(), &output_path).await?;

        let image = ImageReader::open(&output_path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                FieldMergeError::external_filter(format!("Failed to read filter output: {e}"), "")
            })?
            .decode()
            .map_err(|e| {
                FieldMergeError::external_filter(format!("Failed to decode filter output: {e}"), "")
            })?;

        let mode = if frame.channels() == 3 {
            ChannelMode::Rgb
        } else {
            ChannelMode::Native
        };
        let result = Raster::from_dynamic(image, mode);
        tracing::info!(
            backend = self.backend.name(),
            shape = %result.shape(),
            "Deinterlace finished"
        );
        Ok(result)
    }

    /// Deinterlace `frame` straight into `output_path` (PNG or JPEG by extension).
    pub async fn deinterlace_to(
        &self,
        frame: &MergedFrame,
        output_path: &Path,
    ) -> FieldMergeResult<PathBuf> {
        let format = SaveFormat::from_path(output_path)?;
        let parent = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(|e| FieldMergeError::save(output_path, e.to_string()))?;

        // The filter writes next to the destination, which is only replaced
        // once a fresh file exists.
        let staging = tempfile::Builder::new()
            .prefix(".fieldmerge-out-")
            .tempdir_in(parent)
            .map_err(|e| FieldMergeError::save(output_path, e.to_string()))?;
        let staged = staging
            .path()
            .join(format!("deinterlaced.{}", format.extension()));

        let input = write_temp_input(frame)?;
        self.run_filter(input.path(), &staged).await?;
        std::fs::rename(&staged, output_path)
            .map_err(|e| FieldMergeError::save(output_path, e.to_string()))?;

        tracing::info!(
            backend = self.backend.name(),
            output = %output_path.display(),
            "Deinterlaced image saved"
        );
        Ok(output_path.to_path_buf())
    }

    async fn run_filter(&self, input: &Path, output: &Path) -> FieldMergeResult<()> {
        let name = self.backend.name().to_string();
        let mut cmd = tokio::process::Command::from(self.backend.command(input, output));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            backend = %name,
            input = %input.display(),
            output = %output.display(),
            "Running deinterlace filter"
        );
        let started = std::time::Instant::now();
        let child = cmd.spawn().map_err(|e| {
            FieldMergeError::external_filter(format!("Failed to start {name}: {e}"), "")
        })?;
        tracing::info!(pid = child.id(), backend = %name, "Deinterlace filter started");

        let wait = child.wait_with_output();
        let result = match self.timeout {
            // Dropping the future on timeout drops the child, which kills it.
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                FieldMergeError::external_filter(
                    format!("{name} did not finish within {}s", limit.as_secs_f64()),
                    "",
                )
            })?,
            None => wait.await,
        };
        let output_status = result.map_err(|e| {
            FieldMergeError::external_filter(format!("Failed to wait on {name}: {e}"), "")
        })?;

        let stderr = String::from_utf8_lossy(&output_status.stderr)
            .trim()
            .to_string();

        if !output_status.status.success() {
            tracing::warn!(
                backend = %name,
                status = %output_status.status,
                "Deinterlace filter failed"
            );
            return Err(FieldMergeError::external_filter(
                format!("{name} exited with {}", output_status.status),
                stderr,
            ));
        }

        if !output.is_file() {
            return Err(FieldMergeError::external_filter(
                format!("{name} reported success but wrote no output"),
                stderr,
            ));
        }

        tracing::debug!(
            backend = %name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Deinterlace filter exited cleanly"
        );
        Ok(())
    }
}

/// Write the frame to a fresh temporary PNG; the file is deleted when the guard drops.
fn write_temp_input(frame: &MergedFrame) -> FieldMergeResult<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("fieldmerge-field-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| {
            FieldMergeError::external_filter(format!("Failed to create temporary input: {e}"), "")
        })?;

    save_frame(frame, file.path()).map_err(|e| {
        FieldMergeError::external_filter(format!("Failed to write temporary input: {e}"), "")
    })?;
    Ok(file)
}

/// Look `binary` up on `PATH`. The name is passed as an argument, never as shell code.
fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .args(["-c", r#"command -v "$1" >/dev/null 2>&1"#, "sh"])
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_frame, ShellFilter};
    use fieldmerge_common::error::ErrorKind;
    use std::sync::Arc;

    #[test]
    fn test_ffmpeg_command_line() {
        let filter = FfmpegFilter::default();
        let cmd = filter.command(Path::new("/tmp/in.png"), Path::new("/tmp/out.png"));
        assert_eq!(cmd.get_program(), "ffmpeg");
        let args: Vec<_> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-y",
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "/tmp/in.png",
                "-vf",
                "yadif",
                "/tmp/out.png"
            ]
        );
    }

    #[test]
    fn test_from_config_uses_program_filter_and_timeout() {
        let config = DeinterlaceConfig {
            program: "/opt/ffmpeg/bin/ffmpeg".to_string(),
            filter: "bwdif".to_string(),
            timeout_secs: Some(12),
        };
        let bridge = DeinterlaceBridge::from_config(&config);
        assert_eq!(bridge.backend_name(), "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(bridge.timeout(), Some(Duration::from_secs(12)));
        assert!(!bridge.is_available());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_filter_keeps_dimensions() {
        let filter = Arc::new(ShellFilter::new(r#"cp "$1" "$2""#));
        let bridge = DeinterlaceBridge::new(Arc::clone(&filter));
        let frame = sample_frame(12, 8);

        let result = bridge.deinterlace(&frame).await.unwrap();
        assert_eq!(result.shape(), frame.shape());
        assert_eq!(result, frame);

        for input in filter.seen_inputs() {
            assert!(!input.exists(), "temporary input {input:?} was not removed");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr_and_cleans_up() {
        let filter = Arc::new(ShellFilter::new(
            r#"echo "yadif: something broke" >&2; exit 3"#,
        ));
        let bridge = DeinterlaceBridge::new(Arc::clone(&filter));

        let err = bridge.deinterlace(&sample_frame(4, 4)).await.unwrap_err();
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::ExternalFilter);
        assert_eq!(report.diagnostics.as_deref(), Some("yadif: something broke"));

        let inputs = filter.seen_inputs();
        assert_eq!(inputs.len(), 1);
        assert!(!inputs[0].exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_output_is_filter_error() {
        let bridge = DeinterlaceBridge::new(ShellFilter::new("exit 0"));
        let err = bridge.deinterlace(&sample_frame(4, 4)).await.unwrap_err();
        assert!(matches!(err, FieldMergeError::ExternalFilter { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_output_is_filter_error() {
        let bridge = DeinterlaceBridge::new(ShellFilter::new(r#"echo garbage > "$2""#));
        let err = bridge.deinterlace(&sample_frame(4, 4)).await.unwrap_err();
        assert!(matches!(err, FieldMergeError::ExternalFilter { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_filter() {
        let filter = Arc::new(ShellFilter::new("sleep 5"));
        let bridge = DeinterlaceBridge::new(Arc::clone(&filter))
            .with_timeout(Some(Duration::from_millis(200)));

        let started = std::time::Instant::now();
        let err = bridge.deinterlace(&sample_frame(4, 4)).await.unwrap_err();
        assert!(matches!(err, FieldMergeError::ExternalFilter { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(filter.seen_inputs().iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_unknown_program_is_filter_error() {
        let bridge = DeinterlaceBridge::new(FfmpegFilter::new(
            "fieldmerge-no-such-filter-binary",
            "yadif",
        ));
        let err = bridge.deinterlace(&sample_frame(4, 4)).await.unwrap_err();
        assert!(matches!(err, FieldMergeError::ExternalFilter { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deinterlace_to_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("exports").join("frame.png");
        let bridge = DeinterlaceBridge::new(ShellFilter::new(r#"cp "$1" "$2""#));

        let written = bridge
            .deinterlace_to(&sample_frame(6, 6), &output)
            .await
            .unwrap();
        assert_eq!(written, output);
        assert!(output.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deinterlace_to_does_not_trust_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frame.png");
        std::fs::write(&output, "old contents").unwrap();
        let bridge = DeinterlaceBridge::new(ShellFilter::new("exit 0"));

        let err = bridge
            .deinterlace_to(&sample_frame(4, 4), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, FieldMergeError::ExternalFilter { .. }));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "old contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deinterlace_to_replaces_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frame.png");
        std::fs::write(&output, "old contents").unwrap();
        let bridge = DeinterlaceBridge::new(ShellFilter::new(r#"cp "$1" "$2""#));

        bridge
            .deinterlace_to(&sample_frame(4, 4), &output)
            .await
            .unwrap();
        let reloaded = image::open(&output).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (4, 4));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_lookup_treats_name_as_data() {
        assert!(!FfmpegFilter::new("fieldmerge-no-such-tool; exit 0", "yadif").is_available());
        assert!(!FfmpegFilter::new("fieldmerge-no-such-tool || true", "yadif").is_available());
        assert!(FfmpegFilter::new("sh", "yadif").is_available());
    }

    #[tokio::test]
    async fn test_deinterlace_to_rejects_unknown_extension() {
        let bridge = DeinterlaceBridge::new(ShellFilter::new("exit 0"));
        let err = bridge
            .deinterlace_to(&sample_frame(2, 2), Path::new("frame.tiff"))
            .await
            .unwrap_err();
        assert!(matches!(err, FieldMergeError::Save { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_concurrent_runs_use_distinct_temp_files() {
        let filter = Arc::new(ShellFilter::new(r#"cp "$1" "$2""#));
        let bridge = DeinterlaceBridge::new(Arc::clone(&filter));
        let a = sample_frame(4, 4);
        let b = sample_frame(6, 2);

        let (ra, rb) = tokio::join!(bridge.deinterlace(&a), bridge.deinterlace(&b));
        assert_eq!(ra.unwrap(), a);
        assert_eq!(rb.unwrap(), b);

        let inputs = filter.seen_inputs();
        assert_eq!(inputs.len(), 2);
        assert_ne!(inputs[0], inputs[1]);
    }
}
