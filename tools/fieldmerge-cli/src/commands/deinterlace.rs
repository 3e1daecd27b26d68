//! Deinterlace an existing frame.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fieldmerge_common::config::AppConfig;
use fieldmerge_core::io::load_field;
use fieldmerge_render_engine::deinterlace::DeinterlaceBridge;
use fieldmerge_render_engine::worker::{DeinterlaceMessage, DeinterlaceTarget, DeinterlaceTask};

use super::surface;

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    output: PathBuf,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    println!("Deinterlacing: {}", input.display());

    let frame = load_field(&input, config.merge.channel_mode).map_err(surface)?;

    let mut deinterlace = config.deinterlace.clone();
    if timeout_secs.is_some() {
        deinterlace.timeout_secs = timeout_secs;
    }
    let bridge = Arc::new(DeinterlaceBridge::from_config(&deinterlace));
    if !bridge.is_available() {
        tracing::warn!(
            backend = bridge.backend_name(),
            "Deinterlace filter not found; the run will likely fail"
        );
    }

    let mut task = DeinterlaceTask::spawn(bridge, frame, DeinterlaceTarget::File(output));
    loop {
        match task.poll() {
            Some(DeinterlaceMessage::Started { backend }) => {
                println!("  Running {backend}...");
            }
            Some(DeinterlaceMessage::Saved { path }) => {
                println!("Image deinterlaced and saved: {}", path.display());
                return Ok(());
            }
            Some(DeinterlaceMessage::Complete { frame }) => {
                println!(
                    "Image deinterlaced: {}x{}",
                    frame.width(),
                    frame.height()
                );
                return Ok(());
            }
            Some(DeinterlaceMessage::Failed { report }) => {
                return Err(anyhow::anyhow!(report.to_string()));
            }
            None if task.is_finished() => {
                return Err(anyhow::anyhow!("Deinterlace worker stopped without a result"));
            }
            None => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
}
