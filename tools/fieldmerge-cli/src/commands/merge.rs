//! Merge two fields and save the frame.

use std::path::PathBuf;

use fieldmerge_common::config::AppConfig;
use fieldmerge_common::error::FieldMergeError;
use fieldmerge_render_engine::deinterlace::DeinterlaceBridge;

use super::{merged_session, surface};
use crate::MergeInputs;

pub async fn run(
    config: &AppConfig,
    inputs: MergeInputs,
    output: PathBuf,
    deinterlace: bool,
) -> anyhow::Result<()> {
    println!("Merging fields");
    let session = merged_session(config, &inputs)?;

    let Some(frame) = session.merged() else {
        return Err(surface(FieldMergeError::missing_input(
            "No merged image to save",
        )));
    };
    println!(
        "  Frame: {}x{} ({} channels)",
        frame.width(),
        frame.height(),
        frame.channels()
    );

    if deinterlace {
        let bridge = DeinterlaceBridge::from_config(&config.deinterlace);
        println!("  Deinterlacing with {}...", bridge.backend_name());
        bridge
            .deinterlace_to(frame, &output)
            .await
            .map_err(surface)?;
        println!("Image deinterlaced and saved: {}", output.display());
    } else {
        session.save_merged(&output).map_err(surface)?;
        println!("Merged image saved: {}", output.display());
    }

    Ok(())
}
