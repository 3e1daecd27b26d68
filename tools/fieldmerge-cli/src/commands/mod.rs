pub mod check;
pub mod deinterlace;
pub mod merge;
pub mod preview;

use fieldmerge_common::config::{AppConfig, ChannelMode};
use fieldmerge_common::error::FieldMergeError;
use fieldmerge_core::{AlignmentOffset, FieldSlot, MergeSession};

use crate::MergeInputs;

/// Turn a core error into the `kind: message` line shown to the user.
pub fn surface(err: FieldMergeError) -> anyhow::Error {
    anyhow::anyhow!(err.report().to_string())
}

/// Load both fields into a session and merge them with the requested offset.
pub fn merged_session(config: &AppConfig, inputs: &MergeInputs) -> anyhow::Result<MergeSession> {
    let mut config = config.clone();
    if inputs.native_channels {
        config.merge.channel_mode = ChannelMode::Native;
    }
    let mut session = MergeSession::from_config(&config);

    let defaults = session.offset();
    let offset = AlignmentOffset::new(
        inputs.vertical.unwrap_or(defaults.vertical),
        inputs.horizontal.unwrap_or(defaults.horizontal),
    );
    if offset.clamped_to_ui() != offset {
        tracing::warn!(
            vertical = offset.vertical,
            horizontal = offset.horizontal,
            "Offset is outside the interactive slider range; applying it anyway"
        );
    }

    session
        .load_field(FieldSlot::A, &inputs.field_a)
        .map_err(surface)?;
    session
        .load_field(FieldSlot::B, &inputs.field_b)
        .map_err(surface)?;
    session.set_offset(offset).map_err(surface)?;

    println!("  Field A: {}", inputs.field_a.display());
    println!("  Field B: {}", inputs.field_b.display());
    println!(
        "  Offset: vertical {}, horizontal {}",
        offset.vertical, offset.horizontal
    );

    Ok(session)
}
