//! Check the deinterlace filter setup.

use fieldmerge_common::config::{config_file_path, AppConfig};
use fieldmerge_render_engine::deinterlace::{FfmpegFilter, FilterBackend};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("FieldMerge System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let filter = FfmpegFilter::from_config(&config.deinterlace);
    let available = filter.is_available();
    if available {
        println!("[OK] Deinterlace program: {}", filter.program());
    } else {
        println!("[MISSING] Deinterlace program: {}", filter.program());
    }
    println!("     Filter graph: {}", filter.filter());
    match config.deinterlace.timeout_secs {
        Some(secs) => println!("     Timeout: {secs}s"),
        None => println!("     Timeout: none (waits until the filter exits)"),
    }

    println!();
    if available {
        println!("Merging and deinterlacing are available. FieldMerge is ready.");
    } else {
        println!("Merging works; install ffmpeg or set deinterlace.program to enable deinterlacing.");
    }

    Ok(())
}
