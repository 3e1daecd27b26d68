//! FieldMerge CLI — merge two interlaced fields into one frame.
//!
//! Usage:
//!   fieldmerge merge <A> <B> -o <OUT>      Merge fields and save the frame
//!   fieldmerge preview <A> <B> -o <OUT>    Render a zoomed/panned preview
//!   fieldmerge deinterlace <IN> -o <OUT>   Run the deinterlace filter on a frame
//!   fieldmerge check                       Check the deinterlace filter
//!   fieldmerge config                      Print the effective configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fieldmerge_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "fieldmerge",
    about = "Recombine two captured video fields into one interlaced frame",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Field inputs and alignment shared by merge and preview.
#[derive(Args, Debug, Clone)]
pub struct MergeInputs {
    /// Field supplying the even rows
    field_a: PathBuf,

    /// Field supplying the odd rows
    field_b: PathBuf,

    /// Vertical shift of field B rows (slider range -5..=5)
    #[arg(long, allow_hyphen_values = true)]
    vertical: Option<i32>,

    /// Horizontal rotation of field B rows (slider range -10..=10)
    #[arg(long, allow_hyphen_values = true)]
    horizontal: Option<i32>,

    /// Keep the decoded channel layout instead of converting to RGB
    #[arg(long)]
    native_channels: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two fields and save the frame
    Merge {
        #[command(flatten)]
        inputs: MergeInputs,

        /// Output file (.png, .jpg or .jpeg)
        #[arg(short, long)]
        output: PathBuf,

        /// Pass the merged frame through the deinterlace filter before saving
        #[arg(long)]
        deinterlace: bool,
    },

    /// Render the merged frame as it would appear on the preview canvas
    Preview {
        #[command(flatten)]
        inputs: MergeInputs,

        /// Output file (.png, .jpg or .jpeg)
        #[arg(short, long)]
        output: PathBuf,

        /// Zoom factor (minimum 0.1)
        #[arg(long, default_value = "1.0")]
        zoom: f64,

        /// Horizontal pan offset in canvas pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pan_x: i64,

        /// Vertical pan offset in canvas pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pan_y: i64,

        /// Center the frame on the canvas (ignores the pan offsets)
        #[arg(long)]
        center: bool,

        /// Canvas width (defaults to the configured canvas)
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height (defaults to the configured canvas)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Deinterlace an existing frame with the external filter
    Deinterlace {
        /// Frame to filter
        input: PathBuf,

        /// Output file (.png, .jpg or .jpeg)
        #[arg(short, long)]
        output: PathBuf,

        /// Give up after this many seconds (overrides the config)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Check that the deinterlace filter is available
    Check,

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    fieldmerge_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Merge {
            inputs,
            output,
            deinterlace,
        } => commands::merge::run(&config, inputs, output, deinterlace).await,
        Commands::Preview {
            inputs,
            output,
            zoom,
            pan_x,
            pan_y,
            center,
            width,
            height,
        } => commands::preview::run(
            &config,
            inputs,
            output,
            commands::preview::View {
                zoom,
                pan: (pan_x, pan_y),
                center,
                canvas: (
                    width.unwrap_or(config.display.canvas_width),
                    height.unwrap_or(config.display.canvas_height),
                ),
            },
        ),
        Commands::Deinterlace {
            input,
            output,
            timeout_secs,
        } => commands::deinterlace::run(&config, input, output, timeout_secs).await,
        Commands::Check => commands::check::run(&config),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
