use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{info, warn};

mod audio;
mod config;
mod download;
mod error;
mod gaps;
mod pipeline;
mod planner;
mod transcript;
mod transcription;
mod video;

use crate::config::{Config, KNOWN_MODELS};
use crate::pipeline::Pipeline;
use crate::planner::RetentionPolicy;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("pausecut")
        .version("0.1.0")
        .about("Remove dead air from spoken-word videos")
        .arg(
            Arg::new("input")
                .value_name("URL_OR_PATH")
                .help("Video URL (downloaded with yt-dlp) or local file path")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory")
                .default_value("./output"),
        )
        .arg(
            Arg::new("max-gap")
                .short('g')
                .long("max-gap")
                .value_name("SECONDS")
                .help("Maximum silence duration allowed to remain uncut"),
        )
        .arg(
            Arg::new("min-segment")
                .long("min-segment")
                .value_name("SECONDS")
                .help("Minimum keep-segment duration / merge epsilon"),
        )
        .arg(
            Arg::new("retention-policy")
                .long("retention-policy")
                .value_name("POLICY")
                .help("trim-excess keeps max-gap seconds of silence at each cut; remove-all splices speech tight"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Whisper model to use")
                .value_parser(clap::builder::PossibleValuesParser::new(
                    KNOWN_MODELS.iter().copied(),
                )),
        )
        .arg(
            Arg::new("use-timestamps")
                .long("use-timestamps")
                .value_name("FILE")
                .help("Use an existing timestamps JSON file instead of transcribing"),
        )
        .arg(
            Arg::new("no-cleanup")
                .long("no-cleanup")
                .help("Keep intermediate files (extracted audio, cut plan)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let env_filter = if verbose {
        "pausecut=debug"
    } else {
        "pausecut=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Load configuration, then let CLI flags override it
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(output_dir) = matches.get_one::<String>("output-dir") {
        config.output.base_dir = PathBuf::from(output_dir);
    }
    if let Some(max_gap) = matches.get_one::<String>("max-gap") {
        config.cut.max_gap = max_gap.parse()?;
    }
    if let Some(min_segment) = matches.get_one::<String>("min-segment") {
        config.cut.min_segment = min_segment.parse()?;
    }
    if let Some(policy) = matches.get_one::<String>("retention-policy") {
        config.cut.retention = policy.parse::<RetentionPolicy>()?;
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.transcription.model = model.clone();
    }
    if matches.get_flag("no-cleanup") {
        config.output.keep_intermediates = true;
        config.audio.cleanup_temp_files = false;
    }

    config.validate()?;

    let input = matches
        .get_one::<String>("input")
        .expect("input is a required argument");
    let timestamp_override = matches.get_one::<String>("use-timestamps").map(PathBuf::from);

    info!("🚀 pausecut starting...");
    info!("🎬 Input: {}", input);
    info!("📂 Output directory: {}", config.output.base_dir.display());
    info!("⏱️  Max gap: {}s ({})", config.cut.max_gap, config.cut.retention);

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(input, timestamp_override.as_deref()).await?;

    info!(
        "✅ Removed {:.2}s of pauses ({} words, {} segments kept)",
        report.stats.removed_seconds, report.word_count, report.stats.segment_count
    );
    info!("📼 Output saved to: {}", report.output_path.display());

    Ok(())
}
