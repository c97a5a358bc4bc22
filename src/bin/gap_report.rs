use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::info;

use pausecut::{find_gaps, PausecutError, RetentionPolicy, SegmentPlanner, Transcript};

/// Inspect a persisted timestamp file: list the gaps a given threshold
/// would detect and the keep intervals the planner would produce.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pausecut=info,gap_report=info")
        .init();

    let matches = Command::new("gap-report")
        .about("Analyze a timestamps JSON file without cutting anything")
        .arg(
            Arg::new("timestamps")
                .value_name("FILE")
                .help("Path to a persisted timestamps JSON file")
                .required(true),
        )
        .arg(
            Arg::new("max-gap")
                .short('g')
                .long("max-gap")
                .value_name("SECONDS")
                .default_value("1.0"),
        )
        .arg(
            Arg::new("min-segment")
                .long("min-segment")
                .value_name("SECONDS")
                .default_value("0.01"),
        )
        .get_matches();

    let path = PathBuf::from(
        matches
            .get_one::<String>("timestamps")
            .expect("timestamps is a required argument"),
    );
    let max_gap: f64 = matches
        .get_one::<String>("max-gap")
        .expect("max-gap has a default")
        .parse()?;
    let min_segment: f64 = matches
        .get_one::<String>("min-segment")
        .expect("min-segment has a default")
        .parse()?;

    info!("📄 Loading timestamps from: {}", path.display());
    let transcript = Transcript::load(&path).await?;
    info!(
        "✅ {} words over {:.2}s of media",
        transcript.len(),
        transcript.duration()
    );

    let gaps = find_gaps(&transcript, max_gap)?;
    info!("🔎 {} gaps exceed {}s:", gaps.len(), max_gap);
    for (i, gap) in gaps.iter().enumerate() {
        info!(
            "   {:>3}. {:>8.2}s → {:>8.2}s  ({:.2}s)",
            i + 1,
            gap.start,
            gap.end,
            gap.duration()
        );
    }

    let planner = SegmentPlanner::new(max_gap, min_segment, RetentionPolicy::TrimExcess)?;
    match planner.plan(&transcript) {
        Ok(plan) => {
            let stats = plan.stats();
            info!("✂️  Plan keeps {} segments:", stats.segment_count);
            for (i, interval) in plan.intervals.iter().enumerate() {
                info!(
                    "   {:>3}. {:>8.2}s → {:>8.2}s  ({:.2}s)",
                    i + 1,
                    interval.start,
                    interval.end,
                    interval.duration()
                );
            }
            info!(
                "📊 Would keep {:.2}s, remove {:.2}s ({:.1}% of original)",
                stats.kept_seconds,
                stats.removed_seconds,
                stats.keep_ratio * 100.0
            );
        }
        Err(PausecutError::NoContentRemaining { gaps }) => {
            info!(
                "⚠️  Nothing would remain: {} gap(s) cover the whole video. Try a larger --max-gap.",
                gaps.len()
            );
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
