use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::CutConfig;
use crate::planner::KeepInterval;

/// Video information extracted from file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub filename: String,
    /// Duration in seconds, from the container
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub format: String,
    pub file_size: u64,
    /// Number of audio streams in the container
    pub audio_streams: usize,
}

/// Probes media files and cuts keep intervals out of them using FFmpeg
#[derive(Debug, Clone)]
pub struct VideoEditor {
    config: CutConfig,
}

impl VideoEditor {
    pub fn new(config: CutConfig) -> Self {
        Self { config }
    }

    /// Extract video information using ffprobe
    pub async fn probe(&self, video_path: &Path) -> Result<VideoInfo> {
        let output = tokio::process::Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(video_path)
            .output()
            .await
            .context("failed to spawn ffprobe; is it installed?")?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed for {}", video_path.display()));
        }

        let json_str = String::from_utf8(output.stdout)?;
        let ffprobe_data: serde_json::Value = serde_json::from_str(&json_str)?;

        let format = &ffprobe_data["format"];
        let streams = ffprobe_data["streams"]
            .as_array()
            .ok_or_else(|| anyhow!("ffprobe output has no streams array"))?;

        let video_stream = streams
            .iter()
            .find(|s| s["codec_type"] == "video")
            .ok_or_else(|| anyhow!("No video stream found in {}", video_path.display()))?;

        let audio_streams = streams.iter().filter(|s| s["codec_type"] == "audio").count();

        let duration: f64 = format["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("ffprobe reported no duration for {}", video_path.display()))?;

        let file_size = tokio::fs::metadata(video_path).await?.len();

        let video_info = VideoInfo {
            path: video_path.to_path_buf(),
            filename: video_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            duration,
            width: video_stream["width"].as_u64().unwrap_or(0) as u32,
            height: video_stream["height"].as_u64().unwrap_or(0) as u32,
            fps: video_stream["r_frame_rate"]
                .as_str()
                .and_then(parse_frame_rate)
                .unwrap_or(0.0),
            format: format["format_name"].as_str().unwrap_or("unknown").to_string(),
            file_size,
            audio_streams,
        };

        info!(
            "📹 Analyzed video: {} ({}x{}, {:.1}fps, {:.1}s)",
            video_info.filename, video_info.width, video_info.height, video_info.fps, video_info.duration
        );

        Ok(video_info)
    }

    /// Cut the keep intervals out of the source and concatenate them into
    /// one continuous output, audio and video in sync.
    ///
    /// Runs a single ffmpeg pass with a select filter; setpts/asetpts
    /// re-derive continuous timestamps so the splices do not drift.
    pub async fn cut_segments(
        &self,
        video_path: &Path,
        intervals: &[KeepInterval],
        output_path: &Path,
    ) -> Result<()> {
        if intervals.is_empty() {
            return Err(anyhow!("no segments to cut"));
        }

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let filter_complex = build_select_filter(intervals);
        debug!("ffmpeg filter: {}", filter_complex);

        info!(
            "✂️  Cutting {} segments from {}",
            intervals.len(),
            video_path.display()
        );

        let output = tokio::process::Command::new("ffmpeg")
            .arg("-i")
            .arg(video_path)
            .args(["-filter_complex", &filter_complex])
            .args(["-map", "[outv]", "-map", "[outa]"])
            .args(["-c:v", &self.config.video_codec])
            .args(["-preset", &self.config.preset])
            .args(["-c:a", &self.config.audio_codec])
            .arg("-y")
            .arg(output_path)
            .output()
            .await
            .context("failed to spawn ffmpeg; is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(10)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(anyhow!(
                "ffmpeg failed with exit code {}:\n{}",
                output.status,
                tail
            ));
        }

        info!("✅ Output written: {}", output_path.display());
        Ok(())
    }
}

/// Build the select/aselect filter expression for one set of keep intervals
fn build_select_filter(intervals: &[KeepInterval]) -> String {
    let conditions: Vec<String> = intervals
        .iter()
        .map(|iv| format!("between(t,{},{})", iv.start, iv.end))
        .collect();
    // '+' is logical OR in ffmpeg expressions
    let select = conditions.join("+");

    format!(
        "[0:v]select='{select}',setpts=N/FRAME_RATE/TB[outv];\
         [0:a]aselect='{select}',asetpts=N/SR/TB[outa]"
    )
}

/// Parse ffprobe's "num/den" frame rate notation
fn parse_frame_rate(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den == 0.0 {
            return None;
        }
        Some(num / den)
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_filter_single_interval() {
        let intervals = vec![KeepInterval { start: 0.0, end: 2.5 }];
        let filter = build_select_filter(&intervals);

        assert!(filter.contains("[0:v]select='between(t,0,2.5)'"));
        assert!(filter.contains("[0:a]aselect='between(t,0,2.5)'"));
        assert!(filter.contains("setpts=N/FRAME_RATE/TB"));
        assert!(filter.contains("asetpts=N/SR/TB"));
    }

    #[test]
    fn test_select_filter_joins_with_plus() {
        let intervals = vec![
            KeepInterval { start: 0.0, end: 2.1 },
            KeepInterval { start: 4.9, end: 6.1 },
        ];
        let filter = build_select_filter(&intervals);

        assert!(filter.contains("between(t,0,2.1)+between(t,4.9,6.1)"));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("30000/1001").map(|f| (f * 100.0).round()), Some(2997.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
    }
}
