use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::audio::AudioExtractor;
use crate::config::Config;
use crate::download::VideoDownloader;
use crate::planner::{CutStats, KeepInterval, SegmentPlanner};
use crate::transcript::{Transcript, Word};
use crate::transcription::WhisperTranscriber;
use crate::video::VideoEditor;

/// A usable local media file plus the duration its container reports
#[derive(Debug, Clone)]
pub struct AcquiredMedia {
    pub path: PathBuf,
    /// Container duration in seconds
    pub duration: f64,
}

/// Turns a URL or local path into a local media file
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    async fn acquire(&self, source: &str, output_dir: &Path) -> Result<AcquiredMedia>;
}

/// Produces word-level timestamps for a media file
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media_path: &Path, work_dir: &Path) -> Result<Vec<Word>>;
}

/// Cuts an ordered list of keep intervals out of a media file into one
/// continuous output
#[async_trait]
pub trait MediaCutter: Send + Sync {
    async fn cut(&self, source: &Path, intervals: &[KeepInterval], output: &Path) -> Result<()>;
}

/// Default acquirer: yt-dlp for URLs, pass-through for local files,
/// ffprobe for the duration
pub struct DefaultAcquirer {
    downloader: VideoDownloader,
    editor: VideoEditor,
    reuse_downloads: bool,
    output_suffix: String,
}

#[async_trait]
impl MediaAcquirer for DefaultAcquirer {
    async fn acquire(&self, source: &str, output_dir: &Path) -> Result<AcquiredMedia> {
        let path = if VideoDownloader::is_url(source) {
            let download_dir = output_dir.join("downloads");
            let existing = if self.reuse_downloads {
                self.downloader
                    .find_existing_download(&download_dir, &self.output_suffix)
                    .await?
            } else {
                None
            };
            match existing {
                Some(path) => {
                    info!("📼 Found existing video: {}", path.display());
                    path
                }
                None => self.downloader.download(source, &download_dir).await?,
            }
        } else {
            let path = PathBuf::from(source);
            if !path.exists() {
                return Err(anyhow!("video file not found: {}", path.display()));
            }
            info!("📼 Using local video: {}", path.display());
            path
        };

        let video_info = self.editor.probe(&path).await?;
        if video_info.audio_streams == 0 {
            return Err(anyhow!("{} has no audio stream to transcribe", path.display()));
        }

        Ok(AcquiredMedia {
            path,
            duration: video_info.duration,
        })
    }
}

/// Default transcriber: extract 16 kHz mono audio, run Whisper on it
pub struct DefaultTranscriber {
    extractor: AudioExtractor,
    whisper: WhisperTranscriber,
}

#[async_trait]
impl Transcriber for DefaultTranscriber {
    async fn transcribe(&self, media_path: &Path, work_dir: &Path) -> Result<Vec<Word>> {
        WhisperTranscriber::check_availability().await?;

        let audio_path = self
            .extractor
            .extract_for_transcription(media_path, work_dir)
            .await?;
        let words = self.whisper.transcribe_words(&audio_path, work_dir).await;
        self.extractor.cleanup(&audio_path).await?;
        words
    }
}

/// Default cutter: single-pass ffmpeg select filter
pub struct DefaultCutter {
    editor: VideoEditor,
}

#[async_trait]
impl MediaCutter for DefaultCutter {
    async fn cut(&self, source: &Path, intervals: &[KeepInterval], output: &Path) -> Result<()> {
        self.editor.cut_segments(source, intervals, output).await
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub word_count: usize,
    pub stats: CutStats,
    pub processing_time: Duration,
}

/// Sequential pause removal pipeline:
/// acquire → transcribe (or load persisted timestamps) → detect gaps →
/// plan segments → cut.
///
/// The collaborators sit behind traits so the planning core can be
/// exercised without touching yt-dlp, Whisper, or ffmpeg.
pub struct Pipeline {
    config: Config,
    acquirer: Box<dyn MediaAcquirer>,
    transcriber: Box<dyn Transcriber>,
    cutter: Box<dyn MediaCutter>,
    planner: SegmentPlanner,
}

impl Pipeline {
    /// Build a pipeline with the default external collaborators
    pub fn new(config: Config) -> Result<Self> {
        let editor = VideoEditor::new(config.cut.clone());

        let acquirer = DefaultAcquirer {
            downloader: VideoDownloader::new(config.acquisition.clone()),
            editor: editor.clone(),
            reuse_downloads: config.acquisition.reuse_downloads,
            output_suffix: config.output.suffix.clone(),
        };
        let transcriber = DefaultTranscriber {
            extractor: AudioExtractor::new(config.audio.clone()),
            whisper: WhisperTranscriber::new(config.transcription.clone()),
        };
        let cutter = DefaultCutter { editor };

        Self::with_collaborators(
            config,
            Box::new(acquirer),
            Box::new(transcriber),
            Box::new(cutter),
        )
    }

    /// Build a pipeline with custom collaborators (tests use this seam)
    pub fn with_collaborators(
        config: Config,
        acquirer: Box<dyn MediaAcquirer>,
        transcriber: Box<dyn Transcriber>,
        cutter: Box<dyn MediaCutter>,
    ) -> Result<Self> {
        let planner = SegmentPlanner::new(
            config.cut.max_gap,
            config.cut.min_segment,
            config.cut.retention,
        )?;

        Ok(Self {
            config,
            acquirer,
            transcriber,
            cutter,
            planner,
        })
    }

    /// Process one video end to end.
    ///
    /// `timestamp_override` forces a specific persisted timestamp file;
    /// otherwise a file persisted next to the media by a previous run is
    /// picked up automatically, and transcription only happens when neither
    /// exists.
    pub async fn run(&self, source: &str, timestamp_override: Option<&Path>) -> Result<PipelineReport> {
        let start_time = Instant::now();

        tokio::fs::create_dir_all(&self.config.output.base_dir).await?;

        let media = self
            .acquirer
            .acquire(source, &self.config.output.base_dir)
            .await
            .context("media acquisition failed")?;

        let work_dir = media
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output.base_dir.clone());
        let timestamp_file = self.timestamp_path(&media.path, &work_dir);

        let transcript = self
            .obtain_transcript(&media, &work_dir, &timestamp_file, timestamp_override)
            .await?;

        info!(
            "🔎 Analyzing gaps (max gap: {}s, policy: {})",
            self.planner.max_gap(),
            self.planner.retention()
        );
        let plan = self
            .planner
            .plan(&transcript)
            .context("cut planning failed")?;

        let stats = plan.stats();
        info!(
            "✂️  Removing {:.2}s of pauses from {:.2}s video ({} gaps, {} segments)",
            stats.removed_seconds, plan.duration, stats.gap_count, stats.segment_count
        );
        info!(
            "📊 Output will be {:.2}s ({:.1}% of original)",
            stats.kept_seconds,
            stats.keep_ratio * 100.0
        );

        if self.config.output.keep_intermediates {
            let plan_path = self.plan_path(&media.path, &work_dir);
            let json = serde_json::to_string_pretty(&plan)?;
            tokio::fs::write(&plan_path, json).await?;
            info!("💾 Cut plan saved to: {}", plan_path.display());
        }

        let output_path = self.output_path(&media.path);
        self.cutter
            .cut(&media.path, &plan.intervals, &output_path)
            .await
            .context("cutting failed")?;

        let report = PipelineReport {
            source_path: media.path,
            output_path,
            word_count: transcript.len(),
            stats,
            processing_time: start_time.elapsed(),
        };

        info!(
            "🎉 Done in {:.1}s: {}",
            report.processing_time.as_secs_f64(),
            report.output_path.display()
        );

        Ok(report)
    }

    /// Load persisted timestamps when available, transcribe otherwise
    async fn obtain_transcript(
        &self,
        media: &AcquiredMedia,
        work_dir: &Path,
        timestamp_file: &Path,
        timestamp_override: Option<&Path>,
    ) -> Result<Transcript> {
        if let Some(path) = timestamp_override {
            info!("📄 Loading timestamps from: {}", path.display());
            return Ok(Transcript::load(path).await?);
        }

        if timestamp_file.exists() {
            info!("📄 Found existing timestamps: {}", timestamp_file.display());
            let transcript = Transcript::load(timestamp_file).await?;
            info!("✅ Loaded {} words", transcript.len());
            return Ok(transcript);
        }

        info!("🎤 Transcribing (no timestamp file at {})", timestamp_file.display());
        let words = self
            .transcriber
            .transcribe(&media.path, work_dir)
            .await
            .context("transcription failed")?;
        info!("✅ Extracted {} words", words.len());

        let transcript = Transcript::new(words, media.duration)?;
        transcript.save(timestamp_file).await?;
        info!("💾 Saved timestamps to: {}", timestamp_file.display());

        Ok(transcript)
    }

    fn timestamp_path(&self, media_path: &Path, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}_timestamps.json", stem_of(media_path)))
    }

    fn plan_path(&self, media_path: &Path, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}_plan.json", stem_of(media_path)))
    }

    fn output_path(&self, media_path: &Path) -> PathBuf {
        self.config.output.base_dir.join(format!(
            "{}{}.mp4",
            stem_of(media_path),
            self.config.output.suffix
        ))
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn pipeline_with_defaults() -> Pipeline {
        let config = ConfigBuilder::new()
            .with_output_dir(PathBuf::from("/tmp/out"))
            .build();
        Pipeline::new(config).unwrap()
    }

    #[test]
    fn test_output_path_uses_suffix() {
        let pipeline = pipeline_with_defaults();
        let output = pipeline.output_path(Path::new("/videos/talk.webm"));
        assert_eq!(output, PathBuf::from("/tmp/out/talk_pausecut.mp4"));
    }

    #[test]
    fn test_timestamp_path_sits_next_to_media() {
        let pipeline = pipeline_with_defaults();
        let path = pipeline.timestamp_path(Path::new("/videos/talk.mp4"), Path::new("/videos"));
        assert_eq!(path, PathBuf::from("/videos/talk_timestamps.json"));
    }

    #[test]
    fn test_invalid_max_gap_fails_at_construction() {
        let config = ConfigBuilder::new().with_max_gap(-1.0).build();
        assert!(Pipeline::new(config).is_err());
    }
}
