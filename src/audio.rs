use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::AudioConfig;

/// Extracts transcription-ready audio from video files
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    config: AudioConfig,
}

impl AudioExtractor {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Where the extracted audio for a video lands inside `work_dir`
    pub fn audio_output_path(&self, video_path: &Path, work_dir: &Path) -> PathBuf {
        let stem = video_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        work_dir.join(format!("{stem}.{}", self.config.target_format))
    }

    /// Extract audio from video with settings tuned for Whisper:
    /// 16-bit PCM, mono, 16 kHz.
    pub async fn extract_for_transcription(
        &self,
        video_path: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let audio_path = self.audio_output_path(video_path, work_dir);

        info!("🎵 Extracting audio for transcription: {}", video_path.display());

        tokio::fs::create_dir_all(work_dir).await?;

        let status = tokio::process::Command::new("ffmpeg")
            .arg("-i")
            .arg(video_path)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .args(["-ar", &self.config.target_sample_rate.to_string()])
            .args(["-ac", "1"])
            .args(["-f", &self.config.target_format])
            .arg("-y")
            .arg(&audio_path)
            .status()
            .await
            .context("failed to spawn ffmpeg; is it installed?")?;

        if !status.success() {
            return Err(anyhow!(
                "audio extraction failed for {}",
                video_path.display()
            ));
        }

        info!("✅ Audio extracted: {}", audio_path.display());
        Ok(audio_path)
    }

    /// Remove the extracted audio once transcription no longer needs it
    pub async fn cleanup(&self, audio_path: &Path) -> Result<()> {
        if !self.config.cleanup_temp_files {
            return Ok(());
        }
        if let Err(e) = tokio::fs::remove_file(audio_path).await {
            warn!("Failed to remove temp audio {}: {}", audio_path.display(), e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_audio_output_path() {
        let extractor = AudioExtractor::new(Config::default().audio);
        let path = extractor.audio_output_path(Path::new("/videos/talk.mp4"), Path::new("/tmp/work"));
        assert_eq!(path, PathBuf::from("/tmp/work/talk.wav"));
    }
}
