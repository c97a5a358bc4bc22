use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::config::AcquisitionConfig;

/// Downloads remote videos with yt-dlp and locates previous downloads
#[derive(Debug, Clone)]
pub struct VideoDownloader {
    config: AcquisitionConfig,
}

impl VideoDownloader {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self { config }
    }

    /// Whether the input names a remote video rather than a local file
    pub fn is_url(input: &str) -> bool {
        match Url::parse(input) {
            Ok(url) => matches!(url.scheme(), "http" | "https"),
            Err(_) => false,
        }
    }

    /// Download a video, letting yt-dlp name the file after the title.
    ///
    /// yt-dlp prints the final path itself via `--print after_move:filepath`,
    /// which survives its own extension corrections.
    pub async fn download(&self, url: &str, download_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(download_dir).await?;

        let output_template = download_dir.join("%(title)s [%(id)s].%(ext)s");

        info!("⬇️  Downloading video from: {}", url);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["-f", &self.config.format])
            .arg("-o")
            .arg(&output_template)
            .args(["--print", "after_move:filepath"])
            .arg("--no-simulate")
            .arg(url)
            .output()
            .await
            .context("failed to spawn yt-dlp; is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "yt-dlp failed with exit code {}:\n{}",
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let downloaded_path = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| PathBuf::from(line.trim()))
            .ok_or_else(|| anyhow!("yt-dlp did not report a downloaded file path"))?;

        if !downloaded_path.exists() {
            return Err(anyhow!(
                "yt-dlp reported {} but the file does not exist",
                downloaded_path.display()
            ));
        }

        info!("✅ Downloaded to: {}", downloaded_path.display());
        Ok(downloaded_path)
    }

    /// Look for a video downloaded by a previous run, skipping files that
    /// carry the output suffix (those are results, not sources).
    pub async fn find_existing_download(
        &self,
        download_dir: &Path,
        output_suffix: &str,
    ) -> Result<Option<PathBuf>> {
        if !download_dir.exists() {
            return Ok(None);
        }

        let mut candidates = Vec::new();
        let mut entries = tokio::fs::read_dir(download_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let extension_ok = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    self.config
                        .supported_extensions
                        .iter()
                        .any(|supported| supported.eq_ignore_ascii_case(ext))
                })
                .unwrap_or(false);

            let is_output = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.contains(output_suffix))
                .unwrap_or(false);

            if extension_ok && !is_output {
                candidates.push(path);
            }
        }

        candidates.sort();
        if let Some(found) = candidates.first() {
            debug!("found existing download: {}", found.display());
        }
        Ok(candidates.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_url_detection() {
        assert!(VideoDownloader::is_url("https://www.youtube.com/watch?v=abc123"));
        assert!(VideoDownloader::is_url("http://example.com/talk.mp4"));
        assert!(!VideoDownloader::is_url("/path/to/video.mp4"));
        assert!(!VideoDownloader::is_url("video.mp4"));
        assert!(!VideoDownloader::is_url("file:///path/video.mp4"));
    }

    #[tokio::test]
    async fn test_find_existing_download_skips_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        tokio::fs::write(dir.join("talk.mp4"), b"video").await.unwrap();
        tokio::fs::write(dir.join("talk_pausecut.mp4"), b"output").await.unwrap();
        tokio::fs::write(dir.join("notes.txt"), b"text").await.unwrap();

        let downloader = VideoDownloader::new(Config::default().acquisition);
        let found = downloader
            .find_existing_download(dir, "_pausecut")
            .await
            .unwrap();

        assert_eq!(found, Some(dir.join("talk.mp4")));
    }

    #[tokio::test]
    async fn test_find_existing_download_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let downloader = VideoDownloader::new(Config::default().acquisition);
        let found = downloader
            .find_existing_download(temp_dir.path(), "_pausecut")
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
