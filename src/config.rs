use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::planner::{RetentionPolicy, DEFAULT_MIN_SEGMENT};

/// Whisper models the transcriber knows how to drive
pub const KNOWN_MODELS: &[&str] = &[
    "tiny", "base", "small", "medium", "large", "large-v1", "large-v2", "large-v3",
];

/// Configuration for the pause removal pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Media acquisition settings
    pub acquisition: AcquisitionConfig,

    /// Audio extraction settings
    pub audio: AudioConfig,

    /// Transcription settings
    pub transcription: TranscriptionConfig,

    /// Gap detection and cut planning settings
    pub cut: CutConfig,

    /// Output and storage settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// yt-dlp format selector
    pub format: String,

    /// Reuse a previously downloaded file for the same output directory
    pub reuse_downloads: bool,

    /// Extensions considered when scanning for existing downloads
    pub supported_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target sample rate for transcription
    pub target_sample_rate: u32,

    /// Target audio format
    pub target_format: String,

    /// Remove the extracted audio once transcription is done
    pub cleanup_temp_files: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper model to use
    pub model: String,

    /// Language hint; None lets the backend auto-detect
    pub language: Option<String>,

    /// Timeout for the transcription process (seconds)
    pub timeout: u64,

    /// Worker threads for whisper.cpp backends
    pub threads: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutConfig {
    /// Maximum silence duration allowed to remain uncut (seconds)
    pub max_gap: f64,

    /// Minimum keep-segment duration / merge epsilon (seconds)
    pub min_segment: f64,

    /// What to do with the excess part of each pause
    pub retention: RetentionPolicy,

    /// Video codec for the re-encode
    pub video_codec: String,

    /// Audio codec for the re-encode
    pub audio_codec: String,

    /// Encoder preset
    pub preset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base output directory
    pub base_dir: PathBuf,

    /// Suffix appended to the source file stem for the output file
    pub suffix: String,

    /// Keep intermediate files (extracted audio, plan dump)
    pub keep_intermediates: bool,

    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from file, falling back to environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "pausecut.toml",
            "config/pausecut.toml",
            "~/.config/pausecut/config.toml",
            "/etc/pausecut/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(max_gap) = std::env::var("PAUSECUT_MAX_GAP") {
            config.cut.max_gap = max_gap.parse().unwrap_or(config.cut.max_gap);
        }

        if let Ok(model) = std::env::var("PAUSECUT_MODEL") {
            config.transcription.model = model;
        }

        if let Ok(output_dir) = std::env::var("PAUSECUT_OUTPUT_DIR") {
            config.output.base_dir = PathBuf::from(output_dir);
        }

        if let Ok(log_level) = std::env::var("PAUSECUT_LOG_LEVEL") {
            config.output.log_level = log_level;
        }

        if let Ok(timeout) = std::env::var("PAUSECUT_TIMEOUT") {
            config.transcription.timeout = timeout.parse().unwrap_or(config.transcription.timeout);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.cut.max_gap.is_finite() || self.cut.max_gap <= 0.0 {
            return Err(anyhow!("max_gap must be greater than 0"));
        }

        if !self.cut.min_segment.is_finite() || self.cut.min_segment < 0.0 {
            return Err(anyhow!("min_segment must not be negative"));
        }

        if self.audio.target_sample_rate == 0 {
            return Err(anyhow!("target_sample_rate must be greater than 0"));
        }

        if self.transcription.timeout == 0 {
            return Err(anyhow!("transcription timeout must be greater than 0"));
        }

        if !KNOWN_MODELS.contains(&self.transcription.model.as_str()) {
            return Err(anyhow!(
                "unknown model '{}', expected one of: {}",
                self.transcription.model,
                KNOWN_MODELS.join(", ")
            ));
        }

        if self.output.suffix.is_empty() {
            return Err(anyhow!("output suffix must not be empty"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Pausecut Configuration:\n\
            - Max Gap: {}s ({})\n\
            - Min Segment: {}s\n\
            - Whisper Model: {}\n\
            - Audio Sample Rate: {}Hz\n\
            - Output Directory: {}\n\
            - Keep Intermediates: {}",
            self.cut.max_gap,
            self.cut.retention,
            self.cut.min_segment,
            self.transcription.model,
            self.audio.target_sample_rate,
            self.output.base_dir.display(),
            self.output.keep_intermediates
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig {
                format: "best".to_string(),
                reuse_downloads: true,
                supported_extensions: vec![
                    "mp4".to_string(),
                    "mkv".to_string(),
                    "webm".to_string(),
                    "mov".to_string(),
                    "m4v".to_string(),
                ],
            },
            audio: AudioConfig {
                target_sample_rate: 16000, // Optimal for Whisper
                target_format: "wav".to_string(),
                cleanup_temp_files: true,
            },
            transcription: TranscriptionConfig {
                model: "base".to_string(),
                language: None,
                timeout: 3600, // 60 minutes for large files
                threads: 4,
            },
            cut: CutConfig {
                max_gap: 1.0,
                min_segment: DEFAULT_MIN_SEGMENT,
                retention: RetentionPolicy::TrimExcess,
                video_codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                preset: "medium".to_string(),
            },
            output: OutputConfig {
                base_dir: PathBuf::from("./output"),
                suffix: "_pausecut".to_string(),
                keep_intermediates: false,
                log_level: "info".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_max_gap(mut self, max_gap: f64) -> Self {
        self.config.cut.max_gap = max_gap;
        self
    }

    pub fn with_min_segment(mut self, min_segment: f64) -> Self {
        self.config.cut.min_segment = min_segment;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.config.cut.retention = retention;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.transcription.model = model.into();
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.base_dir = dir;
        self
    }

    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.config.output.keep_intermediates = keep;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cut.max_gap, 1.0);
        assert_eq!(config.audio.target_sample_rate, 16000);
        assert_eq!(config.cut.retention, RetentionPolicy::TrimExcess);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_max_gap(0.5)
            .with_model("small")
            .with_retention(RetentionPolicy::RemoveAll)
            .keep_intermediates(true)
            .build();

        assert_eq!(config.cut.max_gap, 0.5);
        assert_eq!(config.transcription.model, "small");
        assert_eq!(config.cut.retention, RetentionPolicy::RemoveAll);
        assert!(config.output.keep_intermediates);
    }

    #[test]
    fn test_validation_rejects_bad_tunables() {
        let mut config = Config::default();
        config.cut.max_gap = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.transcription.model = "enormous".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cut.min_segment = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let encoded = toml::to_string_pretty(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.cut.max_gap, config.cut.max_gap);
        assert_eq!(decoded.transcription.model, config.transcription.model);
    }
}
