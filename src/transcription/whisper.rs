use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::TranscriptionConfig;
use crate::transcript::Word;

/// Whisper transcriber producing word-level timestamps
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    /// Configuration
    config: TranscriptionConfig,
    /// Whisper model name
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber
    pub fn new(config: TranscriptionConfig) -> Self {
        let model = config.model.clone();
        Self { config, model }
    }

    /// Create transcriber with custom model
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Transcribe an audio file into word-level timestamps.
    ///
    /// Tries whisper.cpp first (fastest), falling back to the Python
    /// implementation. Both are driven as external commands writing JSON
    /// into a temp directory under `work_dir`.
    pub async fn transcribe_words(&self, audio_path: &Path, work_dir: &Path) -> Result<Vec<Word>> {
        info!("🎤 Starting Whisper transcription for: {}", audio_path.display());
        info!("⚙️  Model: {}, timeout: {}s", self.model, self.config.timeout);

        let temp_dir = work_dir.join("whisper_out");
        tokio::fs::create_dir_all(&temp_dir).await?;

        let backends = [
            ("whisper-cli", true),
            ("whisper-cpp", true),
            ("whisper", false),
        ];

        let mut words = None;
        for (cmd_name, is_cpp) in &backends {
            if !Self::check_command_available(cmd_name).await {
                debug!("{} not available", cmd_name);
                continue;
            }
            info!("✅ Using {} backend for transcription", cmd_name);
            let result = if *is_cpp {
                self.run_whisper_cpp(cmd_name, audio_path, &temp_dir).await
            } else {
                self.run_python_whisper(audio_path, &temp_dir).await
            };
            words = Some(result?);
            break;
        }

        let words = words.ok_or_else(|| {
            anyhow!(
                "No Whisper backend found. Please install whisper.cpp \
                 (https://github.com/ggerganov/whisper.cpp) or openai-whisper"
            )
        })?;

        let _ = tokio::fs::remove_dir_all(&temp_dir).await;

        info!("🎉 Transcription produced {} words", words.len());
        Ok(words)
    }

    /// Run whisper.cpp with one token per segment so each JSON segment maps
    /// to one word
    async fn run_whisper_cpp(
        &self,
        cmd_name: &str,
        audio_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<Word>> {
        let base_name = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "transcript".to_string());
        let output_file = output_dir.join(&base_name);

        let mut cmd = Command::new(cmd_name);
        cmd.arg("-f")
            .arg(audio_path)
            .arg("-oj")
            .arg("-of")
            .arg(&output_file)
            .args(["-t", &self.config.threads.to_string()])
            .args(["-ml", "1", "-sow"]);

        if let Some(model_path) = self.resolve_model_path() {
            cmd.arg("-m").arg(model_path);
        } else {
            warn!("⚠️  No ggml model file found for '{}', relying on the backend default", self.model);
        }

        if let Some(language) = &self.config.language {
            cmd.args(["-l", language]);
        }

        info!("🚀 Running {}: {} model on {}", cmd_name, self.model, audio_path.display());
        self.execute_with_timeout(cmd, cmd_name).await?;

        let json_path = output_file.with_extension("json");
        let json = tokio::fs::read_to_string(&json_path)
            .await
            .with_context(|| format!("no JSON output at {}", json_path.display()))?;
        parse_whisper_words(&json)
    }

    /// Run the Python OpenAI Whisper CLI with word timestamps enabled
    async fn run_python_whisper(&self, audio_path: &Path, output_dir: &Path) -> Result<Vec<Word>> {
        let mut cmd = Command::new("whisper");
        cmd.arg(audio_path)
            .args(["--model", &self.model])
            .arg("--output_dir")
            .arg(output_dir)
            .args(["--output_format", "json"])
            .args(["--word_timestamps", "True"])
            .args(["--verbose", "False"])
            .args(["--fp16", "False"])
            .args(["--temperature", "0.0"]);

        if let Some(language) = &self.config.language {
            cmd.args(["--language", language]);
        }

        info!("🚀 Running Python Whisper: {} model on {}", self.model, audio_path.display());
        self.execute_with_timeout(cmd, "whisper").await?;

        let json_path = find_json_output(output_dir).await?;
        let json = tokio::fs::read_to_string(&json_path).await?;
        parse_whisper_words(&json)
    }

    /// Execute a whisper command, killing it if the timeout expires
    async fn execute_with_timeout(&self, mut cmd: Command, backend_name: &str) -> Result<()> {
        let timeout = Duration::from_secs(self.config.timeout);

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {backend_name} command"))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(anyhow!(
                    "{} timed out after {} seconds",
                    backend_name,
                    self.config.timeout
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} failed with exit code {}:\n{}",
                backend_name,
                output.status,
                stderr.trim()
            ));
        }

        debug!("{} completed", backend_name);
        Ok(())
    }

    /// Look for a ggml model file in the conventional locations
    fn resolve_model_path(&self) -> Option<PathBuf> {
        let candidates = [
            PathBuf::from(format!("models/ggml-{}.bin", self.model)),
            PathBuf::from(format!("/usr/local/share/whisper-cpp/ggml-{}.bin", self.model)),
            PathBuf::from(format!("/opt/homebrew/share/whisper-cpp/ggml-{}.bin", self.model)),
        ];
        candidates.into_iter().find(|p| p.exists())
    }

    /// Check if a command is available
    async fn check_command_available(cmd_name: &str) -> bool {
        Command::new(cmd_name)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Check if any Whisper backend is available
    pub async fn check_availability() -> Result<String> {
        let backends = [
            ("whisper-cli", "whisper.cpp (whisper-cli)"),
            ("whisper-cpp", "whisper.cpp"),
            ("whisper", "OpenAI Whisper (Python)"),
        ];

        for (cmd_name, description) in &backends {
            if Self::check_command_available(cmd_name).await {
                return Ok(format!("{description} available"));
            }
        }

        Err(anyhow!(
            "No Whisper backend found. Please install:\n\
            - whisper.cpp (recommended): https://github.com/ggerganov/whisper.cpp\n\
            - Or OpenAI Whisper: pip install openai-whisper"
        ))
    }
}

/// Whisper JSON output; covers both the whisper.cpp `transcription` array
/// and the Python `segments[].words[]` shape
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<CppSegment>,
    #[serde(default)]
    segments: Vec<PySegment>,
}

#[derive(Debug, Deserialize)]
struct CppSegment {
    offsets: CppOffsets,
    text: String,
}

/// whisper.cpp reports offsets in milliseconds
#[derive(Debug, Deserialize)]
struct CppOffsets {
    from: u64,
    to: u64,
}

#[derive(Debug, Deserialize)]
struct PySegment {
    #[serde(default)]
    words: Vec<PyWord>,
}

#[derive(Debug, Deserialize)]
struct PyWord {
    word: String,
    start: f64,
    end: f64,
}

/// Parse whisper JSON output into words, whichever backend produced it
fn parse_whisper_words(json: &str) -> Result<Vec<Word>> {
    let output: WhisperOutput =
        serde_json::from_str(json).context("failed to parse whisper JSON output")?;

    let words: Vec<Word> = if !output.transcription.is_empty() {
        debug!(
            "using whisper.cpp format with {} token segments",
            output.transcription.len()
        );
        output
            .transcription
            .into_iter()
            .filter(|seg| !seg.text.trim().is_empty())
            .map(|seg| {
                Word::new(
                    seg.text.trim(),
                    seg.offsets.from as f64 / 1000.0,
                    seg.offsets.to as f64 / 1000.0,
                )
            })
            .collect()
    } else {
        debug!("using Python whisper format with {} segments", output.segments.len());
        output
            .segments
            .into_iter()
            .flat_map(|seg| seg.words)
            .filter(|w| !w.word.trim().is_empty())
            .map(|w| Word::new(w.word.trim(), w.start, w.end))
            .collect()
    };

    Ok(words)
}

/// Find the JSON file a whisper backend dropped into the output directory
async fn find_json_output(dir: &Path) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            return Ok(path);
        }
    }
    Err(anyhow!("no JSON output found in {}", dir.display()))
}
