use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{CoreResult, PausecutError};

/// One recognized spoken token with its position on the source timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Transcribed token (display-only, the algorithm never reads it)
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Duration of the spoken token in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Word-level timestamp data for one media file, plus its total duration.
///
/// Immutable after construction. Words are sorted by non-decreasing start
/// time; overlapping words are tolerated (a known transcriber artifact) and
/// handled downstream by the gap detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    /// Total media duration in seconds, taken from the source file rather
    /// than from the last word's end time
    duration: f64,
    /// Words ordered by start time
    words: Vec<Word>,
}

/// Raw persisted document shape; validated into a `Transcript` on load
#[derive(Debug, Deserialize)]
struct TimestampDocument {
    duration: f64,
    words: Vec<Word>,
}

impl Transcript {
    /// Build a transcript from raw transcriber output.
    ///
    /// Sorts by start time (stable, so ties keep transcriber order) and
    /// rejects words with `start > end` or negative times. Words whose end
    /// runs past `duration` are tolerated; duration probes and transcriber
    /// timestamps routinely disagree by a few milliseconds.
    pub fn new(mut words: Vec<Word>, duration: f64) -> CoreResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(PausecutError::MalformedTranscript(format!(
                "media duration must be a non-negative number, got {duration}"
            )));
        }

        for (i, word) in words.iter().enumerate() {
            if !word.start.is_finite() || !word.end.is_finite() {
                return Err(PausecutError::MalformedTranscript(format!(
                    "word {i} ({:?}) has a non-finite timestamp",
                    word.text
                )));
            }
            if word.start < 0.0 {
                return Err(PausecutError::MalformedTranscript(format!(
                    "word {i} ({:?}) starts at negative time {}",
                    word.text, word.start
                )));
            }
            if word.start > word.end {
                return Err(PausecutError::MalformedTranscript(format!(
                    "word {i} ({:?}) ends at {} before it starts at {}",
                    word.text, word.end, word.start
                )));
            }
        }

        // Timestamps are finite at this point, so total_cmp orders them
        // exactly like partial_cmp would
        words.sort_by(|a, b| a.start.total_cmp(&b.start));

        Ok(Self { duration, words })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Persist the transcript as a JSON timestamp document.
    ///
    /// serde_json round-trips f64 exactly, so start/end survive with full
    /// precision and a later load bypasses transcription entirely.
    pub async fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PausecutError::Io(std::io::Error::other(e)))?;
        tokio::fs::write(path, json).await?;
        debug!("persisted {} words to {}", self.words.len(), path.display());
        Ok(())
    }

    /// Load a previously persisted timestamp document.
    ///
    /// Fails with `InvalidTimestampFile` if the structure does not match or
    /// the word list is empty; the caller should delete and regenerate.
    pub async fn load(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        let doc: TimestampDocument =
            serde_json::from_str(&content).map_err(|e| PausecutError::InvalidTimestampFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if doc.words.is_empty() {
            return Err(PausecutError::InvalidTimestampFile {
                path: path.to_path_buf(),
                reason: "word list is empty".to_string(),
            });
        }

        Self::new(doc.words, doc.duration).map_err(|e| PausecutError::InvalidTimestampFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn word(text: &str, start: f64, end: f64) -> Word {
        Word::new(text, start, end)
    }

    #[test]
    fn test_construction_sorts_by_start() {
        let words = vec![
            word("world", 2.0, 2.5),
            word("hello", 0.0, 0.5),
            word("again", 3.0, 3.5),
        ];
        let transcript = Transcript::new(words, 10.0).unwrap();

        let texts: Vec<&str> = transcript.words().iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world", "again"]);
    }

    #[test]
    fn test_construction_is_stable_on_ties() {
        let words = vec![
            word("first", 1.0, 1.2),
            word("second", 1.0, 1.4),
        ];
        let transcript = Transcript::new(words, 5.0).unwrap();

        assert_eq!(transcript.words()[0].text, "first");
        assert_eq!(transcript.words()[1].text, "second");
    }

    #[test]
    fn test_word_ending_before_start_is_rejected() {
        // Scenario: start=5, end=3
        let words = vec![word("broken", 5.0, 3.0)];
        let err = Transcript::new(words, 10.0).unwrap_err();
        assert!(matches!(err, PausecutError::MalformedTranscript(_)));
    }

    #[test]
    fn test_negative_start_is_rejected() {
        let words = vec![word("early", -0.1, 0.5)];
        let err = Transcript::new(words, 10.0).unwrap_err();
        assert!(matches!(err, PausecutError::MalformedTranscript(_)));
    }

    #[test]
    fn test_word_past_duration_is_tolerated() {
        // ffprobe duration and whisper timestamps disagree by a few ms all
        // the time; construction must not reject that.
        let words = vec![word("tail", 9.8, 10.04)];
        let transcript = Transcript::new(words, 10.0).unwrap();
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_empty_transcript_is_constructible() {
        let transcript = Transcript::new(Vec::new(), 5.0).unwrap();
        assert!(transcript.is_empty());
        assert_eq!(transcript.duration(), 5.0);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timestamps.json");

        let original = Transcript::new(
            vec![
                word("hello", 0.0, 0.48),
                word("world", 0.52, 1.003),
                word("pause", 4.25, 4.75),
            ],
            12.5,
        )
        .unwrap();

        original.save(&path).await.unwrap();
        let loaded = Transcript::load(&path).await.unwrap();

        assert_eq!(loaded.len(), original.len());
        assert!((loaded.duration() - original.duration()).abs() < 1e-6);
        for (a, b) in loaded.words().iter().zip(original.words()) {
            assert_eq!(a.text, b.text);
            assert!((a.start - b.start).abs() < 1e-6);
            assert!((a.end - b.end).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_load_rejects_wrong_structure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timestamps.json");
        tokio::fs::write(&path, r#"[{"word": "legacy", "start": 0.0}]"#)
            .await
            .unwrap();

        let err = Transcript::load(&path).await.unwrap_err();
        assert!(matches!(err, PausecutError::InvalidTimestampFile { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_empty_word_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timestamps.json");
        tokio::fs::write(&path, r#"{"duration": 5.0, "words": []}"#)
            .await
            .unwrap();

        let err = Transcript::load(&path).await.unwrap_err();
        assert!(matches!(err, PausecutError::InvalidTimestampFile { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_words() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timestamps.json");
        tokio::fs::write(
            &path,
            r#"{"duration": 5.0, "words": [{"text": "bad", "start": 3.0, "end": 1.0}]}"#,
        )
        .await
        .unwrap();

        let err = Transcript::load(&path).await.unwrap_err();
        assert!(matches!(err, PausecutError::InvalidTimestampFile { .. }));
    }
}
