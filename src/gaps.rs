use serde::Serialize;

use crate::error::{CoreResult, PausecutError};
use crate::transcript::Transcript;

/// A silent span on the source timeline whose length exceeds the configured
/// threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gap {
    /// Start of the silence in seconds (end of the previous word, or 0)
    pub start: f64,
    /// End of the silence in seconds (start of the next word, or the media
    /// duration)
    pub end: f64,
}

impl Gap {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Find silences longer than `max_gap` seconds.
///
/// The timeline is bounded by `[0, duration]`, so the span before the first
/// word and the span after the last word count as gaps too. Pure function of
/// its inputs; no side effects.
///
/// Overlapping words (next starts before the previous ends) are a known
/// transcriber artifact: the span between them is treated as zero-length,
/// never negative, and never emitted.
pub fn find_gaps(transcript: &Transcript, max_gap: f64) -> CoreResult<Vec<Gap>> {
    if !max_gap.is_finite() || max_gap <= 0.0 {
        return Err(PausecutError::InvalidConfiguration(format!(
            "max_gap must be a positive number of seconds, got {max_gap}"
        )));
    }

    let duration = transcript.duration();
    let words = transcript.words();
    let mut gaps = Vec::new();

    // With no words the whole timeline is one silence
    if words.is_empty() {
        if duration > max_gap {
            gaps.push(Gap {
                start: 0.0,
                end: duration,
            });
        }
        return Ok(gaps);
    }

    let first = &words[0];
    if first.start > max_gap {
        gaps.push(Gap {
            start: 0.0,
            end: first.start,
        });
    }

    for pair in words.windows(2) {
        let gap_start = pair[0].end;
        let gap_end = pair[1].start;
        // A non-positive span means the words overlap; skip it
        if gap_end - gap_start > max_gap {
            gaps.push(Gap {
                start: gap_start,
                end: gap_end,
            });
        }
    }

    if let Some(last) = words.last() {
        if duration - last.end > max_gap {
            gaps.push(Gap {
                start: last.end,
                end: duration,
            });
        }
    }

    Ok(gaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Word;

    fn transcript(words: &[(f64, f64)], duration: f64) -> Transcript {
        let words = words
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| Word::new(format!("w{i}"), start, end))
            .collect();
        Transcript::new(words, duration).unwrap()
    }

    #[test]
    fn test_basic_gap_between_words() {
        let t = transcript(&[(0.0, 0.5), (2.0, 2.5), (3.0, 3.5)], 3.5);
        let gaps = find_gaps(&t, 1.0).unwrap();

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0], Gap { start: 0.5, end: 2.0 });
    }

    #[test]
    fn test_no_gaps_when_speech_is_tight() {
        let t = transcript(&[(0.0, 0.5), (0.6, 1.0), (1.1, 1.5)], 1.5);
        let gaps = find_gaps(&t, 1.0).unwrap();
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_multiple_gaps() {
        let t = transcript(&[(0.0, 0.5), (2.0, 2.5), (4.0, 4.5)], 4.5);
        let gaps = find_gaps(&t, 1.0).unwrap();

        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0], Gap { start: 0.5, end: 2.0 });
        assert_eq!(gaps[1], Gap { start: 2.5, end: 4.0 });
    }

    #[test]
    fn test_leading_and_trailing_silence() {
        let t = transcript(&[(3.0, 4.0)], 10.0);
        let gaps = find_gaps(&t, 1.0).unwrap();

        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0], Gap { start: 0.0, end: 3.0 });
        assert_eq!(gaps[1], Gap { start: 4.0, end: 10.0 });
    }

    #[test]
    fn test_overlapping_words_never_emit_negative_gap() {
        // Whisper sometimes reports the next word starting before the
        // previous one ended
        let t = transcript(&[(0.0, 2.0), (1.5, 2.5), (8.0, 8.5)], 8.5);
        let gaps = find_gaps(&t, 1.0).unwrap();

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0], Gap { start: 2.5, end: 8.0 });
        for gap in &gaps {
            assert!(gap.duration() > 0.0);
        }
    }

    #[test]
    fn test_word_end_past_duration_does_not_emit_trailing_gap() {
        let t = transcript(&[(0.0, 10.1)], 10.0);
        let gaps = find_gaps(&t, 0.2).unwrap();
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_empty_transcript_is_one_big_gap() {
        let t = transcript(&[], 5.0);
        let gaps = find_gaps(&t, 1.0).unwrap();

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0], Gap { start: 0.0, end: 5.0 });
    }

    #[test]
    fn test_empty_transcript_shorter_than_threshold() {
        let t = transcript(&[], 0.5);
        let gaps = find_gaps(&t, 1.0).unwrap();
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_non_positive_max_gap_is_rejected() {
        let t = transcript(&[(0.0, 1.0)], 2.0);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = find_gaps(&t, bad).unwrap_err();
            assert!(matches!(err, PausecutError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_gap_exactly_at_threshold_is_not_excess() {
        // Strictly greater-than: a 1.0s pause with max_gap 1.0 stays
        let t = transcript(&[(0.0, 1.0), (2.0, 3.0)], 3.0);
        let gaps = find_gaps(&t, 1.0).unwrap();
        assert!(gaps.is_empty());
    }
}
