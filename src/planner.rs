use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreResult, PausecutError};
use crate::gaps::{find_gaps, Gap};
use crate::transcript::Transcript;

/// Minimum keep-segment duration in seconds; anything shorter would produce
/// degenerate cuts and corrupt encodes
pub const DEFAULT_MIN_SEGMENT: f64 = 0.01;

/// What to do with the excess part of a detected pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Remove only the excess portion, leaving `max_gap` seconds of silence
    /// split evenly across the cut point so speech keeps its natural cadence
    #[default]
    TrimExcess,
    /// Remove the detected pause entirely; speech is spliced back to back
    RemoveAll,
}

impl FromStr for RetentionPolicy {
    type Err = PausecutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trim-excess" => Ok(Self::TrimExcess),
            "remove-all" => Ok(Self::RemoveAll),
            other => Err(PausecutError::InvalidConfiguration(format!(
                "unknown retention policy {other:?}, expected trim-excess or remove-all"
            ))),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrimExcess => write!(f, "trim-excess"),
            Self::RemoveAll => write!(f, "remove-all"),
        }
    }
}

/// A contiguous span of source-media time retained in the output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeepInterval {
    pub start: f64,
    pub end: f64,
}

impl KeepInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The full cut decision for one run: detected gaps plus the keep intervals
/// handed to the cutting tool. Computed fresh every run, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CutPlan {
    /// Source media duration in seconds
    pub duration: f64,
    /// Excess gaps the plan removes (wholly or partially)
    pub gaps: Vec<Gap>,
    /// Ordered, non-overlapping spans to keep
    pub intervals: Vec<KeepInterval>,
}

impl CutPlan {
    pub fn stats(&self) -> CutStats {
        let kept: f64 = self.intervals.iter().map(KeepInterval::duration).sum();
        let removed = (self.duration - kept).max(0.0);
        let keep_ratio = if self.duration > 0.0 {
            kept / self.duration
        } else {
            1.0
        };
        CutStats {
            kept_seconds: kept,
            removed_seconds: removed,
            keep_ratio,
            segment_count: self.intervals.len(),
            gap_count: self.gaps.len(),
        }
    }
}

/// Summary numbers for reporting before the cut runs
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CutStats {
    pub kept_seconds: f64,
    pub removed_seconds: f64,
    pub keep_ratio: f64,
    pub segment_count: usize,
    pub gap_count: usize,
}

/// Converts detected gaps into the keep intervals that reassemble the video
/// with pauses collapsed.
///
/// Pure: the same transcript and settings always produce the same plan.
#[derive(Debug, Clone)]
pub struct SegmentPlanner {
    max_gap: f64,
    min_segment: f64,
    retention: RetentionPolicy,
}

impl SegmentPlanner {
    /// Create a planner, rejecting invalid tunables at entry.
    pub fn new(max_gap: f64, min_segment: f64, retention: RetentionPolicy) -> CoreResult<Self> {
        if !max_gap.is_finite() || max_gap <= 0.0 {
            return Err(PausecutError::InvalidConfiguration(format!(
                "max_gap must be a positive number of seconds, got {max_gap}"
            )));
        }
        if !min_segment.is_finite() || min_segment < 0.0 {
            return Err(PausecutError::InvalidConfiguration(format!(
                "min_segment must be a non-negative number of seconds, got {min_segment}"
            )));
        }
        Ok(Self {
            max_gap,
            min_segment,
            retention,
        })
    }

    pub fn max_gap(&self) -> f64 {
        self.max_gap
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Plan the keep intervals for one transcript.
    ///
    /// Starts from the `[0, duration]` universe, subtracts the excess part
    /// of every detected gap, then merges keep intervals separated by less
    /// than `min_segment`. Fails with `NoContentRemaining` if nothing
    /// survives.
    pub fn plan(&self, transcript: &Transcript) -> CoreResult<CutPlan> {
        let gaps = find_gaps(transcript, self.max_gap)?;
        let duration = transcript.duration();

        // With no words there is no speech to pad around; the whole silence
        // goes regardless of policy
        let retention = if transcript.is_empty() {
            RetentionPolicy::RemoveAll
        } else {
            self.retention
        };

        let half = self.max_gap / 2.0;
        let mut cuts: Vec<(f64, f64)> = Vec::with_capacity(gaps.len());
        for gap in &gaps {
            let (cut_start, cut_end) = match retention {
                RetentionPolicy::RemoveAll => (gap.start, gap.end),
                RetentionPolicy::TrimExcess => (
                    (gap.start + half).min(gap.end),
                    (gap.end - half).max(gap.start),
                ),
            };
            // A cut collapsed by clamping means the gap was not meaningfully
            // excess once retention is accounted for
            if cut_end > cut_start {
                cuts.push((cut_start, cut_end));
            }
        }

        // Gaps arrive ordered and disjoint, so subtracting left to right
        // keeps the intervals ordered and non-overlapping
        let mut intervals: Vec<KeepInterval> = Vec::with_capacity(cuts.len() + 1);
        let mut cursor = 0.0;
        for (cut_start, cut_end) in cuts {
            if cut_start > cursor {
                intervals.push(KeepInterval {
                    start: cursor,
                    end: cut_start,
                });
            }
            cursor = cursor.max(cut_end);
        }
        if duration > cursor {
            intervals.push(KeepInterval {
                start: cursor,
                end: duration,
            });
        }

        let intervals = self.merge_close_intervals(intervals);

        if intervals.is_empty() {
            return Err(PausecutError::NoContentRemaining { gaps });
        }

        Ok(CutPlan {
            duration,
            gaps,
            intervals,
        })
    }

    /// Re-join intervals whose separation is below the epsilon and drop
    /// slivers too short to encode.
    fn merge_close_intervals(&self, intervals: Vec<KeepInterval>) -> Vec<KeepInterval> {
        let mut merged: Vec<KeepInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(prev) if interval.start - prev.end < self.min_segment => {
                    prev.end = interval.end;
                }
                _ => merged.push(interval),
            }
        }
        merged.retain(|iv| iv.end > iv.start && iv.duration() >= self.min_segment);
        merged
    }
}
