use std::collections::HashSet;

use crate::error::{EngineError, InvalidTimelineReason, Result};
use crate::time::{seconds_to_ticks, ticks_to_seconds};
use tracing::{debug, warn};

/// Opaque identifier for timeline segments.
pub type SegmentId = String;

/// One fixed-duration unit of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: SegmentId,
    duration_tl: i64,
}

impl Segment {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the segment duration in timeline ticks.
    pub fn duration_tl(&self) -> i64 {
        self.duration_tl
    }

    pub fn duration_seconds(&self) -> f64 {
        ticks_to_seconds(self.duration_tl)
    }
}

/// Unvalidated `(id, seconds)` pair accepted by [`Timeline::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInput {
    pub id: SegmentId,
    pub duration_seconds: f64,
}

impl SegmentInput {
    /// The duration is validated when the input is placed in a [`Timeline`].
    pub fn new(id: impl Into<SegmentId>, duration_seconds: f64) -> Self {
        Self {
            id: id.into(),
            duration_seconds,
        }
    }
}

/// Immutable ordered list of segments defining the program length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    /// Validates and builds a timeline.
    ///
    /// Fails with [`EngineError::InvalidTimeline`] when `segments` is empty,
    /// when any duration is not a positive number of ticks, or when ids repeat.
    ///
    /// # Example
    /// ```
    /// use sequencer::{SegmentInput, Timeline};
    ///
    /// let timeline = Timeline::new(vec![SegmentInput::new("a", 5.0), SegmentInput::new("b", 10.0)])
    ///     .expect("valid timeline");
    /// assert_eq!(timeline.len(), 2);
    /// assert_eq!(timeline.total_duration_tl(), 15_000_000);
    /// ```
    pub fn new(segments: Vec<SegmentInput>) -> Result<Self> {
        if segments.is_empty() {
            warn!("timeline rejected: no segments");
            return Err(EngineError::InvalidTimeline {
                reason: InvalidTimelineReason::Empty,
            });
        }

        let mut seen = HashSet::with_capacity(segments.len());
        let mut total_tl = 0i64;
        let mut validated = Vec::with_capacity(segments.len());
        for input in segments {
            let duration_tl = seconds_to_ticks(input.duration_seconds)
                .filter(|ticks| *ticks > 0)
                .ok_or_else(|| {
                    warn!(
                        segment_id = %input.id,
                        seconds = input.duration_seconds,
                        "timeline rejected: non-positive duration"
                    );
                    EngineError::InvalidTimeline {
                        reason: InvalidTimelineReason::NonPositiveDuration {
                            segment_id: input.id.clone(),
                            seconds: input.duration_seconds,
                        },
                    }
                })?;

            if !seen.insert(input.id.clone()) {
                warn!(segment_id = %input.id, "timeline rejected: duplicate id");
                return Err(EngineError::InvalidTimeline {
                    reason: InvalidTimelineReason::DuplicateSegmentId {
                        segment_id: input.id,
                    },
                });
            }

            total_tl = total_tl.checked_add(duration_tl).ok_or_else(|| {
                warn!(segment_id = %input.id, "timeline rejected: total duration overflows");
                EngineError::InvalidTimeline {
                    reason: InvalidTimelineReason::TotalDurationOverflow,
                }
            })?;

            validated.push(Segment {
                id: input.id,
                duration_tl,
            });
        }

        let timeline = Self {
            segments: validated,
        };

        debug!(
            segment_count = timeline.len(),
            total_duration_tl = timeline.total_duration_tl(),
            "timeline created"
        );
        Ok(timeline)
    }

    /// Returns the segment at `index`.
    pub fn segment_at(&self, index: usize) -> Result<&Segment> {
        self.segments.get(index).ok_or(EngineError::IndexOutOfRange {
            index,
            len: self.segments.len(),
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: a timeline holds at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns total timeline duration in timeline ticks.
    pub fn total_duration_tl(&self) -> i64 {
        self.segments.iter().map(Segment::duration_tl).sum()
    }

    pub fn total_duration_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_duration_tl())
    }

    /// Sum of durations strictly before `index`, in timeline ticks.
    ///
    /// `index == len()` is accepted and yields the total duration.
    pub fn cumulative_offset_tl(&self, index: usize) -> Result<i64> {
        if index > self.segments.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.segments.len(),
            });
        }
        Ok(self.segments[..index]
            .iter()
            .map(Segment::duration_tl)
            .sum())
    }

    pub fn cumulative_offset_seconds(&self, index: usize) -> Result<f64> {
        self.cumulative_offset_tl(index).map(ticks_to_seconds)
    }

    /// Builds a timeline from `(id, seconds)` pairs.
    pub fn from_seconds<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<SegmentId>,
    {
        Self::new(
            segments
                .into_iter()
                .map(|(id, seconds)| SegmentInput::new(id, seconds))
                .collect(),
        )
    }
}
