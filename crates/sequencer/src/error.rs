use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::timeline::SegmentId;

/// Result type used by the sequencer crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by timeline construction and program loading.
#[derive(Debug)]
pub enum EngineError {
    InvalidTimeline {
        reason: InvalidTimelineReason,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Why a segment list was rejected as a timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidTimelineReason {
    Empty,
    NonPositiveDuration { segment_id: SegmentId, seconds: f64 },
    DuplicateSegmentId { segment_id: SegmentId },
    TotalDurationOverflow,
}

impl EngineError {
    /// Returns `true` for construction-time timeline rejections.
    pub fn is_invalid_timeline(&self) -> bool {
        matches!(self, Self::InvalidTimeline { .. })
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeline { reason } => write!(f, "invalid timeline: {reason}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "segment index {index} out of range for timeline of {len}")
            }
            Self::ConfigIo { path, source } => {
                write!(f, "failed to read program file: {} ({source})", path.display())
            }
            Self::ConfigSerialization { path, source } => {
                write!(
                    f,
                    "program deserialization failed at {} ({source})",
                    path.display()
                )
            }
        }
    }
}

impl Display for InvalidTimelineReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no segments"),
            Self::NonPositiveDuration {
                segment_id,
                seconds,
            } => write!(
                f,
                "segment {segment_id:?} has non-positive duration {seconds}s"
            ),
            Self::DuplicateSegmentId { segment_id } => {
                write!(f, "segment id {segment_id:?} is not unique")
            }
            Self::TotalDurationOverflow => write!(f, "total duration overflows"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigSerialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure reported by a best-effort side channel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideChannelError {
    pub message: String,
}

impl SideChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SideChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "side channel failure: {}", self.message)
    }
}

impl std::error::Error for SideChannelError {}
