use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::SequencerSettings;
use crate::error::{EngineError, Result};
use crate::timeline::{SegmentId, SegmentInput, Timeline};

/// Static program definition supplied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub segments: Vec<SegmentConfig>,
    #[serde(default = "default_start_muted")]
    pub start_muted: bool,
}

/// One `(id, seconds)` entry of a program file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub id: SegmentId,
    pub duration_seconds: f64,
}

fn default_start_muted() -> bool {
    SequencerSettings::default().start_muted
}

impl ProgramConfig {
    /// Reads a JSON program file.
    ///
    /// Only parsing happens here; durations and ids are validated by
    /// [`ProgramConfig::timeline`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| EngineError::ConfigSerialization {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a JSON program.
    ///
    /// # Example
    /// ```
    /// use sequencer::ProgramConfig;
    ///
    /// let config = ProgramConfig::from_json_str(
    ///     r#"{ "segments": [{ "id": "intro", "duration_seconds": 2.5 }] }"#,
    /// )
    /// .expect("valid json");
    /// assert!(config.start_muted);
    /// assert_eq!(config.timeline().expect("valid timeline").len(), 1);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| EngineError::ConfigSerialization {
            path: "<inline>".into(),
            source,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| EngineError::ConfigSerialization {
            path: "<inline>".into(),
            source,
        })
    }

    /// Validates the segment list into a [`Timeline`].
    pub fn timeline(&self) -> Result<Timeline> {
        Timeline::new(
            self.segments
                .iter()
                .map(|segment| SegmentInput::new(segment.id.clone(), segment.duration_seconds))
                .collect(),
        )
    }

    pub fn settings(&self) -> SequencerSettings {
        SequencerSettings {
            start_muted: self.start_muted,
        }
    }
}

impl Default for ProgramConfig {
    /// The built-in seven-scene program (85 seconds).
    fn default() -> Self {
        let segments = [
            ("opening", 5.0),
            ("details", 10.0),
            ("lifestyle", 15.0),
            ("tech", 15.0),
            ("family", 15.0),
            ("interior", 15.0),
            ("end", 10.0),
        ]
        .into_iter()
        .map(|(id, duration_seconds)| SegmentConfig {
            id: id.to_string(),
            duration_seconds,
        })
        .collect();

        Self {
            segments,
            start_muted: default_start_muted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::ProgramConfig;
    use crate::error::EngineError;

    #[test]
    fn default_program_is_valid_and_eighty_five_seconds_long() {
        let timeline = ProgramConfig::default()
            .timeline()
            .expect("default program must be valid");

        assert_eq!(timeline.len(), 7);
        assert_eq!(timeline.total_duration_tl(), 85_000_000);
        assert_eq!(timeline.segment_at(0).expect("first").id(), "opening");
    }

    #[test]
    fn load_reads_program_file_and_overrides_mute() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(
            file,
            r#"{{ "segments": [{{ "id": "a", "duration_seconds": 5 }}, {{ "id": "b", "duration_seconds": 10 }}], "start_muted": false }}"#
        )
        .expect("write program");

        let config = ProgramConfig::load(file.path()).expect("load program");

        assert!(!config.settings().start_muted);
        assert_eq!(
            config.timeline().expect("valid timeline").total_duration_tl(),
            15_000_000
        );
    }

    #[test]
    fn load_missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = ProgramConfig::load(dir.path().join("missing.json"));

        assert!(matches!(result, Err(EngineError::ConfigIo { .. })));
    }

    #[test]
    fn malformed_json_reports_serialization_error() {
        let result = ProgramConfig::from_json_str(r#"{ "segments": [{ "id": 3 }] }"#);

        assert!(matches!(
            result,
            Err(EngineError::ConfigSerialization { .. })
        ));
    }

    #[test]
    fn zero_duration_in_file_is_rejected_as_invalid_timeline() {
        let config = ProgramConfig::from_json_str(
            r#"{ "segments": [{ "id": "a", "duration_seconds": 0 }] }"#,
        )
        .expect("parse program");

        let error = config.timeline().expect_err("zero duration must fail");
        assert!(error.is_invalid_timeline());
    }

    #[test]
    fn json_round_trip_keeps_default_program() {
        let config = ProgramConfig::default();
        let text = config.to_json_string().expect("serialize");

        assert_eq!(
            ProgramConfig::from_json_str(&text).expect("parse"),
            config
        );
    }
}
