//! Parse options.
//!
//! [`ParseOptions`] carries every tunable limit of the pipeline. Options
//! can be loaded from a JSON file; missing keys take their defaults.
//!
//! ```
//! use bw_replay::config::ParseOptions;
//!
//! let options: ParseOptions = serde_json::from_str(r#"{ "min_events": 4 }"#).unwrap();
//! assert_eq!(options.min_events, 4);
//! assert_eq!(options.max_build_order_len, 200);
//! assert!(options.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};

/// Default maximum input size: 10 MiB.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Limits and thresholds for one parser handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Largest accepted input, and the cap on inflated output.
    pub max_buffer_size: usize,
    /// Maximum build order entries per player.
    pub max_build_order_len: usize,
    /// Consecutive decode failures before a decode attempt is truncated.
    pub max_consecutive_failures: usize,
    /// Minimum decoded events for a strategy to be accepted.
    pub min_events: usize,
    /// Minimum share of frame-consistent consecutive events.
    pub min_frame_ratio: f64,
    /// Byte stride between heuristic scan probes.
    pub heuristic_stride: usize,
    /// Maximum number of heuristic scan probes.
    pub heuristic_max_probes: usize,
    /// Bytes decoded per heuristic probe.
    pub probe_window: usize,
    /// Optional wall-clock budget for command stream resolution, in
    /// milliseconds.
    pub time_budget_ms: Option<u64>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_build_order_len: 200,
            max_consecutive_failures: 64,
            min_events: 8,
            min_frame_ratio: 0.9,
            heuristic_stride: 8,
            heuristic_max_probes: 2048,
            probe_window: 512,
            time_budget_ms: None,
        }
    }
}

impl ParseOptions {
    /// Loads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `InvalidConfig` if it
    /// is not valid JSON or fails [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let options: ParseOptions =
            serde_json::from_str(&content).map_err(|e| ParserError::InvalidConfig {
                reason: format!("{}: {e}", path.as_ref().display()),
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ParserError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.max_buffer_size == 0 {
            return invalid("max_buffer_size must be positive");
        }
        if self.min_events == 0 {
            return invalid("min_events must be positive");
        }
        if !(self.min_frame_ratio > 0.0 && self.min_frame_ratio <= 1.0) {
            return invalid("min_frame_ratio must be in (0, 1]");
        }
        if self.heuristic_stride == 0 {
            return invalid("heuristic_stride must be positive");
        }
        if self.probe_window < 16 {
            return invalid("probe_window must be at least 16 bytes");
        }
        Ok(())
    }

    /// Returns the time budget as a duration.
    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}
