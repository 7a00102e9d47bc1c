//! Configuration type definitions.

use crate::constants::{DEFAULT_PATH_PREFIX_SEGMENTS, formats};
use crate::properties::DateFormats;
use crate::table::Aggregation;
use serde::{Deserialize, Serialize};

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reconciliation settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Leading vendor path segments replaced by the image directory.
    pub path_prefix_segments: usize,

    /// Keep images that still assert several labels after priority rules.
    pub keep_unresolved: bool,

    /// How rows for the same image are combined.
    pub aggregation: Aggregation,

    /// `chrono` format of the detection record date.
    pub record_date_format: String,

    /// `chrono` format of the EXIF timestamp.
    pub exif_timestamp_format: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            path_prefix_segments: DEFAULT_PATH_PREFIX_SEGMENTS,
            keep_unresolved: false,
            aggregation: Aggregation::default(),
            record_date_format: formats::RECORD_DATE.to_string(),
            exif_timestamp_format: formats::EXIF_TIMESTAMP.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Date formats for capture time extraction.
    pub fn date_formats(&self) -> DateFormats {
        DateFormats {
            record_date: self.record_date_format.clone(),
            exif_timestamp: self.exif_timestamp_format.clone(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix CSV output with a UTF-8 byte order mark.
    pub csv_bom: bool,

    /// `chrono` format of the `time` column.
    pub time_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_bom: false,
            time_format: formats::OUTPUT_TIME.to_string(),
        }
    }
}
