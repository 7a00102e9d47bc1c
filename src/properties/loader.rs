//! Image properties CSV loading.

use crate::error::{Error, Result};
use crate::table::{normalize_path, parse_label_value};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::info;

/// Computed properties of one image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageProperties {
    /// Image path; made absolute on load.
    #[serde(rename = "filepath")]
    pub file_path: String,
    /// Grayscale (infrared) flag.
    #[serde(
        default,
        alias = "grayscale",
        alias = "is_grayscale",
        deserialize_with = "deserialize_flag"
    )]
    pub night: Option<u8>,
    /// Mean pixel brightness.
    #[serde(default, deserialize_with = "deserialize_brightness")]
    pub mean_brightness: Option<f64>,
    /// EXIF timestamp as written by the preprocessor.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub exif_timestamp: Option<String>,
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_label_value(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid flag value '{raw}'")))
}

fn deserialize_brightness<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid brightness '{raw}'")))
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Read an image properties CSV, normalizing every path to absolute form.
pub fn read_image_properties(path: &Path) -> Result<Vec<ImageProperties>> {
    info!("Loading image properties: {}", path.display());

    let read_error = |source| Error::PropertiesRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let mut properties = Vec::new();
    for record in reader.deserialize::<ImageProperties>() {
        let mut record = record.map_err(read_error)?;
        record.file_path = normalize_path(Path::new(&record.file_path))
            .to_string_lossy()
            .into_owned();
        properties.push(record);
    }

    info!("{} image properties rows found", properties.len());
    Ok(properties)
}
