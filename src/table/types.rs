//! Table and row types shared by every reconciliation step.

use crate::constants::NULL_MARKERS;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A single label cell: `Some(1)` asserted, `Some(0)` not asserted, `None` null.
pub type LabelValue = Option<u8>;

/// Rows that carry one [`LabelValue`] per label column of their table.
pub trait Labelled {
    /// Path of the image this row describes.
    fn file_path(&self) -> &str;

    /// Label cells, aligned with [`Table::labels`].
    fn label_values(&self) -> &[LabelValue];

    /// Mutable label cells, aligned with [`Table::labels`].
    fn label_values_mut(&mut self) -> &mut Vec<LabelValue>;

    /// Number of label cells equal to 1.
    fn asserted_count(&self) -> usize {
        self.label_values()
            .iter()
            .filter(|value| is_asserted(**value))
            .count()
    }
}

/// One detection event, before or after collapsing by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetectionRow {
    /// Image path (vendor form on load, absolute local path after correction).
    pub file_path: String,
    /// Record date as written in the detection CSV.
    pub capture_date: String,
    /// Label cells.
    pub labels: Vec<LabelValue>,
}

impl Labelled for DetectionRow {
    fn file_path(&self) -> &str {
        &self.file_path
    }

    fn label_values(&self) -> &[LabelValue] {
        &self.labels
    }

    fn label_values_mut(&mut self) -> &mut Vec<LabelValue> {
        &mut self.labels
    }
}

/// One image after image properties have been joined on.
#[derive(Debug, Clone)]
pub struct ImageRow {
    /// Absolute image path.
    pub file_path: String,
    /// Record date as written in the detection CSV.
    pub capture_date: String,
    /// Label cells.
    pub labels: Vec<LabelValue>,
    /// Grayscale (infrared) flag.
    pub night: Option<u8>,
    /// Mean pixel brightness.
    pub mean_brightness: Option<f64>,
    /// Raw EXIF timestamp from the properties file.
    pub exif_timestamp: Option<String>,
    /// Time of day, set only when the EXIF and record dates agree.
    pub capture_time: Option<NaiveTime>,
}

impl ImageRow {
    /// Build an image row with no properties from a collapsed detection.
    pub fn from_detection(detection: &DetectionRow) -> Self {
        Self {
            file_path: detection.file_path.clone(),
            capture_date: detection.capture_date.clone(),
            labels: detection.labels.clone(),
            night: None,
            mean_brightness: None,
            exif_timestamp: None,
            capture_time: None,
        }
    }
}

// Brightness compares by bit pattern so rows can be hashed for duplicate discarding.
impl PartialEq for ImageRow {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
            && self.capture_date == other.capture_date
            && self.labels == other.labels
            && self.night == other.night
            && self.mean_brightness.map(f64::to_bits) == other.mean_brightness.map(f64::to_bits)
            && self.exif_timestamp == other.exif_timestamp
            && self.capture_time == other.capture_time
    }
}

impl Eq for ImageRow {}

impl Hash for ImageRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_path.hash(state);
        self.capture_date.hash(state);
        self.labels.hash(state);
        self.night.hash(state);
        self.mean_brightness.map(f64::to_bits).hash(state);
        self.exif_timestamp.hash(state);
        self.capture_time.hash(state);
    }
}

impl Labelled for ImageRow {
    fn file_path(&self) -> &str {
        &self.file_path
    }

    fn label_values(&self) -> &[LabelValue] {
        &self.labels
    }

    fn label_values_mut(&mut self) -> &mut Vec<LabelValue> {
        &mut self.labels
    }
}

/// Rows plus the names of their label columns (without the `contains_` prefix).
///
/// Every step takes a table by reference and returns a new one, so earlier
/// stages stay inspectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<R> {
    labels: Vec<String>,
    rows: Vec<R>,
}

/// Detection rows, before property join.
pub type DetectionTable = Table<DetectionRow>;

/// Image rows, after property join.
pub type ImageTable = Table<ImageRow>;

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl<R> Table<R> {
    /// Create a table from label column names and rows.
    pub fn new(labels: Vec<String>, rows: Vec<R>) -> Self {
        Self { labels, rows }
    }

    /// Label column names.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column index of a label.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// A new table with the same label columns and different rows.
    pub fn with_rows<T>(&self, rows: Vec<T>) -> Table<T> {
        Table {
            labels: self.labels.clone(),
            rows,
        }
    }
}

/// How rows sharing a path are reduced to one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Element-wise maximum, ignoring nulls.
    #[default]
    Max,
    /// First non-null value in input order.
    First,
}

impl Aggregation {
    /// Fold `row` into the accumulated group row `acc`.
    pub fn combine(self, acc: &mut DetectionRow, row: &DetectionRow) {
        match self {
            Self::Max => {
                if row.capture_date > acc.capture_date {
                    acc.capture_date.clone_from(&row.capture_date);
                }
                for (value, other) in acc.labels.iter_mut().zip(&row.labels) {
                    *value = merge_max(*value, *other);
                }
            }
            Self::First => {
                if acc.capture_date.is_empty() {
                    acc.capture_date.clone_from(&row.capture_date);
                }
                for (value, other) in acc.labels.iter_mut().zip(&row.labels) {
                    *value = value.or(*other);
                }
            }
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "first" => Ok(Self::First),
            other => Err(format!("unknown aggregation: {other}")),
        }
    }
}

/// Whether a label cell is asserted. Null counts as not asserted.
pub const fn is_asserted(value: LabelValue) -> bool {
    matches!(value, Some(1))
}

/// Null-preserving maximum: null only when both inputs are null.
pub fn merge_max(a: LabelValue, b: LabelValue) -> LabelValue {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Parse a boolean-ish cell.
///
/// Returns `None` when the text is not recognised, `Some(None)` for a null
/// marker.
pub fn parse_label_value(raw: &str) -> Option<LabelValue> {
    let value = raw.trim().to_ascii_lowercase();
    if NULL_MARKERS.contains(&value.as_str()) {
        return Some(None);
    }
    match value.as_str() {
        "1" | "1.0" | "true" => Some(Some(1)),
        "0" | "0.0" | "false" => Some(Some(0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(path: &str, date: &str, labels: Vec<LabelValue>) -> DetectionRow {
        DetectionRow {
            file_path: path.to_string(),
            capture_date: date.to_string(),
            labels,
        }
    }

    #[test]
    fn test_parse_label_value() {
        assert_eq!(parse_label_value("1"), Some(Some(1)));
        assert_eq!(parse_label_value("0.0"), Some(Some(0)));
        assert_eq!(parse_label_value("True"), Some(Some(1)));
        assert_eq!(parse_label_value(""), Some(None));
        assert_eq!(parse_label_value("NaN"), Some(None));
        assert_eq!(parse_label_value("2"), None);
        assert_eq!(parse_label_value("deer"), None);
    }

    #[test]
    fn test_merge_max_preserves_null() {
        assert_eq!(merge_max(None, None), None);
        assert_eq!(merge_max(None, Some(0)), Some(0));
        assert_eq!(merge_max(Some(1), None), Some(1));
        assert_eq!(merge_max(Some(0), Some(1)), Some(1));
    }

    #[test]
    fn test_aggregation_max() {
        let mut acc = row("a.jpg", "01-Jan-20", vec![Some(1), None, Some(0)]);
        Aggregation::Max.combine(
            &mut acc,
            &row("a.jpg", "02-Jan-20", vec![Some(0), None, Some(1)]),
        );
        assert_eq!(acc.labels, vec![Some(1), None, Some(1)]);
        assert_eq!(acc.capture_date, "02-Jan-20");
    }

    #[test]
    fn test_aggregation_first() {
        let mut acc = row("a.jpg", "01-Jan-20", vec![None, Some(0)]);
        Aggregation::First.combine(&mut acc, &row("a.jpg", "02-Jan-20", vec![Some(1), Some(1)]));
        assert_eq!(acc.labels, vec![Some(1), Some(0)]);
        assert_eq!(acc.capture_date, "01-Jan-20");
    }

    #[test]
    fn test_aggregation_from_str() {
        assert_eq!("max".parse::<Aggregation>().ok(), Some(Aggregation::Max));
        assert_eq!("FIRST".parse::<Aggregation>().ok(), Some(Aggregation::First));
        assert!("mean".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_asserted_count_ignores_null() {
        let r = row("a.jpg", "", vec![Some(1), None, Some(1), Some(0)]);
        assert_eq!(r.asserted_count(), 2);
    }

    #[test]
    fn test_image_row_equality_uses_brightness_bits() {
        let detection = row("a.jpg", "01-Jan-20", vec![Some(1)]);
        let mut a = ImageRow::from_detection(&detection);
        a.mean_brightness = Some(0.5);
        let b = a.clone();
        assert_eq!(a, b);
        let mut c = a.clone();
        c.mean_brightness = Some(0.25);
        assert_ne!(a, c);
    }
}
