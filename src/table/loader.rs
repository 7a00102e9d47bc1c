//! Detection CSV loading.
//!
//! Reads one or more vendor detection exports and concatenates them into a
//! single wide [`DetectionTable`]. Uses the `csv` crate for parsing; headers
//! are dynamic because every `contains_<label>` column is a label.

use crate::constants::{LABEL_PREFIX, detection_columns};
use crate::error::{Error, Result};
use crate::table::{DetectionRow, DetectionTable, LabelValue, merge_max, parse_label_value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One CSV line before label columns are unified across files.
#[derive(Debug)]
struct RawRecord {
    vendor_path: String,
    capture_date: String,
    raw_label: Option<String>,
    wide: BTreeMap<String, LabelValue>,
}

/// Load and concatenate detection CSVs.
///
/// Recognised columns:
/// - `FilePath`: vendor directory or full vendor path (required)
/// - `FileName`: appended to `FilePath` with `\` when present
/// - `ImageDate`: record date (required)
/// - `ShortName`: long-form label, dummy-coded into one column per value
/// - `contains_<label>`: wide label columns
///
/// A wide column absent from one file is null for that file's rows. Label
/// columns come out sorted by name.
pub fn load_detections(paths: &[PathBuf]) -> Result<DetectionTable> {
    if paths.is_empty() {
        return Err(Error::NoDetectionFiles);
    }

    info!("Loading {} detection file(s)", paths.len());

    let mut records = Vec::new();
    for path in paths {
        let file_records = read_detection_file(path)?;
        debug!("{} records in {}", file_records.len(), path.display());
        records.extend(file_records);
    }

    let table = assemble(records);
    info!(
        "{} records found with {} raw label(s)",
        table.len(),
        table.labels().len()
    );
    Ok(table)
}

fn read_detection_file(path: &Path) -> Result<Vec<RawRecord>> {
    let read_error = |source| Error::DetectionRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let headers = reader.headers().map_err(read_error)?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| {
        column(name).ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    };

    let vendor_idx = required(detection_columns::VENDOR_PATH)?;
    let date_idx = required(detection_columns::RECORD_DATE)?;
    let file_name_idx = column(detection_columns::FILE_NAME);
    let raw_label_idx = column(detection_columns::RAW_LABEL);
    let wide_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            header
                .strip_prefix(LABEL_PREFIX)
                .map(|label| (idx, label.to_string()))
        })
        .collect();

    let mut records = Vec::new();

    for (row_num, result) in reader.records().enumerate() {
        let record = result.map_err(read_error)?;
        let line = record
            .position()
            .map_or(row_num as u64 + 2, csv::Position::line);
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let mut vendor_path = field(vendor_idx).to_string();
        if let Some(name) = file_name_idx.map(field).filter(|name| !name.is_empty()) {
            if !vendor_path.is_empty() && !vendor_path.ends_with(['\\', '/']) {
                vendor_path.push('\\');
            }
            vendor_path.push_str(name);
        }

        let mut wide = BTreeMap::new();
        for (idx, label) in &wide_columns {
            let raw = field(*idx);
            let value = parse_label_value(raw).ok_or_else(|| Error::InvalidLabelValue {
                path: path.to_path_buf(),
                column: format!("{LABEL_PREFIX}{label}"),
                line,
                value: raw.to_string(),
            })?;
            wide.insert(label.clone(), value);
        }

        records.push(RawRecord {
            vendor_path,
            capture_date: field(date_idx).to_string(),
            raw_label: raw_label_idx
                .map(field)
                .filter(|label| !label.is_empty())
                .map(ToString::to_string),
            wide,
        });
    }

    Ok(records)
}

/// Unify label columns across every record.
fn assemble(records: Vec<RawRecord>) -> DetectionTable {
    let dummy_labels: BTreeSet<String> = records
        .iter()
        .filter_map(|record| record.raw_label.clone())
        .collect();
    let labels: Vec<String> = records
        .iter()
        .flat_map(|record| record.wide.keys().cloned())
        .chain(dummy_labels.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = records
        .into_iter()
        .map(|record| {
            let values = labels
                .iter()
                .map(|label| {
                    let dummy = dummy_labels
                        .contains(label)
                        .then(|| u8::from(record.raw_label.as_deref() == Some(label.as_str())));
                    let wide = record.wide.get(label).copied().flatten();
                    merge_max(dummy, wide)
                })
                .collect();
            DetectionRow {
                file_path: record.vendor_path,
                capture_date: record.capture_date,
                labels: values,
            }
        })
        .collect();

    DetectionTable::new(labels, rows)
}
