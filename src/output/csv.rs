//! Cleaned-table CSV writer and reader.

use crate::constants::{LABEL_PREFIX, UTF8_BOM, formats, output_columns};
use crate::error::{Error, Result};
use crate::table::{DetectionRow, ImageRow, ImageTable, LabelValue, parse_label_value};
use chrono::NaiveTime;
use std::fs::File;
use std::fmt::Write as _;
use std::io::{BufWriter, Write as _};
use std::path::Path;
use tracing::info;

/// Options for the cleaned CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Prefix the file with a UTF-8 byte order mark.
    pub bom: bool,
    /// `chrono` format of the `time` column.
    pub time_format: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            bom: false,
            time_format: formats::OUTPUT_TIME.to_string(),
        }
    }
}

fn header(table: &ImageTable) -> Vec<String> {
    [
        output_columns::FILEPATH,
        output_columns::DATE,
        output_columns::TIME,
        output_columns::NIGHT,
        output_columns::MEAN_BRIGHTNESS,
    ]
    .into_iter()
    .map(ToString::to_string)
    .chain(
        table
            .labels()
            .iter()
            .map(|label| format!("{LABEL_PREFIX}{label}")),
    )
    .collect()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render a time of day with a `chrono` format.
///
/// # Errors
///
/// [`Error::TimeFormat`] when the format holds specifiers a bare time cannot
/// fill, such as `%Y`.
pub fn format_time(time: NaiveTime, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", time.format(format)).map_err(|_| Error::TimeFormat {
        format: format.to_string(),
    })?;
    Ok(out)
}

// Floats keep a fractional part, so 12.0 is written as "12.0".
fn format_brightness(value: f64) -> String {
    format!("{value:?}")
}

fn record(row: &ImageRow, time_format: &str) -> Result<Vec<String>> {
    let time = row
        .capture_time
        .map(|time| format_time(time, time_format))
        .transpose()?;

    let mut record = vec![
        row.file_path.clone(),
        row.capture_date.clone(),
        time.unwrap_or_default(),
        optional(row.night),
        row.mean_brightness.map(format_brightness).unwrap_or_default(),
    ];
    record.extend(row.labels.iter().map(|value| optional(*value)));
    Ok(record)
}

/// Write the cleaned table, creating the parent directory if needed.
///
/// Null cells are written empty. Every row is rendered before the file is
/// created, so a formatting error leaves no output behind. Returns the number
/// of rows written.
pub fn write_csv(table: &ImageTable, path: &Path, options: &CsvOptions) -> Result<usize> {
    let records = table
        .rows()
        .iter()
        .map(|row| record(row, &options.time_format))
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let write_error = |source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let create_error = |source| Error::OutputCreate {
        path: path.to_path_buf(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(create_error)?);
    if options.bom {
        file.write_all(UTF8_BOM).map_err(create_error)?;
    }

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(header(table)).map_err(write_error)?;
    for record in &records {
        writer.write_record(record).map_err(write_error)?;
    }
    writer.flush().map_err(create_error)?;

    info!("{} rows written to {}", table.len(), path.display());
    Ok(table.len())
}

/// Read a cleaned table written by [`write_csv`].
///
/// Times that do not parse with `time_format` are read as empty.
pub fn read_labels_csv(path: &Path, time_format: &str) -> Result<ImageTable> {
    let read_error = |source| Error::LabelsRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let headers = reader.headers().map_err(read_error)?.clone();
    let required = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let optional_column = |name: &str| headers.iter().position(|h| h == name);

    let path_idx = required(output_columns::FILEPATH)?;
    let date_idx = optional_column(output_columns::DATE);
    let time_idx = optional_column(output_columns::TIME);
    let night_idx = optional_column(output_columns::NIGHT);
    let brightness_idx = optional_column(output_columns::MEAN_BRIGHTNESS);
    let (label_idx, labels): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| h.strip_prefix(LABEL_PREFIX).map(|l| (idx, l.to_string())))
        .unzip();

    let mut rows = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let record = result.map_err(read_error)?;
        let line = record
            .position()
            .map_or(row_num as u64 + 2, csv::Position::line);
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
        let flag = |idx: usize| -> Result<LabelValue> {
            let raw = field(Some(idx));
            parse_label_value(raw).ok_or_else(|| Error::InvalidLabelValue {
                path: path.to_path_buf(),
                column: headers.get(idx).unwrap_or_default().to_string(),
                line,
                value: raw.to_string(),
            })
        };

        let detection = DetectionRow {
            file_path: field(Some(path_idx)).to_string(),
            capture_date: field(date_idx).to_string(),
            labels: label_idx.iter().map(|&idx| flag(idx)).collect::<Result<_>>()?,
        };
        rows.push(ImageRow {
            night: night_idx.map(flag).transpose()?.flatten(),
            mean_brightness: field(brightness_idx).parse().ok(),
            capture_time: NaiveTime::parse_from_str(field(time_idx), time_format).ok(),
            ..ImageRow::from_detection(&detection)
        });
    }

    Ok(ImageTable::new(labels, rows))
}
