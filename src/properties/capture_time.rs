//! Capture time extraction.
//!
//! The record date from the detection CSV is trusted over the camera clock.
//! A time of day is only taken from the EXIF timestamp when both dates agree.

use crate::constants::formats;
use crate::pipeline::Report;
use crate::table::{ImageRow, ImageTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

/// Formats used to parse record dates and EXIF timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats {
    /// `chrono` format of the record date.
    pub record_date: String,
    /// `chrono` format of the EXIF timestamp.
    pub exif_timestamp: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            record_date: formats::RECORD_DATE.to_string(),
            exif_timestamp: formats::EXIF_TIMESTAMP.to_string(),
        }
    }
}

/// Outcome of extracting the capture time of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTime {
    /// Dates agree; time of day from the EXIF timestamp.
    Matched(NaiveTime),
    /// EXIF date differs from the record date.
    DateMismatch {
        /// Date from the detection record.
        record: NaiveDate,
        /// Date from the EXIF timestamp.
        exif: NaiveDate,
    },
    /// No EXIF timestamp.
    MissingTimestamp,
    /// Record date or EXIF timestamp did not parse.
    Unparsable,
}

impl CaptureTime {
    /// Time of day, if one was extracted.
    pub const fn time(self) -> Option<NaiveTime> {
        match self {
            Self::Matched(time) => Some(time),
            _ => None,
        }
    }
}

/// Compare the record date with the EXIF timestamp's date.
pub fn extract_capture_time(
    record_date: &str,
    exif_timestamp: Option<&str>,
    date_formats: &DateFormats,
) -> CaptureTime {
    let Some(exif_timestamp) = exif_timestamp else {
        return CaptureTime::MissingTimestamp;
    };

    let record = NaiveDate::parse_from_str(record_date.trim(), &date_formats.record_date);
    let exif = NaiveDateTime::parse_from_str(exif_timestamp.trim(), &date_formats.exif_timestamp);

    match (record, exif) {
        (Ok(record), Ok(exif)) if record == exif.date() => CaptureTime::Matched(exif.time()),
        (Ok(record), Ok(exif)) => CaptureTime::DateMismatch {
            record,
            exif: exif.date(),
        },
        _ => CaptureTime::Unparsable,
    }
}

/// Fill in `capture_time` for every row.
///
/// Each mismatched or unparsable row gets its own warning.
pub fn assign_capture_times(
    table: &ImageTable,
    date_formats: &DateFormats,
    report: &mut Report,
) -> ImageTable {
    info!("Extracting capture times");

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let outcome = extract_capture_time(
                &row.capture_date,
                row.exif_timestamp.as_deref(),
                date_formats,
            );
            match outcome {
                CaptureTime::Matched(_) => {}
                CaptureTime::DateMismatch { record, exif } => {
                    warn!(
                        "EXIF date {exif} does not match record date {record} for {}; time left empty",
                        row.file_path
                    );
                    report.date_mismatches += 1;
                }
                CaptureTime::MissingTimestamp => report.missing_timestamps += 1,
                CaptureTime::Unparsable => {
                    warn!(
                        "Could not parse record date '{}' or EXIF timestamp '{}' for {}",
                        row.capture_date,
                        row.exif_timestamp.as_deref().unwrap_or_default(),
                        row.file_path
                    );
                    report.unparsable_timestamps += 1;
                }
            }
            ImageRow {
                capture_time: outcome.time(),
                ..row.clone()
            }
        })
        .collect();

    table.with_rows(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::table::DetectionRow;

    #[test]
    fn test_matching_dates_give_time() {
        let outcome = extract_capture_time(
            "01-Jan-20",
            Some("2020-01-01 08:15:00"),
            &DateFormats::default(),
        );
        assert_eq!(
            outcome,
            CaptureTime::Matched(NaiveTime::from_hms_opt(8, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_date_mismatch_gives_no_time() {
        let outcome = extract_capture_time(
            "01-Jan-20",
            Some("2020-01-02 08:15:00"),
            &DateFormats::default(),
        );
        assert!(matches!(outcome, CaptureTime::DateMismatch { .. }));
        assert_eq!(outcome.time(), None);
    }

    #[test]
    fn test_missing_and_unparsable() {
        let formats = DateFormats::default();
        assert_eq!(
            extract_capture_time("01-Jan-20", None, &formats),
            CaptureTime::MissingTimestamp
        );
        assert_eq!(
            extract_capture_time("not a date", Some("2020-01-01 08:15:00"), &formats),
            CaptureTime::Unparsable
        );
        assert_eq!(
            extract_capture_time("01-Jan-20", Some("yesterday"), &formats),
            CaptureTime::Unparsable
        );
    }

    #[test]
    fn test_assign_capture_times_counts_outcomes() {
        let make = |path: &str, exif: Option<&str>| ImageRow {
            exif_timestamp: exif.map(ToString::to_string),
            ..ImageRow::from_detection(&DetectionRow {
                file_path: path.to_string(),
                capture_date: "01-Jan-20".to_string(),
                labels: vec![Some(1)],
            })
        };
        let table = ImageTable::new(
            vec!["deer".to_string()],
            vec![
                make("a.jpg", Some("2020-01-01 23:59:59")),
                make("b.jpg", Some("2020-01-02 08:15:00")),
                make("c.jpg", None),
            ],
        );

        let mut report = Report::default();
        let timed = assign_capture_times(&table, &DateFormats::default(), &mut report);
        assert_eq!(
            timed.rows()[0].capture_time,
            NaiveTime::from_hms_opt(23, 59, 59)
        );
        assert_eq!(timed.rows()[1].capture_time, None);
        assert_eq!(timed.rows()[2].capture_time, None);
        assert_eq!(report.date_mismatches, 1);
        assert_eq!(report.missing_timestamps, 1);
    }
}
