//! Per-run diagnostics.
//!
//! Every step adds its counts here instead of only logging them, so callers
//! and tests can inspect exactly what was dropped or altered.

use serde::Serialize;
use tracing::info;

/// Counts of every dropped or altered row category in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Detection records read from the input CSVs.
    pub records_loaded: usize,
    /// Rows dropped because the image file was missing or empty.
    pub missing_files: usize,
    /// Raw labels with no mapping, kept unchanged.
    pub unmapped_labels: Vec<String>,
    /// Exact duplicate rows removed.
    pub duplicates_removed: usize,
    /// Rows folded into another row for the same file.
    pub rows_combined: usize,
    /// Detections with no image properties row.
    pub unmatched_detections: usize,
    /// Image properties rows with no detection.
    pub unmatched_properties: usize,
    /// Extra image properties rows for an already-seen path.
    pub duplicate_properties: usize,
    /// Rows whose EXIF date disagreed with the record date.
    pub date_mismatches: usize,
    /// Rows without an EXIF timestamp.
    pub missing_timestamps: usize,
    /// Rows whose record date or EXIF timestamp could not be parsed.
    pub unparsable_timestamps: usize,
    /// Priority rules that cleared at least one label.
    pub rule_applications: Vec<RuleApplication>,
    /// Multi-label rows dropped.
    pub unresolved_dropped: usize,
    /// Multi-label rows retained because `keep_unresolved` was set.
    pub unresolved_kept: usize,
    /// Rows in the final table.
    pub rows_written: usize,
}

/// One priority rule's effect on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleApplication {
    /// Label that was kept.
    pub winner: String,
    /// Label that was cleared.
    pub loser: String,
    /// Rows where the loser was cleared.
    pub rows: usize,
}

impl Report {
    /// Total labels cleared by priority rules.
    pub fn labels_cleared(&self) -> usize {
        self.rule_applications.iter().map(|app| app.rows).sum()
    }

    /// Log a one-line summary of the run at info level.
    pub fn log_summary(&self) {
        info!(
            "Summary: {} loaded, {} missing, {} duplicates, {} combined, {} unmatched, {} date mismatches, {} labels cleared, {} unresolved dropped, {} written",
            self.records_loaded,
            self.missing_files,
            self.duplicates_removed,
            self.rows_combined,
            self.unmatched_detections,
            self.date_mismatches,
            self.labels_cleared(),
            self.unresolved_dropped,
            self.rows_written
        );
    }
}
