//! Whole-table operations: missing-file filtering, duplicate discarding and
//! grouping by path.
//!
//! Each operation logs one summary warning when it drops rows and records
//! the count in the run [`Report`].

use crate::output::progress;
use crate::pipeline::Report;
use crate::table::{Aggregation, DetectionRow, DetectionTable, Labelled, Table};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use tracing::{info, warn};

/// Keep rows whose file exists and is non-empty.
///
/// A missing file is a data condition, never an error.
pub fn discard_missing_files<R: Labelled + Clone>(
    table: &Table<R>,
    show_progress: bool,
    report: &mut Report,
) -> Table<R> {
    info!("Discarding missing files");

    let pb = progress::create_row_progress(table.len(), "files checked", show_progress);
    let rows: Vec<R> = table
        .rows()
        .iter()
        .filter(|row| {
            progress::inc_progress(pb.as_ref());
            is_nonempty_file(Path::new(row.file_path()))
        })
        .cloned()
        .collect();
    progress::finish_progress(pb, "Files checked");

    let discarded = table.len() - rows.len();
    if discarded > 0 {
        warn!("{discarded} records discarded because file does not exist or is empty");
    }
    report.missing_files += discarded;

    table.with_rows(rows)
}

fn is_nonempty_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Remove exact full-row duplicates, keeping the first occurrence.
///
/// Remaining rows keep their first-seen order, so the operation is
/// idempotent.
pub fn discard_duplicate_rows<R: Clone + Eq + Hash>(
    table: &Table<R>,
    report: &mut Report,
) -> Table<R> {
    info!("Discarding duplicate rows");

    let mut seen = HashSet::with_capacity(table.len());
    let rows: Vec<R> = table
        .rows()
        .iter()
        .filter(|row| seen.insert(*row))
        .cloned()
        .collect();

    let duplicates = table.len() - rows.len();
    if duplicates > 0 {
        warn!("{duplicates} duplicate records discarded");
    }
    report.duplicates_removed += duplicates;

    table.with_rows(rows)
}

/// Collapse rows sharing a path into one row per path.
///
/// Groups appear in first-seen order. This is how two detections in one
/// photo become one row with two labels set.
pub fn group_by_path(
    table: &DetectionTable,
    aggregation: Aggregation,
    report: &mut Report,
) -> DetectionTable {
    info!("Combining records by filepath ({aggregation})");

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(table.len());
    let mut groups: Vec<DetectionRow> = Vec::with_capacity(table.len());

    for row in table.rows() {
        if let Some(&idx) = index.get(row.file_path.as_str()) {
            aggregation.combine(&mut groups[idx], row);
        } else {
            index.insert(row.file_path.as_str(), groups.len());
            groups.push(row.clone());
        }
    }

    let combined = table.len() - groups.len();
    if combined > 0 {
        warn!("{combined} records combined with other records for the same file");
    }
    report.rows_combined += combined;

    table.with_rows(groups)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn row(path: &str, labels: Vec<Option<u8>>) -> DetectionRow {
        DetectionRow {
            file_path: path.to_string(),
            capture_date: "01-Jan-20".to_string(),
            labels,
        }
    }

    fn table(rows: Vec<DetectionRow>) -> DetectionTable {
        DetectionTable::new(vec!["deer".to_string(), "fox".to_string()], rows)
    }

    #[test]
    fn test_discard_missing_files() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("present.jpg");
        let empty = dir.path().join("empty.jpg");
        std::fs::write(&present, b"jpeg").unwrap();
        std::fs::write(&empty, b"").unwrap();
        let missing = dir.path().join("missing.jpg");

        let input = table(vec![
            row(present.to_str().unwrap(), vec![Some(1), Some(0)]),
            row(empty.to_str().unwrap(), vec![Some(1), Some(0)]),
            row(missing.to_str().unwrap(), vec![Some(0), Some(1)]),
        ]);

        let mut report = Report::default();
        let kept = discard_missing_files(&input, false, &mut report);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.rows()[0].file_path, present.to_str().unwrap());
        assert_eq!(report.missing_files, 2);
    }

    #[test]
    fn test_discard_duplicate_rows_keeps_first_seen_order() {
        let input = table(vec![
            row("b.jpg", vec![Some(1), Some(0)]),
            row("a.jpg", vec![Some(0), Some(1)]),
            row("b.jpg", vec![Some(1), Some(0)]),
            row("a.jpg", vec![Some(1), Some(1)]),
        ]);

        let mut report = Report::default();
        let deduped = discard_duplicate_rows(&input, &mut report);
        let paths: Vec<_> = deduped.rows().iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(paths, ["b.jpg", "a.jpg", "a.jpg"]);
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn test_discard_duplicate_rows_is_idempotent() {
        let input = table(vec![
            row("a.jpg", vec![Some(1), None]),
            row("a.jpg", vec![Some(1), None]),
            row("c.jpg", vec![None, None]),
            row("c.jpg", vec![None, None]),
            row("c.jpg", vec![Some(0), None]),
        ]);

        let mut report = Report::default();
        let once = discard_duplicate_rows(&input, &mut report);
        let twice = discard_duplicate_rows(&once, &mut report);
        assert_eq!(once, twice);
        assert_eq!(report.duplicates_removed, 2);
    }

    #[test]
    fn test_group_by_path_collapses_to_one_row_per_path() {
        let input = table(vec![
            row("a.jpg", vec![Some(1), Some(0)]),
            row("b.jpg", vec![Some(0), None]),
            row("a.jpg", vec![Some(0), Some(1)]),
            row("c.jpg", vec![None, None]),
            row("b.jpg", vec![None, None]),
        ]);
        let distinct: BTreeSet<_> = input.rows().iter().map(|r| r.file_path.clone()).collect();

        let mut report = Report::default();
        let grouped = group_by_path(&input, Aggregation::Max, &mut report);

        assert_eq!(grouped.len(), distinct.len());
        assert_eq!(report.rows_combined, 2);
        assert_eq!(grouped.rows()[0].file_path, "a.jpg");
        assert_eq!(grouped.rows()[0].labels, vec![Some(1), Some(1)]);
        assert_eq!(grouped.rows()[1].labels, vec![Some(0), None]);
        assert_eq!(grouped.rows()[2].labels, vec![None, None]);
    }

    #[test]
    fn test_group_by_path_without_repeats_changes_nothing() {
        let input = table(vec![
            row("a.jpg", vec![Some(1), Some(0)]),
            row("b.jpg", vec![Some(0), Some(1)]),
        ]);

        let mut report = Report::default();
        let grouped = group_by_path(&input, Aggregation::Max, &mut report);
        assert_eq!(grouped, input);
        assert_eq!(report.rows_combined, 0);
    }
}
