//! Raw label to canonical label mapping.

use crate::constants::LABEL_PREFIX;
use crate::error::{Error, Result};
use crate::pipeline::Report;
use crate::table::{LabelValue, Labelled, Table, merge_max};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

/// Mapping from raw label names to canonical label names.
///
/// Total over every label present in the input; immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<String, String>,
}

impl LabelMap {
    /// Read a JSON object of `raw label -> canonical label`.
    pub fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelMapRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| Error::LabelMapParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Build a label map, adding an identity entry for every present label
    /// the supplied mapping does not cover.
    pub fn build<'a, I>(
        raw_mapping: Option<BTreeMap<String, String>>,
        labels_present: I,
        report: &mut Report,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries = raw_mapping.unwrap_or_default();

        for label in labels_present {
            if !entries.contains_key(label) {
                warn!("No label mapping was provided for {label}, so it will be kept unchanged");
                report.unmapped_labels.push(label.to_string());
                entries.insert(label.to_string(), label.to_string());
            }
        }

        Self { entries }
    }

    /// Canonical name for a raw label; unknown labels map to themselves.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.entries.get(raw).map_or(raw, String::as_str)
    }

    /// Every canonical label in the map's codomain.
    pub fn canonical_labels(&self) -> BTreeSet<&str> {
        self.entries.values().map(String::as_str).collect()
    }

    /// Rename label columns to canonical names, merging columns that land on
    /// the same name.
    ///
    /// A merged cell is the max of its contributors and stays null when every
    /// contributor is null. The null count is checked after the merge.
    pub fn apply<R: Labelled + Clone>(&self, table: &Table<R>) -> Result<Table<R>> {
        let merged_labels: Vec<String> = table
            .labels()
            .iter()
            .map(|label| self.canonical(label))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let contributors: Vec<Vec<usize>> = merged_labels
            .iter()
            .map(|target| {
                table
                    .labels()
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| self.canonical(label) == target.as_str())
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        for (target, sources) in merged_labels.iter().zip(&contributors) {
            if sources.len() > 1 {
                let names: Vec<String> = sources
                    .iter()
                    .map(|&idx| format!("{LABEL_PREFIX}{}", table.labels()[idx]))
                    .collect();
                info!("Merging {} into {LABEL_PREFIX}{target}", names.join(", "));
            }
        }

        let mut all_null_before = vec![0usize; merged_labels.len()];
        let mut rows = Vec::with_capacity(table.len());

        for row in table.rows() {
            let values = row.label_values();
            let mut merged: Vec<LabelValue> = Vec::with_capacity(merged_labels.len());
            for (col, sources) in contributors.iter().enumerate() {
                if sources.iter().all(|&idx| values[idx].is_none()) {
                    all_null_before[col] += 1;
                }
                merged.push(
                    sources
                        .iter()
                        .fold(None, |acc, &idx| merge_max(acc, values[idx])),
                );
            }

            let mut row = row.clone();
            *row.label_values_mut() = merged;
            rows.push(row);
        }

        let merged_table = Table::new(merged_labels, rows);
        check_null_preservation(&merged_table, &all_null_before)?;
        Ok(merged_table)
    }
}

/// Compare per-column all-null counts from before a merge with the nulls left after it.
fn check_null_preservation<R: Labelled>(table: &Table<R>, all_null_before: &[usize]) -> Result<()> {
    for (col, (label, &before)) in table.labels().iter().zip(all_null_before).enumerate() {
        let after = table
            .rows()
            .iter()
            .filter(|row| row.label_values()[col].is_none())
            .count();
        if after != before {
            return Err(Error::NullPreservationViolated {
                label: label.clone(),
                before,
                after,
            });
        }
    }
    Ok(())
}
