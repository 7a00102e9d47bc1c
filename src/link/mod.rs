//! Symlink directories of images grouped by label.
//!
//! For every canonical label, `outdir/<label>/` gets one symlink per image
//! that asserts the label. Labels are reconciled the same way as in the
//! clean pipeline first, so an image lands in a single directory unless
//! unresolved rows are kept.

use crate::constants::formats;
use crate::error::{Error, Result};
use crate::labels::{LabelMap, PriorityRuleSet, resolve_or_drop};
use crate::output::{progress, read_labels_csv};
use crate::pipeline::Report;
use crate::table::{ImageTable, Labelled, discard_duplicate_rows, is_asserted};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for building link directories.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Directory to create; must not exist.
    pub outdir: PathBuf,
    /// Keep images that still assert several labels.
    pub keep_unresolved: bool,
    /// `chrono` format of the labels CSV `time` column.
    pub time_format: String,
    /// Show progress bars.
    pub show_progress: bool,
}

impl LinkOptions {
    /// Options with defaults for everything but the output directory.
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            keep_unresolved: false,
            time_format: formats::OUTPUT_TIME.to_string(),
            show_progress: false,
        }
    }
}

/// Result of a link run.
#[derive(Debug, Clone, Default)]
pub struct LinkSummary {
    /// Links created per canonical label.
    pub links: BTreeMap<String, usize>,
    /// What reconciliation dropped or altered.
    pub report: Report,
}

impl LinkSummary {
    /// Total links created.
    pub fn total(&self) -> usize {
        self.links.values().sum()
    }
}

/// Reconcile a cleaned labels CSV and link its images by label.
pub fn link_images_by_label(
    labels_csv: &Path,
    labelmap: Option<BTreeMap<String, String>>,
    priority_rules: Option<&[String]>,
    options: &LinkOptions,
) -> Result<LinkSummary> {
    if options.outdir.exists() {
        return Err(Error::LinkDirExists {
            path: options.outdir.clone(),
        });
    }

    let table = read_labels_csv(labels_csv, &options.time_format)?;
    let mut report = Report {
        records_loaded: table.len(),
        ..Report::default()
    };

    let labelmap = LabelMap::build(
        labelmap,
        table.labels().iter().map(String::as_str),
        &mut report,
    );
    let table = labelmap.apply(&table)?;
    let table = discard_duplicate_rows(&table, &mut report);

    let all_labels: BTreeSet<String> = table.labels().iter().cloned().collect();
    let table = match priority_rules {
        Some(lines) => PriorityRuleSet::parse(lines, &all_labels)?.apply(&table, &mut report),
        None => table,
    };
    let table = resolve_or_drop(&table, options.keep_unresolved, &mut report);
    report.rows_written = table.len();

    let links = create_links(&table, &labelmap, &options.outdir, options.show_progress)?;
    info!("{} links created in {}", links.values().sum::<usize>(), options.outdir.display());
    Ok(LinkSummary { links, report })
}

/// Create `outdir/<label>/<file name>` links for every canonical label that
/// has a column in `table`.
pub fn create_links(
    table: &ImageTable,
    labelmap: &LabelMap,
    outdir: &Path,
    show_progress: bool,
) -> Result<BTreeMap<String, usize>> {
    if outdir.exists() {
        return Err(Error::LinkDirExists {
            path: outdir.to_path_buf(),
        });
    }

    let mut links = BTreeMap::new();
    for label in labelmap.canonical_labels() {
        let Some(col) = table.label_index(label) else {
            continue;
        };

        let linkdir = outdir.join(label);
        std::fs::create_dir_all(&linkdir).map_err(|e| Error::OutputDirCreateFailed {
            path: linkdir.clone(),
            source: e,
        })?;

        let targets: Vec<&str> = table
            .rows()
            .iter()
            .filter(|row| is_asserted(row.label_values()[col]))
            .map(|row| row.file_path.as_str())
            .collect();
        info!(
            "Creating {} links for label {label} in {}",
            targets.len(),
            linkdir.display()
        );

        let pb = progress::create_row_progress(targets.len(), "links", show_progress);
        for target in &targets {
            let target = Path::new(target);
            let Some(file_name) = target.file_name() else {
                continue;
            };
            let link = linkdir.join(file_name);
            symlink(target, &link).map_err(|e| Error::LinkCreate {
                target: target.to_path_buf(),
                link: link.clone(),
                source: e,
            })?;
            progress::inc_progress(pb.as_ref());
        }
        progress::finish_progress(pb, &format!("Linked {label}"));

        links.insert(label.to_string(), targets.len());
    }

    Ok(links)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
