//! End-to-end reconciliation of detections into one clean row per image.

use crate::constants::DEFAULT_PATH_PREFIX_SEGMENTS;
use crate::error::Result;
use crate::labels::{LabelMap, PriorityRuleSet, resolve_or_drop};
use crate::pipeline::Report;
use crate::properties::{
    DateFormats, ImageProperties, assign_capture_times, join_properties, read_image_properties,
    without_properties,
};
use crate::table::{
    Aggregation, DetectionTable, ImageTable, correct_file_paths, discard_duplicate_rows,
    discard_missing_files, group_by_path, load_detections,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::info;

/// Options that shape a reconciliation run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Local directory the vendor paths are rebased onto.
    pub image_dir: PathBuf,
    /// Leading vendor path segments to drop.
    pub path_prefix_segments: usize,
    /// Keep rows that still assert several labels after priority rules.
    pub keep_unresolved: bool,
    /// How rows for the same image are combined.
    pub aggregation: Aggregation,
    /// Record date and EXIF timestamp formats.
    pub date_formats: DateFormats,
    /// Show progress bars.
    pub show_progress: bool,
}

impl PipelineOptions {
    /// Options with defaults for everything but the image directory.
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            path_prefix_segments: DEFAULT_PATH_PREFIX_SEGMENTS,
            keep_unresolved: false,
            aggregation: Aggregation::default(),
            date_formats: DateFormats::default(),
            show_progress: false,
        }
    }
}

/// Files the pipeline reads its inputs from.
#[derive(Debug, Clone, Default)]
pub struct InputSources {
    /// Detection CSVs.
    pub detections: Vec<PathBuf>,
    /// Image properties CSV.
    pub image_properties: Option<PathBuf>,
    /// Label map JSON.
    pub labelmap: Option<PathBuf>,
    /// Priority rules text file.
    pub priority_rules: Option<PathBuf>,
}

/// Loaded pipeline inputs.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Raw detections, vendor paths not yet corrected.
    pub detections: DetectionTable,
    /// Image properties, paths already absolute.
    pub image_properties: Option<Vec<ImageProperties>>,
    /// Raw to canonical label mapping.
    pub labelmap: Option<BTreeMap<String, String>>,
    /// Priority rule lines.
    pub priority_rules: Option<Vec<String>>,
}

impl PipelineInputs {
    /// Read every input file. Fails before any reconciliation step runs.
    pub fn load(sources: &InputSources) -> Result<Self> {
        Ok(Self {
            detections: load_detections(&sources.detections)?,
            image_properties: sources
                .image_properties
                .as_deref()
                .map(read_image_properties)
                .transpose()?,
            labelmap: sources
                .labelmap
                .as_deref()
                .map(LabelMap::load)
                .transpose()?,
            priority_rules: sources
                .priority_rules
                .as_deref()
                .map(PriorityRuleSet::read_rule_file)
                .transpose()?,
        })
    }
}

/// Output of a reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Final table, one row per surviving image.
    pub table: ImageTable,
    /// Label map that was applied.
    pub labelmap: LabelMap,
    /// Concrete priority rules that were applied.
    pub priority_rules: PriorityRuleSet,
    /// What every step dropped or altered.
    pub report: Report,
}

/// Runs the reconciliation steps in their fixed order.
///
/// Duplicates are discarded before grouping so accidental copies are not
/// read as separate detections. Labels are mapped before grouping so rows
/// aggregate over canonical columns. Priority rules run after grouping so
/// every candidate label of an image is present on its single row.
#[derive(Debug, Clone)]
pub struct ReconciliationPipeline {
    options: PipelineOptions,
}

impl ReconciliationPipeline {
    /// Create a pipeline.
    pub const fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Reconcile loaded inputs.
    ///
    /// Rule errors abort the run before any row is grouped or joined.
    pub fn run(&self, inputs: &PipelineInputs) -> Result<Reconciled> {
        let options = &self.options;
        let mut report = Report {
            records_loaded: inputs.detections.len(),
            ..Report::default()
        };

        let table = correct_file_paths(
            &inputs.detections,
            &options.image_dir,
            options.path_prefix_segments,
        );
        let table = discard_missing_files(&table, options.show_progress, &mut report);

        let labelmap = LabelMap::build(
            inputs.labelmap.clone(),
            table.labels().iter().map(String::as_str),
            &mut report,
        );
        let table = labelmap.apply(&table)?;

        let all_labels: BTreeSet<String> = table.labels().iter().cloned().collect();
        let priority_rules = match &inputs.priority_rules {
            Some(lines) => PriorityRuleSet::parse(lines, &all_labels)?,
            None => PriorityRuleSet::default(),
        };

        let table = discard_duplicate_rows(&table, &mut report);
        let table = group_by_path(&table, options.aggregation, &mut report);

        let table = match &inputs.image_properties {
            Some(properties) => join_properties(&table, properties, &mut report),
            None => without_properties(&table),
        };
        let table = assign_capture_times(&table, &options.date_formats, &mut report);

        let table = priority_rules.apply(&table, &mut report);
        let table = resolve_or_drop(&table, options.keep_unresolved, &mut report);

        report.rows_written = table.len();
        info!(
            "{} images with {} label column(s) after reconciliation",
            table.len(),
            table.labels().len()
        );

        Ok(Reconciled {
            table,
            labelmap,
            priority_rules,
            report,
        })
    }
}
