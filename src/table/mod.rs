//! Detection tables and the whole-table operations over them.

mod loader;
mod ops;
mod paths;
mod types;

pub use loader::load_detections;
pub use ops::{discard_duplicate_rows, discard_missing_files, group_by_path};
pub use paths::{correct_file_paths, local_path, normalize_path};
pub use types::{
    Aggregation, DetectionRow, DetectionTable, ImageRow, ImageTable, LabelValue, Labelled, Table,
    is_asserted, merge_max, parse_label_value,
};
