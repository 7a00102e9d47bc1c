//! Vendor path correction and path normalization.

use crate::table::{DetectionRow, DetectionTable};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Make a path absolute and fold `.` and `..` lexically.
///
/// No filesystem access: symlinks are not resolved and the path need not
/// exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Map a vendor path onto the local image directory.
///
/// Vendor paths are split on `\` and `/`; the first `prefix_segments`
/// non-empty segments are dropped and the rest joined under `image_dir`.
pub fn local_path(vendor_path: &str, image_dir: &Path, prefix_segments: usize) -> PathBuf {
    let mut path = image_dir.to_path_buf();
    path.extend(
        vendor_path
            .split(['\\', '/'])
            .filter(|segment| !segment.is_empty())
            .skip(prefix_segments),
    );
    normalize_path(&path)
}

/// Rewrite every row's vendor path as an absolute local path.
///
/// No row is dropped here.
pub fn correct_file_paths(
    table: &DetectionTable,
    image_dir: &Path,
    prefix_segments: usize,
) -> DetectionTable {
    info!("Correcting filepaths under {}", image_dir.display());

    let rows = table
        .rows()
        .iter()
        .map(|row| DetectionRow {
            file_path: local_path(&row.file_path, image_dir, prefix_segments)
                .to_string_lossy()
                .into_owned(),
            ..row.clone()
        })
        .collect();

    table.with_rows(rows)
}
