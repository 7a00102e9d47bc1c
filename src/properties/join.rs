//! Joining image properties onto collapsed detections.

use crate::pipeline::Report;
use crate::properties::ImageProperties;
use crate::table::{DetectionTable, ImageRow, ImageTable};
use std::collections::HashMap;
use tracing::{info, warn};

/// Inner-join properties onto detections by absolute file path.
///
/// Detection order is preserved. When a path has several properties rows
/// the first one wins.
pub fn join_properties(
    detections: &DetectionTable,
    properties: &[ImageProperties],
    report: &mut Report,
) -> ImageTable {
    info!("Merging image properties");

    let mut by_path: HashMap<&str, &ImageProperties> = HashMap::with_capacity(properties.len());
    let mut duplicates = 0;
    for props in properties {
        if by_path.contains_key(props.file_path.as_str()) {
            duplicates += 1;
        } else {
            by_path.insert(props.file_path.as_str(), props);
        }
    }
    if duplicates > 0 {
        warn!("{duplicates} duplicate image properties rows ignored");
    }
    report.duplicate_properties += duplicates;

    let mut rows = Vec::with_capacity(detections.len());
    let mut matched = 0;
    for detection in detections.rows() {
        let Some(props) = by_path.get(detection.file_path.as_str()) else {
            continue;
        };
        matched += 1;
        rows.push(ImageRow {
            night: props.night,
            mean_brightness: props.mean_brightness,
            exif_timestamp: props.exif_timestamp.clone(),
            ..ImageRow::from_detection(detection)
        });
    }

    let unmatched_detections = detections.len() - rows.len();
    let unmatched_properties = by_path.len() - matched;
    if unmatched_detections > 0 {
        info!("{unmatched_detections} detections have no image properties and were dropped");
    }
    if unmatched_properties > 0 {
        info!("{unmatched_properties} image properties rows have no detections");
    }
    report.unmatched_detections += unmatched_detections;
    report.unmatched_properties += unmatched_properties;

    detections.with_rows(rows)
}

/// Carry detections forward with empty property columns.
pub fn without_properties(detections: &DetectionTable) -> ImageTable {
    info!("No image properties given; night, mean_brightness and time will be empty");
    detections.with_rows(
        detections
            .rows()
            .iter()
            .map(ImageRow::from_detection)
            .collect(),
    )
}
