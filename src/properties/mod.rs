//! Per-image computed properties and their join onto detections.

mod capture_time;
mod join;
mod loader;

pub use capture_time::{CaptureTime, DateFormats, assign_capture_times, extract_capture_time};
pub use join::{join_properties, without_properties};
pub use loader::{ImageProperties, read_image_properties};
