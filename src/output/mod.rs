//! Output writers and progress display.

mod csv;
pub mod progress;
mod report;

pub use csv::{CsvOptions, format_time, read_labels_csv, write_csv};
pub use report::write_report;
