//! Application-wide constants.
//!
//! Column names, formats and defaults live here so the loaders, the
//! pipeline and the writer agree on them.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "camtrap";

/// Default number of leading vendor path segments replaced by the image dir.
///
/// Vendor paths look like `Z:\TransectTrailCamPics\SU16\DPT\D09-RYW1\`; the
/// drive and share name are dropped.
pub const DEFAULT_PATH_PREFIX_SEGMENTS: usize = 2;

/// Prefix of every label column.
pub const LABEL_PREFIX: &str = "contains_";

/// Wildcard accepted on one side of a priority rule.
pub const WILDCARD: &str = "*";

/// Separator between winner and loser in a priority rule.
pub const RULE_SEPARATOR: char = '>';

/// Maximum number of example paths listed in a rule-application warning.
pub const MAX_LOGGED_PATHS: usize = 10;

/// Column names of the raw detection CSVs.
pub mod detection_columns {
    /// Vendor directory (or full vendor path).
    pub const VENDOR_PATH: &str = "FilePath";
    /// File name, appended to the vendor directory when present.
    pub const FILE_NAME: &str = "FileName";
    /// Record date.
    pub const RECORD_DATE: &str = "ImageDate";
    /// Long-form raw label, dummy-coded on load.
    pub const RAW_LABEL: &str = "ShortName";
}

/// Column names of the cleaned output CSV.
pub mod output_columns {
    /// Absolute image path.
    pub const FILEPATH: &str = "filepath";
    /// Record date.
    pub const DATE: &str = "date";
    /// Capture time of day.
    pub const TIME: &str = "time";
    /// Grayscale (infrared) flag.
    pub const NIGHT: &str = "night";
    /// Mean pixel brightness.
    pub const MEAN_BRIGHTNESS: &str = "mean_brightness";
}

/// Date and time formats.
pub mod formats {
    /// Record date in detection CSVs, e.g. `01-Jan-20`.
    pub const RECORD_DATE: &str = "%d-%b-%y";
    /// EXIF timestamp in the image properties CSV.
    pub const EXIF_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";
    /// Time of day in the cleaned output.
    pub const OUTPUT_TIME: &str = "%H:%M:%S";
}

/// Cell values read as a null label.
pub const NULL_MARKERS: &[&str] = &["", "na", "nan", "null", "none"];

/// Archive extensions understood by the extractor.
pub mod archive_extensions {
    /// Plain tar.
    pub const TAR: &str = "tar";
    /// Gzipped tar.
    pub const TAR_GZ: &str = "tar.gz";
    /// Gzipped tar, short form.
    pub const TGZ: &str = "tgz";
    /// Zip.
    pub const ZIP: &str = "zip";
}

/// UTF-8 Byte Order Mark for Excel compatibility in CSV files.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";
