//! Error types for camtrap.

/// Result type alias for camtrap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for camtrap.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// No detection files were given.
    #[error("no detection files provided")]
    NoDetectionFiles,

    /// Failed to read or parse a detection file.
    #[error("failed to read detection file '{path}'")]
    DetectionRead {
        /// Path to the detection file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from an input CSV.
    #[error("required column '{column}' missing from '{path}'")]
    MissingColumn {
        /// Path to the offending file.
        path: std::path::PathBuf,
        /// Name of the missing column.
        column: String,
    },

    /// A label cell holds something other than a boolean-ish value.
    #[error("invalid label value '{value}' in column '{column}' of '{path}' (line {line})")]
    InvalidLabelValue {
        /// Path to the offending file.
        path: std::path::PathBuf,
        /// Column name.
        column: String,
        /// 1-based line number, header included.
        line: u64,
        /// The rejected cell content.
        value: String,
    },

    /// Failed to read or parse the image properties file.
    #[error("failed to read image properties file '{path}'")]
    PropertiesRead {
        /// Path to the properties file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to read the label map file.
    #[error("failed to read label map '{path}'")]
    LabelMapRead {
        /// Path to the label map.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Label map is not a JSON object of strings.
    #[error("failed to parse label map '{path}'")]
    LabelMapParse {
        /// Path to the label map.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Merging label columns turned null cells into values.
    #[error(
        "merging columns into 'contains_{label}' changed the null count ({before} rows all-null before, {after} null after)"
    )]
    NullPreservationViolated {
        /// Canonical label of the merged column.
        label: String,
        /// Rows whose contributing cells were all null.
        before: usize,
        /// Null cells in the merged column.
        after: usize,
    },

    /// Failed to read the priority rules file.
    #[error("failed to read priority rules '{path}'")]
    PriorityRulesRead {
        /// Path to the rules file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A priority rule line is malformed.
    #[error("invalid priority rule '{rule}': {reason}")]
    InvalidPriorityRule {
        /// The offending line.
        rule: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A priority rule names the same label on both sides.
    #[error("invalid priority rule '{label} > {label}': labels must be distinct")]
    SelfReferentialRule {
        /// The repeated label.
        label: String,
    },

    /// Both sides of a priority rule are wildcards.
    #[error("invalid priority rule '{rule}': only one side may be '*'")]
    WildcardBothSides {
        /// The offending line.
        rule: String,
    },

    /// Two priority rules target the same label pair.
    #[error("multiple priority rules provided for label pair ({first}, {second})")]
    DuplicatePriorityRule {
        /// First label of the pair.
        first: String,
        /// Second label of the pair.
        second: String,
    },

    /// Failed to write the cleaned CSV.
    #[error("failed to write output file '{path}'")]
    OutputWrite {
        /// Path to the output file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to create or flush an output file.
    #[error("failed to create output file '{path}'")]
    OutputCreate {
        /// Path to the output file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A time format cannot render a time of day.
    #[error("time format '{format}' cannot render a time of day")]
    TimeFormat {
        /// The offending format string.
        format: String,
    },

    /// Failed to read a cleaned labels CSV.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the JSON run report.
    #[error("failed to write report '{path}'")]
    ReportWrite {
        /// Path to the report file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Link output directory already exists.
    #[error("output directory '{path}' already exists")]
    LinkDirExists {
        /// Path to the existing directory.
        path: std::path::PathBuf,
    },

    /// Failed to create a symlink.
    #[error("failed to link '{target}' as '{link}'")]
    LinkCreate {
        /// Image the link points to.
        target: std::path::PathBuf,
        /// Path of the link.
        link: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open an archive.
    #[error("failed to open archive '{path}'")]
    ArchiveOpen {
        /// Path to the archive.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to unpack an archive entry.
    #[error("failed to extract '{entry}' from '{path}'")]
    ArchiveExtract {
        /// Path to the archive.
        path: std::path::PathBuf,
        /// Entry being unpacked.
        entry: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Archive type not recognised from its extension.
    #[error("unsupported archive format: {path}")]
    UnsupportedArchive {
        /// Path to the archive.
        path: std::path::PathBuf,
    },
}
