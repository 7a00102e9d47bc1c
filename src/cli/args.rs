//! CLI argument definitions.

use crate::table::Aggregation;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Reconcile camera-trap detection records into a clean multi-label dataset.
#[derive(Debug, Parser)]
#[command(name = "camtrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Only log warnings and errors; hides progress bars.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

impl GlobalArgs {
    /// Whether progress bars should be drawn.
    pub const fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile detection CSVs into one cleaned row per image.
    Clean(CleanArgs),
    /// Create per-label directories of symlinks from a cleaned labels CSV.
    Link(LinkArgs),
    /// Unpack a downloaded image archive.
    Extract(ExtractArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for the clean command.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Detection CSV files (repeat or separate with spaces).
    #[arg(short, long, required = true, num_args = 1..)]
    pub detections: Vec<PathBuf>,

    /// Local directory holding the images.
    #[arg(short, long, env = "CAMTRAP_IMAGE_DIR")]
    pub image_dir: PathBuf,

    /// Image properties CSV (filepath, night, mean_brightness, exif_timestamp).
    #[arg(short = 'p', long)]
    pub image_properties: Option<PathBuf>,

    /// Path of the cleaned CSV to write.
    #[arg(short, long)]
    pub outpath: PathBuf,

    /// JSON label map of raw label to canonical label.
    #[arg(short = 'm', long, env = "CAMTRAP_LABELMAP")]
    pub labelmap: Option<PathBuf>,

    /// Text file of `winner > loser` priority rules.
    #[arg(short = 'r', long, env = "CAMTRAP_PRIORITY_RULES")]
    pub priority_rules: Option<PathBuf>,

    /// Keep images that still have several labels after priority rules.
    #[arg(long)]
    pub keep_unresolved: bool,

    /// Leading vendor path segments to replace with the image directory.
    #[arg(long)]
    pub path_prefix_segments: Option<usize>,

    /// How to combine rows for the same image.
    #[arg(long, value_enum)]
    pub aggregation: Option<Aggregation>,

    /// Write a JSON report of dropped and altered rows.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Prefix the CSV with a UTF-8 byte order mark (for Excel).
    #[arg(long)]
    pub csv_bom: bool,
}

/// Arguments for the link command.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Cleaned labels CSV.
    #[arg(short, long)]
    pub labels: PathBuf,

    /// Directory to create the label directories in; must not exist.
    #[arg(short, long)]
    pub outdir: PathBuf,

    /// JSON label map of raw label to canonical label.
    #[arg(short = 'm', long, env = "CAMTRAP_LABELMAP")]
    pub labelmap: Option<PathBuf>,

    /// Text file of `winner > loser` priority rules.
    #[arg(short = 'r', long, env = "CAMTRAP_PRIORITY_RULES")]
    pub priority_rules: Option<PathBuf>,

    /// Keep images that still have several labels after priority rules.
    #[arg(long)]
    pub keep_unresolved: bool,
}

/// Arguments for the extract command.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Archive to unpack (.tar, .tar.gz, .tgz or .zip).
    pub archive: PathBuf,

    /// Directory to unpack into.
    #[arg(short, long)]
    pub outdir: PathBuf,
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_clean() {
        let cli = Cli::try_parse_from([
            "camtrap",
            "clean",
            "--detections",
            "a.csv",
            "b.csv",
            "--image-dir",
            "/data/images",
            "--outpath",
            "clean.csv",
            "--aggregation",
            "first",
            "-q",
        ])
        .unwrap();

        assert!(cli.global.quiet);
        assert!(!cli.global.show_progress());
        let Command::Clean(args) = cli.command else {
            panic!("expected clean command");
        };
        assert_eq!(args.detections.len(), 2);
        assert_eq!(args.aggregation, Some(Aggregation::First));
        assert!(!args.keep_unresolved);
        assert_eq!(args.path_prefix_segments, None);
    }

    #[test]
    fn test_cli_clean_requires_detections() {
        let cli = Cli::try_parse_from([
            "camtrap",
            "clean",
            "--image-dir",
            "/data/images",
            "--outpath",
            "clean.csv",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_link() {
        let cli = Cli::try_parse_from([
            "camtrap",
            "link",
            "--labels",
            "clean.csv",
            "--outdir",
            "links",
            "--keep-unresolved",
        ])
        .unwrap();
        let Command::Link(args) = cli.command else {
            panic!("expected link command");
        };
        assert!(args.keep_unresolved);
        assert_eq!(args.outdir, PathBuf::from("links"));
    }

    #[test]
    fn test_cli_parse_extract_with_verbosity() {
        let cli =
            Cli::try_parse_from(["camtrap", "-vv", "extract", "batch.tgz", "-o", "out"]).unwrap();
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Command::Extract(_)));
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["camtrap", "config", "show"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["camtrap"]).is_err());
    }
}
