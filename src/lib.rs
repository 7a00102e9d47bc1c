//! Camtrap - camera-trap label reconciliation.
//!
//! Turns raw per-image detection exports into one clean row per image with
//! a deterministic multi-label encoding, ready for classifier training.

#![warn(missing_docs)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod labels;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod properties;
pub mod table;

use clap::Parser;
use cli::{Cli, CleanArgs, Command, ExtractArgs, GlobalArgs, LinkArgs};
use config::{Config, config_file_path, load_default_config, save_default_config, validate_config};
use labels::{LabelMap, PriorityRuleSet};
use link::LinkOptions;
use output::CsvOptions;
use pipeline::{InputSources, PipelineInputs, PipelineOptions, ReconciliationPipeline};
use std::time::Instant;
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for camtrap CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let config = load_default_config()?;
    validate_config(&config)?;

    match cli.command {
        Command::Clean(args) => clean_detections(&args, &cli.global, &config),
        Command::Link(args) => link(&args, &cli.global, &config),
        Command::Extract(args) => extract(&args, &cli.global),
        Command::Config { action } => handle_config_command(action),
    }
}

/// Run the reconciliation pipeline and write the cleaned CSV.
fn clean_detections(args: &CleanArgs, global: &GlobalArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let options = PipelineOptions {
        image_dir: args.image_dir.clone(),
        path_prefix_segments: args
            .path_prefix_segments
            .unwrap_or(config.pipeline.path_prefix_segments),
        keep_unresolved: args.keep_unresolved || config.pipeline.keep_unresolved,
        aggregation: args.aggregation.unwrap_or(config.pipeline.aggregation),
        date_formats: config.pipeline.date_formats(),
        show_progress: global.show_progress(),
    };
    let sources = InputSources {
        detections: args.detections.clone(),
        image_properties: args.image_properties.clone(),
        labelmap: args.labelmap.clone(),
        priority_rules: args.priority_rules.clone(),
    };

    let inputs = PipelineInputs::load(&sources)?;
    let result = ReconciliationPipeline::new(options).run(&inputs)?;

    let csv_options = CsvOptions {
        bom: args.csv_bom || config.output.csv_bom,
        time_format: config.output.time_format.clone(),
    };
    output::write_csv(&result.table, &args.outpath, &csv_options)?;

    if let Some(report_path) = &args.report {
        output::write_report(&result.report, report_path)?;
    }

    result.report.log_summary();
    info!("Completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Build per-label symlink directories from a cleaned labels CSV.
fn link(args: &LinkArgs, global: &GlobalArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let labelmap = args.labelmap.as_deref().map(LabelMap::load).transpose()?;
    let priority_rules = args
        .priority_rules
        .as_deref()
        .map(PriorityRuleSet::read_rule_file)
        .transpose()?;

    let options = LinkOptions {
        outdir: args.outdir.clone(),
        keep_unresolved: args.keep_unresolved || config.pipeline.keep_unresolved,
        time_format: config.output.time_format.clone(),
        show_progress: global.show_progress(),
    };
    let summary =
        link::link_images_by_label(&args.labels, labelmap, priority_rules.as_deref(), &options)?;

    info!(
        "Completed: {} links across {} labels in {:.2}s",
        summary.total(),
        summary.links.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Unpack an image archive.
fn extract(args: &ExtractArgs, global: &GlobalArgs) -> Result<()> {
    let start = Instant::now();
    archive::extract_archive(&args.archive, &args.outdir, global.show_progress())?;
    info!("Completed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            let contents = toml::to_string_pretty(&config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
