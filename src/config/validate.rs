//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::format_time;
use chrono::NaiveTime;
use chrono::format::{Item, StrftimeItems};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_format("pipeline.record_date_format", &config.pipeline.record_date_format)?;
    validate_format(
        "pipeline.exif_timestamp_format",
        &config.pipeline.exif_timestamp_format,
    )?;
    validate_format("output.time_format", &config.output.time_format)?;
    validate_time_only("output.time_format", &config.output.time_format)?;
    Ok(())
}

/// Check that a `chrono` format string is non-empty and has no invalid
/// specifiers.
pub fn validate_format(key: &str, format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: format!("{key} must not be empty"),
        });
    }

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::ConfigValidation {
            message: format!("{key} is not a valid date/time format: '{format}'"),
        });
    }

    Ok(())
}

/// Check that a format renders a bare time of day without date fields.
pub fn validate_time_only(key: &str, format: &str) -> Result<()> {
    format_time(NaiveTime::default(), format).map_err(|_| Error::ConfigValidation {
        message: format!("{key} must only use time-of-day specifiers: '{format}'"),
    })?;
    Ok(())
}
