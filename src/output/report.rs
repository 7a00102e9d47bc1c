//! JSON run report writer.

use crate::error::{Error, Result};
use crate::pipeline::Report;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write the run report as pretty JSON.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let create_error = |source| Error::OutputCreate {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(create_error)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|e| Error::ReportWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    writeln!(writer).map_err(create_error)?;
    writer.flush().map_err(create_error)?;

    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = Report {
            rows_written: 3,
            ..Report::default()
        };

        write_report(&report, &path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rows_written"], 3);
        assert!(json["rule_applications"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_report_create_failure_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        let err = write_report(&Report::default(), &path).unwrap_err();
        assert!(matches!(&err, Error::OutputCreate { path: p, .. } if *p == path));
        assert!(err.to_string().contains("taken"));
    }
}
