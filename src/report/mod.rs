// SPDX-License-Identifier: PMPL-1.0-or-later

//! Live run output, report generation and export

pub mod formatter;
pub mod generator;
pub mod output;
pub mod reporter;

use crate::types::GuessReport;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub use formatter::ReportFormatter;
pub use generator::ReportGenerator;
pub use output::ReportOutputFormat;
pub use reporter::{ReportEvent, Reporter};

/// Save report to file, creating parent directories as needed.
pub fn save_report_as(report: &GuessReport, path: &Path, format: ReportOutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
    }
    let content = format.serialize(report)?;
    fs::write(path, content).with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

/// Print report to console
pub fn print_report(report: &GuessReport) {
    let formatter = ReportFormatter::new();
    formatter.print(report);
}
