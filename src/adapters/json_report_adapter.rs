//! JSON report adapter implementing ReportPort.
//!
//! Writes the full [`AnalysisReport`] as pretty-printed JSON, creating the
//! parent directory when it does not exist yet.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::TradebookError;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &AnalysisReport, output_path: &Path) -> Result<(), TradebookError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(output_path).map_err(|e| TradebookError::Report {
            reason: format!("failed to create {}: {}", output_path.display(), e),
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
