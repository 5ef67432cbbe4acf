//! Report output port trait.

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::TradebookError;
use std::path::Path;

/// Port for writing analysis reports.
pub trait ReportPort {
    fn write(&self, report: &AnalysisReport, output_path: &Path) -> Result<(), TradebookError>;
}
