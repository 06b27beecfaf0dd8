//! Result export.
//!
//! Single runs are written as their JSON result document. Confidence summaries
//! go to JSON or, for a `.csv` path, to one row per report entry. Any other
//! extension is refused rather than written in a format the name does not say.

use std::path::Path;

use bikeshare_core::simulation::SimulationResult;

use crate::confidence::ConfidenceSummary;
use crate::error::ExportError;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Writes one run's result document as pretty JSON.
pub fn export_result_to_json(
    result: &SimulationResult,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(result, file)
}

/// Writes the result documents of several runs as a JSON array.
///
/// # Errors
///
/// Returns [ExportError::Empty] if `results` is empty.
pub fn export_results_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(results, file)
}

pub fn export_summary_to_json(
    summary: &ConfidenceSummary,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(summary, file)
}

/// One row per report entry: name, run count, moments, and the interval bounds.
/// Per-run values are left out; use the JSON export for those.
pub fn export_summary_to_csv(
    summary: &ConfidenceSummary,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    if summary.is_empty() {
        return Err(ExportError::Empty);
    }
    let file = writer_utils::create_output_file(path)?;
    csv::export_summary_to_csv_impl(summary, file)
}

/// Output format named by a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// `.json` or `.csv`, case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// Checks that `path` can hold a single result document.
pub fn check_result_path(path: &Path) -> Result<(), ExportError> {
    match ExportFormat::from_path(path) {
        Some(ExportFormat::Json) => Ok(()),
        _ => Err(ExportError::UnsupportedFormat {
            path: path.to_path_buf(),
            expected: ".json",
        }),
    }
}

/// Checks that `path` can hold a confidence summary and returns its format.
pub fn summary_format(path: &Path) -> Result<ExportFormat, ExportError> {
    ExportFormat::from_path(path).ok_or_else(|| ExportError::UnsupportedFormat {
        path: path.to_path_buf(),
        expected: ".json or .csv",
    })
}

/// [export_result_to_json] for a path that must end in `.json`.
pub fn save_result(result: &SimulationResult, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    check_result_path(path)?;
    export_result_to_json(result, path)
}

/// Writes the summary in the format named by the extension of `path`.
pub fn save_summary(
    summary: &ConfidenceSummary,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    match summary_format(path)? {
        ExportFormat::Csv => export_summary_to_csv(summary, path),
        ExportFormat::Json => export_summary_to_json(summary, path),
    }
}
