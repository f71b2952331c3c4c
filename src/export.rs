//! Assembly of the final coverage document and the end-to-end export
//! pipeline: summarize, render in parallel, sort, assemble.
//!
//! The document layout:
//!
//! ```text
//! { "version": "2.0.0", "type": "llvm.coverage.json.export",
//!   "data": [ { "files": [ { "filename", "segments"?, "expansions"?, "summary" } ],
//!               "totals": { "lines", "functions", "instantiations", "regions" },
//!               "functions"?: [ { "name", "count", "regions", "filenames" } ] } ] }
//! ```

use log::info;
use serde::{Deserialize, Serialize};

use crate::dispatch::{render_all, CancelToken};
use crate::error::{ExportError, Result};
use crate::mapping::{source_files, CoverageModel, FilenameFilter};
use crate::model::{FileSummary, FunctionRecord};
use crate::render::FileReport;
use crate::summary::compute_summaries;

/// Format version written into every document.
pub const EXPORT_VERSION: &str = "2.0.0";

/// Type identifier written into every document.
pub const EXPORT_TYPE: &str = "llvm.coverage.json.export";

/// Detail level and parallelism of an export. Missing fields take their
/// defaults when read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Emit summaries only: no segments, expansions or function list.
    pub summary_only: bool,
    /// Leave out per-file expansion lists.
    pub skip_expansions: bool,
    /// Leave out the flattened function list.
    pub skip_functions: bool,
    /// Worker threads for rendering; 0 selects automatically.
    pub num_threads: usize,
}

impl ExportOptions {
    /// Read options from a JSON object such as `{"summary_only": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExportError::Config(format!("invalid export options: {e}")))
    }

    fn include_functions(&self) -> bool {
        !self.summary_only && !self.skip_functions
    }
}

/// One export of a coverage model.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument<'a> {
    pub files: Vec<FileReport>,
    pub totals: FileSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<&'a [FunctionRecord]>,
}

/// The top-level object handed to the serializer.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRoot<'a> {
    pub version: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Vec<ReportDocument<'a>>,
}

impl<'a> ExportRoot<'a> {
    pub fn new(document: ReportDocument<'a>) -> Self {
        Self {
            version: EXPORT_VERSION,
            kind: EXPORT_TYPE,
            data: vec![document],
        }
    }

    /// The single document this root wraps.
    #[must_use]
    pub fn document(&self) -> &ReportDocument<'a> {
        &self.data[0]
    }

    /// Encode as JSON.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Order file reports by filename and build the document.
///
/// Filenames compare byte-wise, so the result does not depend on the order
/// the reports were produced in, the locale, or the machine. `functions` is
/// dropped under summary-only or skip-functions.
pub fn assemble<'a>(
    mut reports: Vec<FileReport>,
    totals: FileSummary,
    functions: Option<&'a [FunctionRecord]>,
    options: &ExportOptions,
) -> ReportDocument<'a> {
    reports.sort_by(|a, b| a.filename.as_bytes().cmp(b.filename.as_bytes()));
    ReportDocument {
        files: reports,
        totals,
        functions: functions.filter(|_| options.include_functions()),
    }
}

/// Export `files` from `model`.
pub fn export<'a>(
    model: &'a dyn CoverageModel,
    files: &[String],
    options: &ExportOptions,
) -> Result<ExportRoot<'a>> {
    export_with_cancel(model, files, options, &CancelToken::new())
}

/// Export every source file of `model` that `ignore` does not match.
pub fn export_filtered<'a>(
    model: &'a dyn CoverageModel,
    ignore: &dyn FilenameFilter,
    options: &ExportOptions,
) -> Result<ExportRoot<'a>> {
    let files = source_files(model, ignore);
    export(model, &files, options)
}

/// Export `files` from `model`, stopping early if `cancel` fires.
pub fn export_with_cancel<'a>(
    model: &'a dyn CoverageModel,
    files: &[String],
    options: &ExportOptions,
    cancel: &CancelToken,
) -> Result<ExportRoot<'a>> {
    let (summaries, totals) = compute_summaries(files, model)?;
    info!(
        "Summarized {} files: {}/{} lines covered",
        files.len(),
        totals.line_stat.covered,
        totals.line_stat.count
    );

    let reports = render_all(model, files, &summaries, options, cancel)?;

    let functions = options
        .include_functions()
        .then(|| model.covered_functions());
    let document = assemble(reports, totals, functions, options);
    Ok(ExportRoot::new(document))
}
