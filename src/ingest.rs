use std::path::Path;

use log::info;

use crate::detect::{detect_format, Format};
use crate::error::{ExportError, Result};
use crate::mapping::{CoverageMapping, CoverageModel};
use crate::parsers::lcov::LcovParser;
use crate::parsers::model::ModelParser;
use crate::parsers::Parser;

/// Read a coverage input, auto-detect its format (or use the override),
/// and parse it into an in-memory model.
/// Returns (model, detected_format).
pub fn load(file_path: &Path, format_override: Option<&str>) -> Result<(CoverageMapping, Format)> {
    let content = std::fs::read(file_path)?;

    let format = if let Some(fmt_str) = format_override {
        fmt_str.parse::<Format>()?
    } else {
        detect_format(file_path, &content).ok_or(ExportError::UnknownFormat)?
    };

    let mapping = parse_with_format(format, &content)?;
    info!(
        "Loaded {} as {}: {} files, {} functions",
        file_path.display(),
        format,
        mapping.unique_source_files().len(),
        mapping.covered_functions().len()
    );

    Ok((mapping, format))
}

fn parse_with_format(format: Format, content: &[u8]) -> Result<CoverageMapping> {
    match format {
        Format::Model => ModelParser.parse(content),
        Format::Lcov => LcovParser.parse(content),
    }
}
