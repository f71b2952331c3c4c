//! Command handler functions for the covexport CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;

use anyhow::{Context, Result};

use crate::export::{export_filtered, ExportOptions};
use crate::mapping::{source_files, CoverageModel, IgnoreFilter};
use crate::model::CoverageStat;
use crate::summary::compute_summaries;

pub fn cmd_export(
    model: &dyn CoverageModel,
    ignore_patterns: &[String],
    options: &ExportOptions,
    pretty: bool,
) -> Result<String> {
    let ignore = IgnoreFilter::new(ignore_patterns)?;
    let root = export_filtered(model, &ignore, options).context("Coverage export failed")?;
    let mut out = root.to_json_string(pretty)?;
    out.push('\n');
    Ok(out)
}

fn stat_line(out: &mut String, label: &str, stat: &CoverageStat) {
    writeln!(
        out,
        "{:<16}{}/{} ({:.1}%)",
        label,
        stat.covered,
        stat.count,
        stat.percent()
    )
    .unwrap();
}

pub fn cmd_summary(model: &dyn CoverageModel, ignore_patterns: &[String]) -> Result<String> {
    let ignore = IgnoreFilter::new(ignore_patterns)?;
    let files = source_files(model, &ignore);
    let (_, totals) = compute_summaries(&files, model)?;

    let mut out = String::new();
    writeln!(out, "{:<16}{}", "Files:", files.len()).unwrap();
    stat_line(&mut out, "Lines:", &totals.line_stat);
    stat_line(&mut out, "Functions:", &totals.function_stat);
    if totals.instantiation_stat.count != totals.function_stat.count {
        stat_line(&mut out, "Instantiations:", &totals.instantiation_stat);
    }
    stat_line(&mut out, "Regions:", &totals.region_stat);
    Ok(out)
}

pub fn cmd_files(
    model: &dyn CoverageModel,
    ignore_patterns: &[String],
    sort_by_coverage: bool,
) -> Result<String> {
    let ignore = IgnoreFilter::new(ignore_patterns)?;
    let files = source_files(model, &ignore);
    let (mut summaries, totals) = compute_summaries(&files, model)?;

    if sort_by_coverage {
        summaries.sort_by(|a, b| a.line_stat.percent().total_cmp(&b.line_stat.percent()));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>8} {:>8}",
        "FILE", "LINES", "COVERED", "RATE", "REGIONS"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(96)).unwrap();

    for s in summaries.iter().chain(std::iter::once(&totals)) {
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>7.1}% {:>7.1}%",
            s.filename,
            s.line_stat.count,
            s.line_stat.covered,
            s.line_stat.percent(),
            s.region_stat.percent()
        )
        .unwrap();
    }

    Ok(out)
}
