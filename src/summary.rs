//! Per-file and whole-program coverage statistics.
//!
//! Line coverage is derived from a file's segments. Function, instantiation
//! and region coverage come from the function records whose main file is
//! the file being summarized. Totals are accumulated count by count, never
//! by averaging percentages.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::Result;
use crate::mapping::CoverageModel;
use crate::model::{CoverageStat, FileSummary, FunctionRecord, RegionKind, Segment};

/// Filename carried by the whole-program summary.
pub const TOTALS_NAME: &str = "Totals";

/// Line coverage for one file from its ordered segments.
///
/// A line counts as instrumentable when it does not open a skipped region
/// and either the segment active at its start has a count or a counted
/// region starts on it. Its execution count is the largest of those counts.
#[must_use]
pub fn line_stat(segments: &[Segment]) -> CoverageStat {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return CoverageStat::default();
    };

    let mut stat = CoverageStat::default();
    let mut wrapped: Option<&Segment> = None;
    let mut next = 0;

    for line in first.line..=last.line {
        let start = next;
        while next < segments.len() && segments[next].line == line {
            next += 1;
        }
        let on_line = &segments[start..next];

        let opens_skipped = on_line
            .first()
            .is_some_and(|s| !s.has_count && s.is_region_entry);

        let mut mapped = false;
        let mut count = 0;
        if let Some(w) = wrapped.filter(|w| w.has_count) {
            mapped = true;
            count = w.count;
        }
        for s in on_line.iter().filter(|s| s.has_count && s.is_region_entry) {
            mapped = true;
            count = count.max(s.count);
        }

        if mapped && !opens_skipped {
            stat.count += 1;
            if count > 0 {
                stat.covered += 1;
            }
        }

        if let Some(s) = on_line.last() {
            wrapped = Some(s);
        }
    }

    stat
}

/// Code regions of `function`, as (total, covered). Regions expanded from
/// other files (macros, includes) count toward the function's main file.
fn code_regions(function: &FunctionRecord) -> (u64, u64) {
    function
        .regions
        .iter()
        .filter(|r| r.kind == RegionKind::Code)
        .fold((0, 0), |(total, covered), r| {
            (total + 1, covered + u64::from(r.execution_count > 0))
        })
}

/// Identifies the instantiation group a function record belongs to.
/// Records without regions have no location and only group by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey<'a> {
    Location(u32, u32),
    Name(&'a str),
}

/// Function-level statistics for the records defined in one file.
///
/// Records starting at the same source location are instantiations of one
/// function (templates, generics). Each record is one instantiation; each
/// group is one function, covered when any of its instantiations ran.
/// A group's regions are those of its first instantiation, and its covered
/// region count is the best any instantiation achieved.
#[must_use]
pub fn function_stats(
    functions: &[&FunctionRecord],
) -> (CoverageStat, CoverageStat, CoverageStat) {
    let mut groups: BTreeMap<GroupKey<'_>, Vec<&FunctionRecord>> = BTreeMap::new();
    for f in functions {
        let key = match f.regions.first() {
            Some(r) => GroupKey::Location(r.line_start, r.column_start),
            None => GroupKey::Name(&f.name),
        };
        groups.entry(key).or_default().push(f);
    }

    let mut function_stat = CoverageStat::default();
    let mut instantiation_stat = CoverageStat::default();
    let mut region_stat = CoverageStat::default();

    for group in groups.values() {
        let executed = group.iter().filter(|f| f.execution_count > 0).count() as u64;

        instantiation_stat.add(&CoverageStat::new(executed, group.len() as u64));
        function_stat.add(&CoverageStat::new(u64::from(executed > 0), 1));

        let (total, _) = code_regions(group[0]);
        let best = group
            .iter()
            .map(|f| code_regions(f).1)
            .max()
            .unwrap_or(0);
        region_stat.add(&CoverageStat::new(best.min(total), total));
    }

    (function_stat, instantiation_stat, region_stat)
}

/// Summaries for the requested files, in request order, plus their totals.
pub fn compute_summaries(
    files: &[String],
    model: &dyn CoverageModel,
) -> Result<(Vec<FileSummary>, FileSummary)> {
    let mut by_file: HashMap<&str, Vec<&FunctionRecord>> = HashMap::new();
    for f in model.covered_functions() {
        if let Some(main) = f.main_file() {
            by_file.entry(main).or_default().push(f);
        }
    }

    let mut totals = FileSummary::new(TOTALS_NAME);
    let mut summaries = Vec::with_capacity(files.len());

    for filename in files {
        let coverage = model.coverage_for_file(filename)?;
        let functions = by_file.get(filename.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let (function_stat, instantiation_stat, region_stat) = function_stats(functions);

        let summary = FileSummary {
            filename: filename.clone(),
            line_stat: line_stat(&coverage.segments),
            function_stat,
            instantiation_stat,
            region_stat,
        };
        debug!(
            "Summarized {}: {}/{} lines, {}/{} regions",
            filename,
            summary.line_stat.covered,
            summary.line_stat.count,
            summary.region_stat.covered,
            summary.region_stat.count
        );
        totals.add(&summary);
        summaries.push(summary);
    }

    Ok((summaries, totals))
}
