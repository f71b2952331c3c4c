/// Parser for the LCOV `.info` format, converted into a coverage model.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   FN:<line>[,<end line>],<function name>
///   FNDA:<execution count>,<function name>
///   DA:<line number>,<execution count>[,<checksum>]
///   end_of_record
///
/// LCOV has no column information, so every instrumented line becomes one
/// code region from column 1 to the end of the line. Records for the same
/// source file (one per test name) are merged by summing counts, saturating
/// at `u64::MAX`.
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

use log::debug;

use super::Parser;
use crate::error::{ExportError, Result};
use crate::mapping::CoverageMapping;
use crate::model::{FileCoverage, FunctionRecord, Region, Segment};

/// Column used for "end of line" in regions and segments built from LCOV.
pub const LINE_END_COLUMN: u32 = u32::MAX;

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageMapping> {
        parse_reader(&mut &*input)
    }
}

#[derive(Debug, Default)]
struct FunctionAccum {
    start_line: Option<u32>,
    end_line: Option<u32>,
    hit_count: u64,
}

/// Everything seen for one source file across all its records.
#[derive(Debug, Default)]
struct FileAccum {
    lines: BTreeMap<u32, u64>,
    /// Function names in first-seen order.
    function_order: Vec<String>,
    functions: HashMap<String, FunctionAccum>,
}

impl FileAccum {
    fn function(&mut self, name: &str) -> &mut FunctionAccum {
        if !self.functions.contains_key(name) {
            self.function_order.push(name.to_string());
        }
        self.functions.entry(name.to_string()).or_default()
    }
}

/// Parse LCOV data from a buffered reader.
pub fn parse_reader(reader: &mut dyn BufRead) -> Result<CoverageMapping> {
    let mut file_order: Vec<String> = Vec::new();
    let mut files: HashMap<String, FileAccum> = HashMap::new();
    let mut current: Option<String> = None;

    let mut raw_line = String::new();
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| ExportError::Parse(format!("Invalid LCOV data: {e}")))?;
        if n == 0 {
            break;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            current = None;
            continue;
        }

        let (tag, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        if tag == "SF" {
            if !files.contains_key(value) {
                file_order.push(value.to_string());
                files.insert(value.to_string(), FileAccum::default());
            }
            current = Some(value.to_string());
            continue;
        }

        let Some(file) = current.as_ref().and_then(|sf| files.get_mut(sf)) else {
            continue;
        };

        match tag {
            "FN" => {
                // FN:<line>,<name> or FN:<line>,<end line>,<name>
                if let Some((start, rest)) = value.split_once(',') {
                    if let Ok(start_line) = start.parse::<u32>() {
                        let (end_line, name) = match rest.split_once(',') {
                            Some((end, name)) => match end.parse::<u32>() {
                                Ok(end) => (Some(end), name),
                                Err(_) => (None, rest),
                            },
                            None => (None, rest),
                        };
                        let f = file.function(name);
                        f.start_line = Some(start_line);
                        f.end_line = end_line;
                    }
                }
            }
            "FNDA" => {
                if let Some((count_str, name)) = value.split_once(',') {
                    let hit_count = count_str.parse::<u64>().unwrap_or(0);
                    let f = file.function(name);
                    f.hit_count = f.hit_count.saturating_add(hit_count);
                }
            }
            "DA" => {
                // Negative counts mark non-instrumentable lines; skip them.
                let parts: Vec<&str> = value.splitn(3, ',').collect();
                if parts.len() >= 2 {
                    if let (Ok(line_number), Ok(count)) =
                        (parts[0].parse::<u32>(), parts[1].parse::<i64>())
                    {
                        if count >= 0 {
                            let hits = file.lines.entry(line_number).or_insert(0);
                            *hits = hits.saturating_add(count as u64);
                        }
                    }
                }
            }
            // TN, BRDA and the LF/LH/FNF/FNH/BRF/BRH totals are derived or unused.
            _ => {}
        }
    }

    let mut mapping = CoverageMapping::new();
    for name in file_order {
        let Some(accum) = files.remove(&name) else {
            continue;
        };
        debug!(
            "LCOV {}: {} lines, {} functions",
            name,
            accum.lines.len(),
            accum.function_order.len()
        );
        for function in function_records(&name, &accum) {
            mapping.add_function(function);
        }
        let mut coverage = FileCoverage::new(name);
        coverage.segments = line_segments(&accum.lines);
        mapping.add_file(coverage)?;
    }

    Ok(mapping)
}

/// Two segments per instrumented line: entering the line's region at
/// column 1 and leaving it at the end of the line.
fn line_segments(lines: &BTreeMap<u32, u64>) -> Vec<Segment> {
    lines
        .iter()
        .flat_map(|(&line, &count)| {
            [
                Segment {
                    line,
                    column: 1,
                    count,
                    has_count: true,
                    is_region_entry: true,
                },
                Segment {
                    line,
                    column: LINE_END_COLUMN,
                    count: 0,
                    has_count: false,
                    is_region_entry: false,
                },
            ]
        })
        .collect()
}

fn function_records(filename: &str, accum: &FileAccum) -> Vec<FunctionRecord> {
    accum
        .function_order
        .iter()
        .filter_map(|name| {
            let f = accum.functions.get(name)?;
            let regions = match f.start_line {
                Some(start) => vec![Region::code(
                    start,
                    1,
                    f.end_line.unwrap_or(start).max(start),
                    LINE_END_COLUMN,
                    f.hit_count,
                )],
                None => Vec::new(),
            };
            Some(FunctionRecord {
                name: name.clone(),
                execution_count: f.hit_count,
                regions,
                filenames: vec![filename.to_string()],
            })
        })
        .collect()
}
