//! Coverage data as handed over by the coverage model, plus the summary
//! statistics derived from it. Everything here is a read-only projection
//! built once per export call.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Compute a coverage percentage, returning 0.0 when the total is zero.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

/// A point in a file where the active coverage count changes.
///
/// Serialized as `[line, col, count, has_count, is_region_entry]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SegmentTuple", into = "SegmentTuple")]
pub struct Segment {
    pub line: u32,
    pub column: u32,
    pub count: u64,
    pub has_count: bool,
    pub is_region_entry: bool,
}

type SegmentTuple = (u32, u32, u64, bool, bool);

impl From<SegmentTuple> for Segment {
    fn from((line, column, count, has_count, is_region_entry): SegmentTuple) -> Self {
        Self {
            line,
            column,
            count,
            has_count,
            is_region_entry,
        }
    }
}

impl From<Segment> for SegmentTuple {
    fn from(s: Segment) -> Self {
        (s.line, s.column, s.count, s.has_count, s.is_region_entry)
    }
}

/// What a counted region represents in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RegionKind {
    Code,
    Expansion,
    Skipped,
    Gap,
    Branch,
}

impl TryFrom<u8> for RegionKind {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(RegionKind::Code),
            1 => Ok(RegionKind::Expansion),
            2 => Ok(RegionKind::Skipped),
            3 => Ok(RegionKind::Gap),
            4 => Ok(RegionKind::Branch),
            _ => Err(format!("unknown region kind: {value}")),
        }
    }
}

impl From<RegionKind> for u8 {
    fn from(kind: RegionKind) -> Self {
        match kind {
            RegionKind::Code => 0,
            RegionKind::Expansion => 1,
            RegionKind::Skipped => 2,
            RegionKind::Gap => 3,
            RegionKind::Branch => 4,
        }
    }
}

/// A counted source span.
///
/// Serialized as
/// `[line_start, col_start, line_end, col_end, count, file_id, expanded_file_id, kind]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegionTuple", into = "RegionTuple")]
pub struct Region {
    pub line_start: u32,
    pub column_start: u32,
    pub line_end: u32,
    pub column_end: u32,
    pub execution_count: u64,
    pub file_id: u32,
    pub expanded_file_id: u32,
    pub kind: RegionKind,
}

type RegionTuple = (u32, u32, u32, u32, u64, u32, u32, RegionKind);

impl From<RegionTuple> for Region {
    fn from(t: RegionTuple) -> Self {
        Self {
            line_start: t.0,
            column_start: t.1,
            line_end: t.2,
            column_end: t.3,
            execution_count: t.4,
            file_id: t.5,
            expanded_file_id: t.6,
            kind: t.7,
        }
    }
}

impl From<Region> for RegionTuple {
    fn from(r: Region) -> Self {
        (
            r.line_start,
            r.column_start,
            r.line_end,
            r.column_end,
            r.execution_count,
            r.file_id,
            r.expanded_file_id,
            r.kind,
        )
    }
}

impl Region {
    /// A plain code region within file 0.
    #[must_use]
    pub fn code(
        line_start: u32,
        column_start: u32,
        line_end: u32,
        column_end: u32,
        count: u64,
    ) -> Self {
        Self {
            line_start,
            column_start,
            line_end,
            column_end,
            execution_count: count,
            file_id: 0,
            expanded_file_id: 0,
            kind: RegionKind::Code,
        }
    }
}

/// A macro/template/include expansion site and the regions it expands to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    #[serde(rename = "filenames")]
    pub target_filenames: Vec<String>,
    pub source_region: Region,
    pub target_regions: Vec<Region>,
}

/// Coverage info for one function (or one instantiation of a template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    #[serde(rename = "count")]
    pub execution_count: u64,
    pub regions: Vec<Region>,
    /// Files the function's regions refer to; `Region::file_id` indexes
    /// into this list and the first entry is the function's own file.
    pub filenames: Vec<String>,
}

impl FunctionRecord {
    /// The file this function is defined in.
    #[must_use]
    pub fn main_file(&self) -> Option<&str> {
        self.filenames.first().map(String::as_str)
    }
}

/// Raw per-file data returned by the coverage model, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub filename: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub expansions: Vec<Expansion>,
}

impl FileCoverage {
    pub fn new(filename: String) -> Self {
        Self {
            filename,
            ..Default::default()
        }
    }
}

/// A count/covered pair for one coverage dimension. The percentage is
/// always derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageStat {
    pub covered: u64,
    pub count: u64,
}

impl CoverageStat {
    #[must_use]
    pub fn new(covered: u64, count: u64) -> Self {
        Self { covered, count }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.covered, self.count)
    }

    #[must_use]
    pub fn not_covered(&self) -> u64 {
        self.count.saturating_sub(self.covered)
    }

    pub fn add(&mut self, other: &CoverageStat) {
        self.covered += other.covered;
        self.count += other.count;
    }
}

impl Serialize for CoverageStat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CoverageStat", 3)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("covered", &self.covered)?;
        s.serialize_field("percent", &self.percent())?;
        s.end()
    }
}

fn serialize_region_stat<S: Serializer>(
    stat: &CoverageStat,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("RegionStat", 4)?;
    s.serialize_field("count", &stat.count)?;
    s.serialize_field("covered", &stat.covered)?;
    s.serialize_field("notcovered", &stat.not_covered())?;
    s.serialize_field("percent", &stat.percent())?;
    s.end()
}

/// Coverage statistics for one file, or for the whole program when the
/// filename is `"Totals"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileSummary {
    #[serde(skip)]
    pub filename: String,
    #[serde(rename = "lines")]
    pub line_stat: CoverageStat,
    #[serde(rename = "functions")]
    pub function_stat: CoverageStat,
    #[serde(rename = "instantiations")]
    pub instantiation_stat: CoverageStat,
    #[serde(rename = "regions", serialize_with = "serialize_region_stat")]
    pub region_stat: CoverageStat,
}

impl FileSummary {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Fold another summary into this one, dimension by dimension.
    pub fn add(&mut self, other: &FileSummary) {
        self.line_stat.add(&other.line_stat);
        self.function_stat.add(&other.function_stat);
        self.instantiation_stat.add(&other.instantiation_stat);
        self.region_stat.add(&other.region_stat);
    }
}
