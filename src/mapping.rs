//! The coverage model the exporter reads from, and the filename filter used
//! to narrow the file set before an export.
//!
//! `CoverageModel` is the seam: anything that can answer per-file and
//! per-function queries can be exported. `CoverageMapping` is the in-memory
//! implementation used by the CLI, loaded from a JSON model file or built by
//! one of the input parsers.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Read;

use regex::Regex;
use serde::Deserialize;

use crate::error::{ExportError, Result};
use crate::model::{FileCoverage, FunctionRecord};

/// Read-only access to computed coverage. Implementations must be safe for
/// concurrent reads; the dispatcher queries disjoint files from several
/// worker threads at once.
pub trait CoverageModel: Sync {
    /// Every source file with coverage, sorted and deduplicated.
    fn unique_source_files(&self) -> Vec<String>;

    /// Segments and expansions for one file, ordered by source position.
    /// Models that hold the data in memory hand out a borrow.
    fn coverage_for_file(&self, filename: &str) -> Result<Cow<'_, FileCoverage>>;

    /// Every function record, in the model's iteration order.
    fn covered_functions(&self) -> &[FunctionRecord];
}

/// Decides whether a filename should be left out of an export.
pub trait FilenameFilter {
    fn matches_filename(&self, filename: &str) -> bool;
}

/// Excludes files whose name matches any of a set of regular expressions.
#[derive(Debug, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Regex>,
}

impl IgnoreFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ExportError::Config(format!("invalid filename regex '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }
}

impl FilenameFilter for IgnoreFilter {
    fn matches_filename(&self, filename: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(filename))
    }
}

/// The model's source files minus those the filter matches.
pub fn source_files(model: &dyn CoverageModel, ignore: &dyn FilenameFilter) -> Vec<String> {
    model
        .unique_source_files()
        .into_iter()
        .filter(|f| !ignore.matches_filename(f))
        .collect()
}

/// On-disk shape of a coverage model file.
#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default)]
    files: Vec<FileCoverage>,
    #[serde(default)]
    functions: Vec<FunctionRecord>,
}

/// In-memory coverage model.
#[derive(Debug, Clone, Default)]
pub struct CoverageMapping {
    files: BTreeMap<String, FileCoverage>,
    functions: Vec<FunctionRecord>,
}

impl CoverageMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from per-file data and function records. Two entries
    /// for the same filename are rejected.
    pub fn from_parts(files: Vec<FileCoverage>, functions: Vec<FunctionRecord>) -> Result<Self> {
        let mut mapping = Self::new();
        for file in files {
            mapping.add_file(file)?;
        }
        mapping.functions = functions;
        Ok(mapping)
    }

    /// Load a model from its JSON representation:
    /// `{"files": [{"filename", "segments", "expansions"}], "functions": [...]}`.
    pub fn from_json(reader: impl Read) -> Result<Self> {
        let raw: MappingFile = serde_json::from_reader(reader)?;
        Self::from_parts(raw.files, raw.functions)
    }

    pub fn add_file(&mut self, file: FileCoverage) -> Result<()> {
        if self.files.contains_key(&file.filename) {
            return Err(ExportError::Parse(format!(
                "duplicate coverage entry for '{}'",
                file.filename
            )));
        }
        self.files.insert(file.filename.clone(), file);
        Ok(())
    }

    pub fn add_function(&mut self, function: FunctionRecord) {
        self.functions.push(function);
    }
}

impl CoverageModel for CoverageMapping {
    fn unique_source_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn coverage_for_file(&self, filename: &str) -> Result<Cow<'_, FileCoverage>> {
        self.files
            .get(filename)
            .map(Cow::Borrowed)
            .ok_or_else(|| ExportError::MissingFile(filename.to_string()))
    }

    fn covered_functions(&self) -> &[FunctionRecord] {
        &self.functions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "files": [
            {"filename": "src/b.c", "segments": [[1, 1, 2, true, true], [1, 9, 0, false, false]]},
            {"filename": "src/a.c", "segments": [], "expansions": []},
            {"filename": "vendor/x.c"}
        ],
        "functions": [
            {"name": "main", "count": 2, "regions": [[1, 1, 1, 9, 2, 0, 0, 0]],
             "filenames": ["src/b.c"]}
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let mapping = CoverageMapping::from_json(MODEL.as_bytes()).unwrap();
        assert_eq!(
            mapping.unique_source_files(),
            vec!["src/a.c", "src/b.c", "vendor/x.c"]
        );
        let b = mapping.coverage_for_file("src/b.c").unwrap();
        assert_eq!(b.segments.len(), 2);
        assert_eq!(b.segments[0].count, 2);
        assert_eq!(mapping.covered_functions().len(), 1);
        assert_eq!(mapping.covered_functions()[0].main_file(), Some("src/b.c"));
    }

    #[test]
    fn test_coverage_for_file_borrows() {
        let mapping = CoverageMapping::from_json(MODEL.as_bytes()).unwrap();
        let b = mapping.coverage_for_file("src/b.c").unwrap();
        assert!(matches!(b, Cow::Borrowed(_)));
    }

    #[test]
    fn test_missing_file() {
        let mapping = CoverageMapping::new();
        let err = mapping.coverage_for_file("nope.c").unwrap_err();
        assert!(matches!(err, ExportError::MissingFile(ref f) if f == "nope.c"));
    }

    #[test]
    fn test_duplicate_file_rejected() {
        let files = vec![
            FileCoverage::new("a.c".to_string()),
            FileCoverage::new("a.c".to_string()),
        ];
        assert!(CoverageMapping::from_parts(files, vec![]).is_err());
    }

    #[test]
    fn test_ignore_filter() {
        let mapping = CoverageMapping::from_json(MODEL.as_bytes()).unwrap();
        let filter = IgnoreFilter::new(&["^vendor/".to_string()]).unwrap();
        assert_eq!(
            source_files(&mapping, &filter),
            vec!["src/a.c", "src/b.c"]
        );
        let none = IgnoreFilter::default();
        assert_eq!(source_files(&mapping, &none).len(), 3);
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = IgnoreFilter::new(&["(".to_string()]).unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }
}
