#![allow(dead_code)]

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

use covexport::error::Result;
use covexport::mapping::{CoverageMapping, CoverageModel};
use covexport::model::{Expansion, FileCoverage, FunctionRecord, Region, Segment};
use tempfile::TempDir;

/// A file with a single line executed `count` times and one expansion.
pub fn one_line_file(name: &str, count: u64) -> FileCoverage {
    let mut file = FileCoverage::new(name.to_string());
    file.segments = vec![
        Segment {
            line: 1,
            column: 1,
            count,
            has_count: true,
            is_region_entry: true,
        },
        Segment {
            line: 1,
            column: 12,
            count: 0,
            has_count: false,
            is_region_entry: false,
        },
    ];
    file.expansions = vec![Expansion {
        target_filenames: vec![name.to_string(), "macros.h".to_string()],
        source_region: Region::code(1, 3, 1, 8, count),
        target_regions: vec![Region::code(1, 1, 1, 30, count)],
    }];
    file
}

pub fn function(name: &str, count: u64, file: &str) -> FunctionRecord {
    FunctionRecord {
        name: name.to_string(),
        execution_count: count,
        regions: vec![Region::code(1, 1, 1, 12, count)],
        filenames: vec![file.to_string()],
    }
}

/// `names` each with one covered line and one function executed once.
pub fn covered_model(names: &[&str]) -> CoverageMapping {
    let files = names.iter().map(|n| one_line_file(n, 1)).collect();
    let functions = names
        .iter()
        .map(|n| function(&format!("fn_{n}"), 1, n))
        .collect();
    CoverageMapping::from_parts(files, functions).unwrap()
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Delays reads so that files listed first finish last.
pub struct SlowModel {
    pub inner: CoverageMapping,
    pub order: Vec<String>,
}

impl CoverageModel for SlowModel {
    fn unique_source_files(&self) -> Vec<String> {
        self.inner.unique_source_files()
    }

    fn coverage_for_file(&self, filename: &str) -> Result<Cow<'_, FileCoverage>> {
        if let Some(pos) = self.order.iter().position(|f| f == filename) {
            let remaining = (self.order.len() - pos) as u64;
            std::thread::sleep(Duration::from_millis(5 * remaining));
        }
        self.inner.coverage_for_file(filename)
    }

    fn covered_functions(&self) -> &[FunctionRecord] {
        self.inner.covered_functions()
    }
}

/// Write `content` into a fresh temp dir, returning the dir handle and path.
/// The caller must hold onto `TempDir` to keep the file alive.
pub fn write_input(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
