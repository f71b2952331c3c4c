//! Rendering of a single file's coverage into its report entry.

use serde::Serialize;

use crate::error::Result;
use crate::export::ExportOptions;
use crate::mapping::CoverageModel;
use crate::model::{Expansion, FileSummary, Segment};

/// One entry of the report's `files` list.
///
/// `segments` and `expansions` are absent (not empty) when the detail level
/// leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansions: Option<Vec<Expansion>>,
    pub summary: FileSummary,
}

/// Build the report entry for `filename`. Only reads from the model, so it
/// can run for disjoint files in parallel.
pub fn render_file(
    model: &dyn CoverageModel,
    filename: &str,
    summary: &FileSummary,
    options: &ExportOptions,
) -> Result<FileReport> {
    let mut report = FileReport {
        filename: filename.to_string(),
        segments: None,
        expansions: None,
        summary: summary.clone(),
    };

    if !options.summary_only {
        let coverage = model.coverage_for_file(filename)?.into_owned();
        report.segments = Some(coverage.segments);
        if !options.skip_expansions {
            report.expansions = Some(coverage.expansions);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::CoverageMapping;
    use crate::model::{FileCoverage, Region};

    fn model() -> CoverageMapping {
        let mut file = FileCoverage::new("m.c".to_string());
        file.segments = vec![
            Segment {
                line: 2,
                column: 1,
                count: 1,
                has_count: true,
                is_region_entry: true,
            },
            Segment {
                line: 1,
                column: 1,
                count: 0,
                has_count: false,
                is_region_entry: false,
            },
        ];
        file.expansions = vec![Expansion {
            target_filenames: vec!["m.c".to_string(), "m.h".to_string()],
            source_region: Region::code(2, 3, 2, 10, 1),
            target_regions: vec![Region::code(1, 1, 1, 20, 1)],
        }];
        CoverageMapping::from_parts(vec![file], vec![]).unwrap()
    }

    #[test]
    fn test_render_full_detail_preserves_order() {
        let options = ExportOptions::default();
        let report = render_file(&model(), "m.c", &FileSummary::new("m.c"), &options).unwrap();
        let segments = report.segments.unwrap();
        assert_eq!(segments[0].line, 2);
        assert_eq!(segments[1].line, 1);
        assert_eq!(report.expansions.unwrap().len(), 1);
    }

    #[test]
    fn test_render_skip_expansions() {
        let options = ExportOptions {
            skip_expansions: true,
            ..Default::default()
        };
        let report = render_file(&model(), "m.c", &FileSummary::new("m.c"), &options).unwrap();
        assert!(report.segments.is_some());
        assert!(report.expansions.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("expansions").is_none());
        assert!(json.get("segments").is_some());
    }

    #[test]
    fn test_render_summary_only() {
        let options = ExportOptions {
            summary_only: true,
            ..Default::default()
        };
        let report = render_file(&model(), "m.c", &FileSummary::new("m.c"), &options).unwrap();
        assert!(report.segments.is_none());
        assert!(report.expansions.is_none());

        let json = serde_json::to_value(&report).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["filename", "summary"]);
    }

    #[test]
    fn test_render_summary_only_does_not_touch_model() {
        let options = ExportOptions {
            summary_only: true,
            ..Default::default()
        };
        let empty = CoverageMapping::new();
        let summary = FileSummary::new("gone.c");
        assert!(render_file(&empty, "gone.c", &summary, &options).is_ok());
        assert!(render_file(&empty, "gone.c", &summary, &ExportOptions::default()).is_err());
    }
}
