/// Parser for JSON coverage model files, the lossless input format:
///
///   {
///     "files": [
///       {"filename": "...", "segments": [[line, col, count, has_count, is_entry], ...],
///        "expansions": [{"filenames": [...], "source_region": [...], "target_regions": [...]}]}
///     ],
///     "functions": [{"name": "...", "count": N, "regions": [[...]], "filenames": [...]}]
///   }
use super::Parser;
use crate::error::Result;
use crate::mapping::CoverageMapping;

pub struct ModelParser;

impl Parser for ModelParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageMapping> {
        CoverageMapping::from_json(input)
    }
}
