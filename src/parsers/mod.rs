pub mod lcov;
pub mod model;

use crate::error::Result;
use crate::mapping::CoverageMapping;

/// Every input parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into an in-memory coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageMapping>;
}
