pub mod cli;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod ingest;
pub mod mapping;
pub mod model;
pub mod parsers;
pub mod render;
pub mod summary;
