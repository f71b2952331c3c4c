use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage input format")]
    UnknownFormat,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No coverage data for source file: {0}")]
    MissingFile(String),

    #[error("Failed to render coverage for '{filename}': {source}")]
    Render {
        filename: String,
        source: Box<ExportError>,
    },

    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Export cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ExportError>;
