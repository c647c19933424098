use thiserror::Error;

/// Errors surfaced by the segmentation engine.
///
/// None of these are fatal to the hosting application: a failed upload
/// leaves the session's previous topology in place, and a failed progress
/// write only loses that record.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sample network unavailable: {0}")]
    SampleUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Progress store rejected record: {0}")]
    Progress(String),
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
