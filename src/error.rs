use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input file '{path}': {reason}")]
    Input { path: String, reason: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("API request failed: {0}")]
    ApiFailure(#[from] reqwest::Error),

    #[error("API responded with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse URL: {0}")]
    UrlParsingFailed(#[from] url::ParseError),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read video '{source_name}': {reason}")]
    VideoUnavailable { source_name: String, reason: String },
}

/// Reasons a single CSV row could not be turned into an ad. These never
/// abort the batch; they end up in the failure file.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Upload failed: {0}")]
    Upload(#[source] Error),

    #[error("Creative creation failed: {0}")]
    CreativeCreation(#[source] Error),

    #[error("Ad creation failed: {0}")]
    AdCreation(#[source] Error),

    #[error("Targeting assignment failed: {0}")]
    TargetingAssignment(#[source] Error),
}
