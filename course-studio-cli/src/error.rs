use reqwest::StatusCode;
use thiserror::Error;

/// Text shown in place of a response whenever a submission fails, whatever the cause.
pub const REQUEST_FAILED: &str = "Error occurred while processing your request.";

/// Why a submission failed. Only ever logged; the user sees [`REQUEST_FAILED`].
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered with status {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}
