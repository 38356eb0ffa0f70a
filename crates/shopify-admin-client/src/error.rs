use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;

/// Transport or protocol failures talking to the Admin API.
///
/// None of these carry business meaning; remote validation failures arrive
/// as `userErrors` inside a successful response and are never mapped here.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Admin API client is not configured: missing or invalid {0}")]
    NotConfigured(&'static str),

    #[error("invalid access token header: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("Failed to send Admin API request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Admin API rejected the access token (HTTP {0})")]
    Unauthorized(StatusCode),

    #[error("Admin API responded with HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed Admin API response: {0}")]
    MalformedResponse(String),

    #[error("Admin API returned GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    #[error("Admin API response is missing data")]
    MissingData,
}
