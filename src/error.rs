use thiserror::Error;

/// Result type alias for time-travel operations.
pub type Result<T> = std::result::Result<T, TimeTravelError>;

/// Errors that can occur while driving the time-travel controller.
#[derive(Error, Debug)]
pub enum TimeTravelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to parse a lookup response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Response did not have the expected shape
    #[error("Invalid response from lookup service: {0}")]
    InvalidResponse(String),

    /// Capture date string was not in YYYY-MM format
    #[error("Invalid capture date: {0}")]
    InvalidDate(String),

    /// Missing API key
    #[error("API key required for this operation. Use StreetViewLookup::with_api_key() to set one.")]
    MissingApiKey,

    /// No panorama found within the search radius
    #[error("No panorama found within the search radius")]
    NoPanorama,

    /// History contained no entries with a resolvable capture date
    #[error("Panorama history has no dated entries")]
    EmptyHistory,
}
