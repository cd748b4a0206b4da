//! Custom error types for rustspringer.
//!
//! Every fallible operation returns `Result<T, SpringerError>`. Nothing is
//! retried: an error aborts the aggregation run that produced it.

use thiserror::Error;

/// Main error type for rustspringer operations.
#[derive(Debug, Error)]
pub enum SpringerError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body or facet entry is not the JSON we expect
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response carries fewer facets than the country facet lookup needs
    #[error("Country facet missing: response has {found} facet(s), need at least {needed}")]
    FacetMissing {
        /// Number of facets in the response
        found: usize,
        /// Minimum number of facets required
        needed: usize,
    },

    /// Missing key or malformed value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown column requested from a publications table
    #[error("Unknown column: {0}")]
    Column(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering error
    #[error("Plot error: {0}")]
    Plot(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `SpringerError`
pub type Result<T> = std::result::Result<T, SpringerError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| SpringerError::Parse(msg.to_string()))
    }
}
