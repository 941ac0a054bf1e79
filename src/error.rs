/// Rejections raised before any request leaves the browser.
///
/// The `Display` text is what the error panel shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select an image file")]
    NoFileSelected,
    #[error("File type not allowed. Please upload an image ({allowed})")]
    UnsupportedType { name: String, allowed: String },
    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
    #[error("A scan is already in progress")]
    InFlight,
}

/// The request could not be completed or its body could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("browser environment unavailable: {0}")]
    Environment(String),
    #[error("network request failed: {0}")]
    Network(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse scan config: {source}")]
    ParseJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("scan config field `{field}` must not be empty")]
    Empty { field: &'static str },
}
