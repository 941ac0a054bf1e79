use serde::{Deserialize, Serialize};

/// Body of a successful `/scan` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub barcode: String,
    #[serde(rename = "type")]
    pub symbology: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
    /// Informational only once `barcode` is present; the result is shown
    /// regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a failed `/scan` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The server message, if it sent a non-empty one.
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref().filter(|m| !m.is_empty())
    }
}
