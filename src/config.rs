use serde::Deserialize;

use crate::error::ConfigError;

/// Element id of the optional `<script type="application/json">` block
/// carrying a [`ScanConfig`] override.
pub const CONFIG_ELEMENT_ID: &str = "scan-config";

/// Everything the scan form needs to know about its endpoint and the
/// texts it shows. Any field left out of the page JSON keeps its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub endpoint: String,
    pub field_name: String,
    /// Shown for a product subfield the server left out.
    pub missing_field: String,
    /// Shown in every product field when no product matched.
    pub no_product: String,
    pub no_product_notice: String,
    /// Non-2xx reply without an `error` message.
    pub unknown_error: String,
    /// Network failure or unreadable reply.
    pub failure: String,
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            endpoint: "/scan".to_string(),
            field_name: "image".to_string(),
            missing_field: "N/A".to_string(),
            no_product: "商品情報なし".to_string(),
            no_product_notice:
                "このバーコードに一致する商品情報がデータベースに見つかりませんでした。"
                    .to_string(),
            unknown_error: "An unknown error occurred".to_string(),
            failure: "Failed to process the image".to_string(),
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// Parse a page-embedded JSON override.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::ParseJson { source })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Empty { field: "endpoint" });
        }
        if self.field_name.trim().is_empty() {
            return Err(ConfigError::Empty { field: "field_name" });
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Empty {
                field: "allowed_extensions",
            });
        }
        Ok(())
    }
}
