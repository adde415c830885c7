//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::FormatPolicy;

/// Default label asset, read from the asset root.
const DEFAULT_PALETTE_ASSET: &str = "color_labels.json";
/// Default model asset name used by the demo and host wrappers.
const DEFAULT_MODEL_ASSET: &str = "color_model.tflite";

/// Configuration for a [`ColorLens`](crate::service::ColorLens) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorLensConfig {
    /// Name of the label asset loaded by `init_model`.
    pub palette_asset: String,
    /// Model asset the host passes when it has no explicit name.
    pub model_asset: String,
    /// How to treat host pixel formats the codec does not support.
    pub format_policy: FormatPolicy,
}

impl Default for ColorLensConfig {
    fn default() -> Self {
        Self {
            palette_asset: DEFAULT_PALETTE_ASSET.to_string(),
            model_asset: DEFAULT_MODEL_ASSET.to_string(),
            format_policy: FormatPolicy::default(),
        }
    }
}

impl ColorLensConfig {
    /// Defaults overridden by `COLORLENS_PALETTE_ASSET`,
    /// `COLORLENS_MODEL_ASSET` and `COLORLENS_STRICT_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(asset) = lookup("COLORLENS_PALETTE_ASSET").filter(|s| !s.is_empty()) {
            config.palette_asset = asset;
        }
        if let Some(asset) = lookup("COLORLENS_MODEL_ASSET").filter(|s| !s.is_empty()) {
            config.model_asset = asset;
        }
        if let Some(strict) = lookup("COLORLENS_STRICT_FORMAT") {
            config.format_policy = match strict.trim() {
                "1" | "true" | "yes" => FormatPolicy::Strict,
                _ => FormatPolicy::Permissive,
            };
        }
        config
    }
}
