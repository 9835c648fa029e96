//! WasteWatch Verify - remote image verification
//!
//! Asks a hosted multimodal model whether an uploaded image shows illegal
//! dumping and turns its answer into an [`Assessment`].
//!
//! # Example
//!
//! ```rust,ignore
//! use wastewatch_verify::{GeminiVerifier, VerificationConfig};
//!
//! let verifier = GeminiVerifier::from_config(&VerificationConfig::default())?;
//! let result = verifier.verify_image("https://res.cloudinary.com/demo/dump.jpg").await;
//! println!("{}% - {}", result.confidence, result.explanation);
//! ```
//!
//! [`Assessment`]: wastewatch_core::Assessment

#![warn(unreachable_pub)]

pub mod client;
pub mod response;

pub use client::{GeminiVerifier, PROMPT};
pub use response::{extract_json_object, parse_assessment};

use serde::{Deserialize, Serialize};
use wastewatch_core::VerificationError;

/// Default inference endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Verification client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// API base URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Inline API key; prefer the environment.
    pub api_key: Option<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
        }
    }
}

impl VerificationConfig {
    /// Inline key if set, otherwise the environment variable.
    ///
    /// # Errors
    /// `MissingApiKey` when neither yields a non-empty key.
    pub fn resolve_api_key(&self) -> Result<String, VerificationError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VerificationError::MissingApiKey(self.api_key_env.clone()))
    }
}
