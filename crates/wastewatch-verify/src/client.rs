//! Gemini-compatible verification client.
//!
//! Downloads the hosted image, inlines it as base64 next to a fixed prompt,
//! and asks the model for a `{confidence, explanation}` object.

use crate::response::parse_assessment;
use crate::VerificationConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use wastewatch_core::{Assessment, ImageVerifier, VerificationError, VerificationResult};

/// Prompt sent with every image.
pub const PROMPT: &str = "\
Analyze this image and determine if it shows illegal waste dumping or improper waste disposal.
Rate your confidence from 0-100 on whether this image shows illegal dumping.
Provide a brief explanation of what you see that indicates illegal dumping or why it might not be.
Return your answer in JSON format:
{
  \"confidence\": number between 0-100,
  \"explanation\": \"brief explanation of your assessment\"
}";

/// Media type declared for the inlined image.
const INLINE_MIME_TYPE: &str = "image/jpeg";

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

/// Response body of `generateContent`.
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Remote multimodal verifier.
pub struct GeminiVerifier {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for GeminiVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiVerifier")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiVerifier {
    /// Create a verifier from configuration.
    ///
    /// Resolves the API key immediately.
    ///
    /// # Errors
    /// `MissingApiKey` when neither the config nor the environment has one.
    pub fn from_config(config: &VerificationConfig) -> Result<Self, VerificationError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(api_key, config.endpoint.clone(), config.model.clone()))
    }

    /// Create from explicit parameters (useful for testing).
    #[must_use]
    pub fn new(api_key: String, endpoint: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint,
            model,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Download an image and return it base64-encoded.
    async fn fetch_image_base64(&self, image_url: &str) -> Result<String, VerificationError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| VerificationError::ImageFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::ImageFetch(status.to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(VerificationError::InvalidContentType(content_type));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VerificationError::ImageFetch(e.to_string()))?;
        if bytes.is_empty() {
            return Err(VerificationError::EmptyImage);
        }

        tracing::debug!(bytes = bytes.len(), content_type = %content_type, "image fetched");
        Ok(STANDARD.encode(&bytes))
    }

    /// Ask the model about an already-encoded image and return its text.
    async fn generate(&self, image_base64: String) -> Result<String, VerificationError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [
                    RequestPart::Text { text: PROMPT },
                    RequestPart::Image {
                        inline_data: InlineData {
                            mime_type: INLINE_MIME_TYPE,
                            data: image_base64,
                        },
                    },
                ],
            }],
        };

        tracing::debug!(model = %self.model, "sending verification request");
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VerificationError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(VerificationError::Service(format!(
                "model API returned {status}: {error_body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::Service(e.to_string()))?;
        Ok(parsed.text())
    }

    /// Verify an image, failing closed.
    ///
    /// Any error becomes a zero-confidence, non-qualifying result.
    pub async fn verify_image(&self, image_url: &str) -> VerificationResult {
        match self.assess(image_url).await {
            Ok(assessment) => {
                VerificationResult::from_assessment(assessment.confidence, assessment.explanation)
            }
            Err(e) => {
                tracing::error!("Image verification failed: {}", e);
                VerificationResult::failed(e)
            }
        }
    }
}

#[async_trait]
impl ImageVerifier for GeminiVerifier {
    async fn assess(&self, image_url: &str) -> Result<Assessment, VerificationError> {
        let image = self.fetch_image_base64(image_url).await?;
        let text = self.generate(image).await?;
        let assessment = parse_assessment(&text)?;
        tracing::debug!(confidence = assessment.confidence, "model assessment parsed");
        Ok(assessment)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
