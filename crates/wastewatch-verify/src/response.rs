//! Model output parsing.
//!
//! The model answers in free text that should contain one JSON object
//! `{confidence, explanation}`. Only the first `{...}` span is considered;
//! anything that does not parse is an error, which callers fail closed on.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use wastewatch_core::{Assessment, VerificationError};

/// First brace-delimited span, non-greedy, across newlines.
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*?\}").expect("JSON span pattern is valid"));

const NO_EXPLANATION: &str = "No explanation provided";

/// Extract the first `{...}` span from model text.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Parse model text into an assessment.
///
/// A missing or non-numeric `confidence` counts as 0; a missing
/// `explanation` is replaced by a placeholder.
///
/// # Errors
/// `MalformedResponse` when no JSON object is present or it fails to parse.
pub fn parse_assessment(text: &str) -> Result<Assessment, VerificationError> {
    let span = extract_json_object(text).ok_or_else(|| {
        VerificationError::MalformedResponse("no JSON object in model output".to_string())
    })?;

    let value: Value = serde_json::from_str(span)
        .map_err(|e| VerificationError::MalformedResponse(e.to_string()))?;

    let confidence = value
        .get("confidence")
        .and_then(|c| c.as_f64().or_else(|| c.as_str()?.trim().parse().ok()))
        .filter(|c| c.is_finite())
        .unwrap_or(0.0);

    let explanation = value
        .get("explanation")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .unwrap_or(NO_EXPLANATION)
        .to_string();

    Ok(Assessment {
        confidence,
        explanation,
    })
}
