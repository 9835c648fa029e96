//! Error types for WasteWatch
//!
//! Provides the error model for:
//! - Object storage uploads
//! - Remote image verification
//! - Ledger reads and transactions
//! - The submission workflow (one variant per halting stage)
//! - The dashboard view

use crate::types::{ReportId, TxHash, VerificationResult};

/// Object storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Request could not be sent or the response not read
    #[error("upload transport failed: {0}")]
    Transport(String),

    /// Storage service rejected the upload
    #[error("storage returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Response carried no hosted URL
    #[error("upload response has no secure_url")]
    MissingUrl,
}

impl StorageError {
    /// Wrap a transport-level failure
    #[inline]
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Image verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// No API key configured
    #[error("verification API key is not set (env {0})")]
    MissingApiKey(String),

    /// Image could not be downloaded
    #[error("Failed to fetch image: {0}")]
    ImageFetch(String),

    /// URL does not point at an image
    #[error("Invalid content type: {0}. URL does not point to a valid image.")]
    InvalidContentType(String),

    /// Image body was empty
    #[error("Image has no content (zero bytes)")]
    EmptyImage,

    /// Inference request failed
    #[error("inference request failed: {0}")]
    Service(String),

    /// Model output held no usable JSON object
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Transport failure talking to the wallet/node
    #[error("ledger transport failed: {0}")]
    Transport(String),

    /// JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Contract data could not be encoded or decoded
    #[error("abi error: {0}")]
    Abi(String),

    /// Transaction was mined but reverted
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    /// Transaction did not finalize in time
    #[error("transaction {tx} not final after {waited_secs}s")]
    FinalityTimeout { tx: TxHash, waited_secs: u64 },

    /// Report id not present on the ledger
    #[error("report {0} not found")]
    ReportNotFound(ReportId),
}

impl LedgerError {
    /// Wrap a transport-level failure
    #[inline]
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Stage at which a submission halted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStage {
    /// Form validation
    Validation,
    /// Object storage upload
    Upload,
    /// Remote verification
    Verification,
    /// Ledger write
    Persist,
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Upload => "upload",
            Self::Verification => "verification",
            Self::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Submission workflow errors
///
/// Variants are mutually exclusive; each halts the workflow at its stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    /// One or more form fields are empty
    #[error("missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// Image upload failed
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    /// Verification completed below the qualifying threshold
    #[error("verification rejected at {}% confidence", .result.confidence)]
    VerificationRejected { result: VerificationResult },

    /// Verification service failed; treated as zero confidence
    #[error("verification service error: {}", .result.explanation)]
    VerificationService { result: VerificationResult },

    /// No wallet available to sign the report
    #[error("no wallet available")]
    WalletUnavailable,

    /// Ledger transaction failed
    #[error("ledger transaction failed: {source}")]
    LedgerTransaction {
        /// Already-uploaded image, not reused on retry
        image_url: String,
        /// Underlying ledger error
        source: LedgerError,
    },
}

impl SubmissionError {
    /// Stage that produced the error
    #[must_use]
    pub fn stage(&self) -> SubmissionStage {
        match self {
            Self::Validation { .. } => SubmissionStage::Validation,
            Self::Upload(_) => SubmissionStage::Upload,
            Self::VerificationRejected { .. } | Self::VerificationService { .. } => {
                SubmissionStage::Verification
            }
            Self::WalletUnavailable | Self::LedgerTransaction { .. } => SubmissionStage::Persist,
        }
    }

    /// Verification result attached to the error, if any
    #[must_use]
    pub fn verification(&self) -> Option<&VerificationResult> {
        match self {
            Self::VerificationRejected { result } | Self::VerificationService { result } => {
                Some(result)
            }
            _ => None,
        }
    }

    /// Message shown to the reporter
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { .. } => "All fields are required!".to_string(),
            Self::Upload(_) => "Image upload failed!".to_string(),
            Self::VerificationRejected { result } | Self::VerificationService { result } => {
                format!(
                    "Verification failed: AI is only {}% confident this shows illegal dumping.",
                    result.confidence
                )
            }
            Self::WalletUnavailable => "No wallet connected!".to_string(),
            Self::LedgerTransaction { .. } => "Transaction failed!".to_string(),
        }
    }
}

/// Dashboard errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    /// No wallet available to read or write the ledger
    #[error("no wallet available")]
    WalletUnavailable,

    /// Ledger call failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_error_stages() {
        assert_eq!(
            SubmissionError::Validation {
                missing: vec!["image"]
            }
            .stage(),
            SubmissionStage::Validation
        );
        assert_eq!(
            SubmissionError::Upload(StorageError::MissingUrl).stage(),
            SubmissionStage::Upload
        );
        assert_eq!(
            SubmissionError::VerificationService {
                result: VerificationResult::failed("boom")
            }
            .stage(),
            SubmissionStage::Verification
        );
        assert_eq!(
            SubmissionError::WalletUnavailable.stage(),
            SubmissionStage::Persist
        );
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            SubmissionError::Validation {
                missing: vec!["location"]
            }
            .user_message(),
            "All fields are required!"
        );
        assert_eq!(
            SubmissionError::Upload(StorageError::transport("dns")).user_message(),
            "Image upload failed!"
        );
        let rejected = SubmissionError::VerificationRejected {
            result: VerificationResult::from_assessment(49.0, "just a bin"),
        };
        assert_eq!(
            rejected.user_message(),
            "Verification failed: AI is only 49% confident this shows illegal dumping."
        );
        let tx = SubmissionError::LedgerTransaction {
            image_url: "https://img/1.jpg".into(),
            source: LedgerError::Reverted(TxHash("0xabc".into())),
        };
        assert_eq!(tx.user_message(), "Transaction failed!");
    }

    #[test]
    fn verification_attached_only_to_verification_errors() {
        let err = SubmissionError::VerificationService {
            result: VerificationResult::failed("timeout"),
        };
        assert_eq!(err.verification().map(|r| r.confidence), Some(0.0));
        assert!(SubmissionError::WalletUnavailable.verification().is_none());
    }

    #[test]
    fn validation_display_lists_fields() {
        let err = SubmissionError::Validation {
            missing: vec!["image", "description"],
        };
        assert_eq!(err.to_string(), "missing required fields: image, description");
    }
}
