//! Report submission workflow
//!
//! Orchestrates one submission end to end:
//! - Validates the form snapshot
//! - Uploads the evidence image
//! - Screens it with the remote verifier (unless bypassed)
//! - Records the report on the ledger and waits for finality
//!
//! Every failure halts the workflow at its stage. Nothing is retried and
//! nothing is rolled back: each external system is append-only.

use crate::api::{ImageVerifier, LedgerConnector, ObjectStore};
use crate::error::SubmissionError;
use crate::types::{ReportForm, TxReceipt, VerificationResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Workflow configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Skip remote verification and treat every image as qualifying
    ///
    /// Fixed at build time by the `bypass-verification` feature; never read
    /// from configuration files.
    #[serde(skip)]
    pub bypass_verification: bool,
}

impl WorkflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With verification bypass
    #[inline]
    #[must_use]
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass_verification = bypass;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            bypass_verification: cfg!(feature = "bypass-verification"),
        }
    }
}

/// Successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Hosted evidence image
    pub image_url: String,
    /// Verification outcome (synthesized when bypassed)
    pub verification: VerificationResult,
    /// Whether verification was skipped
    pub bypassed: bool,
    /// Description as written to the ledger
    pub recorded_description: String,
    /// Finalized transaction
    pub receipt: TxReceipt,
}

/// Append the verification note to a report description
#[must_use]
pub fn annotate_description(
    description: &str,
    verification: &VerificationResult,
    bypassed: bool,
) -> String {
    if bypassed {
        format!("{description}\n\nVerification: Bypassed in development mode")
    } else {
        format!(
            "{description}\n\nVerification: {}% confident it shows illegal dumping",
            verification.confidence
        )
    }
}

/// The submission orchestrator
pub struct SubmissionWorkflow {
    config: WorkflowConfig,
    store: Arc<dyn ObjectStore>,
    verifier: Arc<dyn ImageVerifier>,
    connector: Arc<dyn LedgerConnector>,
}

impl std::fmt::Debug for SubmissionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionWorkflow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SubmissionWorkflow {
    /// Create new workflow over the three clients
    #[must_use]
    pub fn new(
        config: WorkflowConfig,
        store: Arc<dyn ObjectStore>,
        verifier: Arc<dyn ImageVerifier>,
        connector: Arc<dyn LedgerConnector>,
    ) -> Self {
        Self {
            config,
            store,
            verifier,
            connector,
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Submit a report
    ///
    /// # Workflow
    /// 1. Validate that image, location and description are present
    /// 2. Upload the image
    /// 3. Verify it (or synthesize a passing result when bypassed)
    /// 4. Write the annotated report to the ledger and await finality
    ///
    /// # Errors
    /// One [`SubmissionError`] variant per halting stage.
    pub async fn submit(&self, form: &ReportForm) -> Result<SubmissionReceipt, SubmissionError> {
        // 1. Validation
        let missing = form.missing_fields();
        let image = match (&form.image, missing.is_empty()) {
            (Some(image), true) => image,
            _ => {
                tracing::warn!(?missing, "submission rejected by validation");
                return Err(SubmissionError::Validation { missing });
            }
        };

        // 2. Upload
        tracing::info!(file = %image.file_name, bytes = image.bytes.len(), "uploading evidence");
        let image_url = self.store.upload(image).await.map_err(|e| {
            tracing::error!("image upload failed: {}", e);
            SubmissionError::from(e)
        })?;
        tracing::debug!(url = %image_url, "evidence uploaded");

        // 3. Verification
        let bypassed = self.config.bypass_verification;
        let verification = if bypassed {
            tracing::info!("image verification bypassed");
            VerificationResult::bypassed()
        } else {
            self.verify(&image_url).await?
        };

        // 4. Persist
        let recorded_description = annotate_description(&form.description, &verification, bypassed);
        let receipt = self
            .persist(&image_url, &form.location, &recorded_description)
            .await?;

        tracing::info!(tx = %receipt.tx_hash, "report submitted");
        Ok(SubmissionReceipt {
            image_url,
            verification,
            bypassed,
            recorded_description,
            receipt,
        })
    }

    /// Screen an uploaded image; fails closed on any service error
    async fn verify(&self, image_url: &str) -> Result<VerificationResult, SubmissionError> {
        let result = match self.verifier.assess(image_url).await {
            Ok(assessment) => {
                VerificationResult::from_assessment(assessment.confidence, assessment.explanation)
            }
            Err(e) => {
                tracing::error!("image verification failed: {}", e);
                return Err(SubmissionError::VerificationService {
                    result: VerificationResult::failed(e),
                });
            }
        };

        if result.is_illegal_dumping {
            tracing::info!(confidence = result.confidence, "image verified");
            Ok(result)
        } else {
            tracing::warn!(confidence = result.confidence, "image did not qualify");
            Err(SubmissionError::VerificationRejected { result })
        }
    }

    /// Write the report and wait for the transaction to finalize
    async fn persist(
        &self,
        image_url: &str,
        location: &str,
        description: &str,
    ) -> Result<TxReceipt, SubmissionError> {
        let tx_failed = |source| SubmissionError::LedgerTransaction {
            image_url: image_url.to_string(),
            source,
        };

        let Some(ledger) = self.connector.connect().await.map_err(tx_failed)? else {
            tracing::warn!("no wallet available; report not recorded");
            return Err(SubmissionError::WalletUnavailable);
        };

        let tx = ledger
            .submit_report(image_url, location, description)
            .await
            .map_err(|e| {
                tracing::error!("submitReport failed: {}", e);
                tx_failed(e)
            })?;
        tracing::debug!(tx = %tx, "awaiting finality");

        ledger.await_finality(&tx).await.map_err(|e| {
            tracing::error!("transaction {} failed: {}", tx, e);
            tx_failed(e)
        })
    }
}
