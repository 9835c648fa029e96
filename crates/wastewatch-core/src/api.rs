//! Client seams
//!
//! The workflow and dashboard talk to three external services through these
//! traits. Concrete clients live in `wastewatch-storage`,
//! `wastewatch-verify` and `wastewatch-ledger`.

use crate::error::{LedgerError, StorageError, VerificationError};
use crate::types::{ImageUpload, Report, ReportId, TxHash, TxReceipt};
use async_trait::async_trait;
use std::sync::Arc;

/// Hosted object storage for evidence images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an image and return its public URL
    async fn upload(&self, image: &ImageUpload) -> Result<String, StorageError>;
}

/// Model confidence and explanation for one image
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Confidence, 0-100
    pub confidence: f64,
    /// Free-text explanation
    pub explanation: String,
}

/// Remote image classifier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageVerifier: Send + Sync {
    /// Assess whether the image at `image_url` shows illegal dumping
    async fn assess(&self, image_url: &str) -> Result<Assessment, VerificationError>;
}

/// Contract handle exposing the report storage interface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Number of reports on the ledger
    async fn report_count(&self) -> Result<u64, LedgerError>;

    /// Read a single report
    async fn report(&self, id: ReportId) -> Result<Report, LedgerError>;

    /// Send a `submitReport` transaction
    async fn submit_report(
        &self,
        image_url: &str,
        location: &str,
        description: &str,
    ) -> Result<TxHash, LedgerError>;

    /// Send a `completeReport` transaction
    async fn complete_report(&self, id: ReportId) -> Result<TxHash, LedgerError>;

    /// Wait until a transaction is final
    async fn await_finality(&self, tx: &TxHash) -> Result<TxReceipt, LedgerError>;
}

/// Wallet access
///
/// Returns `Ok(None)` when no wallet is present. Implementations derive a
/// fresh handle on every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    /// Obtain a ledger handle, if a wallet is available
    async fn connect(&self) -> Result<Option<Arc<dyn Ledger>>, LedgerError>;
}
