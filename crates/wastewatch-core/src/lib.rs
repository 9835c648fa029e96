//! WasteWatch Core - evidence-gated dumping reports
//!
//! The orchestration layer that:
//! - Validates a citizen's report form
//! - Uploads evidence to object storage
//! - Gates the report on a remote image verification
//! - Records accepted reports on the contract ledger
//! - Projects ledger state into a dashboard view
//!
//! # Example
//!
//! ```rust,ignore
//! use wastewatch_core::{ImageUpload, ReportForm, SubmissionWorkflow, WorkflowConfig};
//!
//! # async fn example(store: Arc<dyn ObjectStore>, verifier: Arc<dyn ImageVerifier>,
//! #                  wallet: Arc<dyn LedgerConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = SubmissionWorkflow::new(WorkflowConfig::new(), store, verifier, wallet);
//!
//! let form = ReportForm::new()
//!     .with_image(ImageUpload::new("dump.jpg", "image/jpeg", bytes))
//!     .with_location("13.05, 80.20")
//!     .with_description("Mattresses dumped by the lake");
//! let receipt = workflow.submit(&form).await?;
//!
//! println!("Recorded in {}", receipt.receipt.tx_hash);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod api;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use api::{Assessment, ImageVerifier, Ledger, LedgerConnector, ObjectStore};
pub use dashboard::{Dashboard, DashboardConfig, DashboardSnapshot};
pub use error::{
    DashboardError, LedgerError, StorageError, SubmissionError, SubmissionStage,
    VerificationError,
};
pub use location::{
    format_location, parse_coordinates, prefill_location, FixedPosition, GeoPoint, Geolocator,
    LocationError,
};
pub use types::{
    is_qualifying, ImageUpload, Report, ReportForm, ReportId, ReportStats, TxHash, TxReceipt,
    VerificationResult, QUALIFYING_THRESHOLD,
};
pub use workflow::{SubmissionReceipt, SubmissionWorkflow, WorkflowConfig};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with WasteWatch Core
    pub use crate::{
        Dashboard, ImageUpload, ImageVerifier, Ledger, LedgerConnector, ObjectStore, Report,
        ReportForm, ReportId, SubmissionWorkflow, VerificationResult, WorkflowConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
