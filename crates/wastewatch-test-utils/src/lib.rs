//! Testing utilities for WasteWatch workspace
//!
//! In-memory stand-ins for the three external services, plus fixtures.
//! Every fake counts its calls so tests can assert which stages ran.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use wastewatch_core::{
    Assessment, ImageUpload, ImageVerifier, Ledger, LedgerConnector, LedgerError, ObjectStore,
    Report, ReportForm, ReportId, StorageError, TxHash, TxReceipt, VerificationError,
};

pub const SAMPLE_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/dump.jpg";

pub fn sample_image() -> ImageUpload {
    ImageUpload::new("dump.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10])
}

pub fn complete_form() -> ReportForm {
    ReportForm::new()
        .with_image(sample_image())
        .with_location("13.050000, 80.200000")
        .with_description("Sacks of construction waste behind the bus depot")
}

pub fn report_fixture(id: u64, timestamp: u64, completed: bool) -> Report {
    Report {
        id: ReportId(id),
        image_url: format!("https://res.cloudinary.com/demo/image/upload/{id}.jpg"),
        location: "13.05, 80.20".to_string(),
        description: format!("report {id}"),
        completed,
        timestamp,
    }
}

/// Object store that returns a fixed outcome
#[derive(Debug)]
pub struct FakeStore {
    outcome: Result<String, StorageError>,
    uploads: AtomicUsize,
}

impl FakeStore {
    pub fn returning(url: impl Into<String>) -> Self {
        Self {
            outcome: Ok(url.into()),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: StorageError) -> Self {
        Self {
            outcome: Err(err),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(&self, _image: &ImageUpload) -> Result<String, StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Verifier that returns a fixed confidence or error
#[derive(Debug)]
pub struct FixedVerifier {
    outcome: Result<Assessment, VerificationError>,
    calls: AtomicUsize,
}

impl FixedVerifier {
    pub fn confident(confidence: f64) -> Self {
        Self {
            outcome: Ok(Assessment {
                confidence,
                explanation: format!("{confidence}% looks like dumped waste"),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: VerificationError) -> Self {
        Self {
            outcome: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageVerifier for FixedVerifier {
    async fn assess(&self, _image_url: &str) -> Result<Assessment, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Ledger held in memory
///
/// Assigns sequential ids from 1 and a monotonically increasing clock.
#[derive(Debug)]
pub struct InMemoryLedger {
    reports: Mutex<Vec<Report>>,
    clock: AtomicU64,
    transactions: AtomicUsize,
    fail_finality: Mutex<Option<LedgerError>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_reports(Vec::new())
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        let clock = reports.iter().map(|r| r.timestamp).max().unwrap_or(1_700_000_000);
        Self {
            reports: Mutex::new(reports),
            clock: AtomicU64::new(clock),
            transactions: AtomicUsize::new(0),
            fail_finality: Mutex::new(None),
        }
    }

    /// Make the next `await_finality` fail with `err`
    pub fn fail_next_finality(&self, err: LedgerError) {
        *self.fail_finality.lock() = Some(err);
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    fn next_tx(&self) -> TxHash {
        let n = self.transactions.fetch_add(1, Ordering::SeqCst) + 1;
        TxHash(format!("0x{n:064x}"))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn report_count(&self) -> Result<u64, LedgerError> {
        Ok(self.reports.lock().len() as u64)
    }

    async fn report(&self, id: ReportId) -> Result<Report, LedgerError> {
        self.reports
            .lock()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(LedgerError::ReportNotFound(id))
    }

    async fn submit_report(
        &self,
        image_url: &str,
        location: &str,
        description: &str,
    ) -> Result<TxHash, LedgerError> {
        let timestamp = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let mut reports = self.reports.lock();
        let id = ReportId(reports.len() as u64 + 1);
        reports.push(Report {
            id,
            image_url: image_url.to_string(),
            location: location.to_string(),
            description: description.to_string(),
            completed: false,
            timestamp,
        });
        drop(reports);
        Ok(self.next_tx())
    }

    async fn complete_report(&self, id: ReportId) -> Result<TxHash, LedgerError> {
        let mut reports = self.reports.lock();
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(LedgerError::ReportNotFound(id))?;
        report.completed = true;
        drop(reports);
        Ok(self.next_tx())
    }

    async fn await_finality(&self, tx: &TxHash) -> Result<TxReceipt, LedgerError> {
        if let Some(err) = self.fail_finality.lock().take() {
            return Err(err);
        }
        Ok(TxReceipt {
            tx_hash: tx.clone(),
            block_number: Some(self.transactions() as u64),
        })
    }
}

/// Wallet that is either present (backed by a shared ledger) or absent
#[derive(Debug, Clone)]
pub struct StaticWallet {
    ledger: Option<Arc<InMemoryLedger>>,
    connects: Arc<AtomicUsize>,
}

impl StaticWallet {
    pub fn connected(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            ledger: Some(ledger),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn absent() -> Self {
        Self {
            ledger: None,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerConnector for StaticWallet {
    async fn connect(&self) -> Result<Option<Arc<dyn Ledger>>, LedgerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ledger
            .clone()
            .map(|ledger| ledger as Arc<dyn Ledger>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_ledger_assigns_sequential_ids() {
        let ledger = InMemoryLedger::new();
        ledger.submit_report("u1", "l1", "d1").await.unwrap();
        ledger.submit_report("u2", "l2", "d2").await.unwrap();

        assert_eq!(ledger.report_count().await.unwrap(), 2);
        let second = ledger.report(ReportId(2)).await.unwrap();
        assert_eq!(second.image_url, "u2");
        assert!(second.timestamp > ledger.report(ReportId(1)).await.unwrap().timestamp);
    }

    #[tokio::test]
    async fn complete_unknown_report_fails() {
        let ledger = InMemoryLedger::new();
        assert_eq!(
            ledger.complete_report(ReportId(4)).await.unwrap_err(),
            LedgerError::ReportNotFound(ReportId(4))
        );
    }

    #[tokio::test]
    async fn absent_wallet_connects_to_nothing() {
        let wallet = StaticWallet::absent();
        assert!(wallet.connect().await.unwrap().is_none());
        assert_eq!(wallet.connects(), 1);
    }
}
