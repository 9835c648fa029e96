//! Report dashboard
//!
//! Read-through projection of ledger state. The loaded list is never a
//! source of truth: every mutation goes to the ledger and is followed by a
//! full reload.

use crate::api::{Ledger, LedgerConnector};
use crate::error::DashboardError;
use crate::location::GeoPoint;
use crate::types::{Report, ReportId, ReportStats};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Dashboard configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Ledger reads in flight while loading (1 = sequential)
    pub fetch_concurrency: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
        }
    }
}

/// Immutable view state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Reports, most recent first
    pub reports: Vec<Report>,
    /// Aggregate counters
    pub stats: ReportStats,
    /// Report shown in the detail panel
    pub selected: Option<ReportId>,
    /// Where the map is centered
    pub map_center: Option<GeoPoint>,
}

impl DashboardSnapshot {
    /// Build a snapshot from the ledger count and reports in ledger order
    #[must_use]
    pub fn from_ledger(count: u64, reports: Vec<Report>) -> Self {
        let reports = sort_most_recent_first(reports);
        let stats = ReportStats::from_reports(count, &reports);
        Self {
            reports,
            stats,
            selected: None,
            map_center: None,
        }
    }

    /// Select a report for the detail panel
    ///
    /// Recenters the map when the report's location is a coordinate pair;
    /// otherwise the map stays where it was. Unknown ids change nothing.
    #[must_use]
    pub fn select(&self, id: ReportId) -> Self {
        let Some(report) = self.report(id) else {
            return self.clone();
        };
        Self {
            selected: Some(id),
            map_center: report.coordinates().or(self.map_center),
            ..self.clone()
        }
    }

    /// Look up a loaded report
    #[must_use]
    pub fn report(&self, id: ReportId) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// Report currently shown in the detail panel
    #[must_use]
    pub fn selected_report(&self) -> Option<&Report> {
        self.selected.and_then(|id| self.report(id))
    }
}

/// Sort by timestamp descending; ties keep ledger order
#[must_use]
pub fn sort_most_recent_first(mut reports: Vec<Report>) -> Vec<Report> {
    reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    reports
}

/// Read every report from a ledger handle
///
/// Issues at most `concurrency` reads at once and returns them in ledger
/// order (id 1 first).
///
/// # Errors
/// The first ledger error encountered.
pub async fn fetch_reports(
    ledger: &dyn Ledger,
    count: u64,
    concurrency: usize,
) -> Result<Vec<Report>, DashboardError> {
    let reports: Vec<Report> = futures::stream::iter(1..=count)
        .map(|i| ledger.report(ReportId(i)))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    Ok(reports)
}

/// Dashboard controller
pub struct Dashboard {
    config: DashboardConfig,
    connector: Arc<dyn LedgerConnector>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Create new dashboard
    #[must_use]
    pub fn new(config: DashboardConfig, connector: Arc<dyn LedgerConnector>) -> Self {
        Self { config, connector }
    }

    async fn ledger(&self) -> Result<Arc<dyn Ledger>, DashboardError> {
        self.connector
            .connect()
            .await?
            .ok_or(DashboardError::WalletUnavailable)
    }

    /// Load all reports from the ledger
    ///
    /// # Errors
    /// `WalletUnavailable` without a wallet, otherwise the ledger error.
    pub async fn load(&self) -> Result<DashboardSnapshot, DashboardError> {
        let ledger = self.ledger().await?;
        let count = ledger.report_count().await?;
        tracing::debug!(count, "loading reports");

        let reports = fetch_reports(ledger.as_ref(), count, self.config.fetch_concurrency).await?;
        let snapshot = DashboardSnapshot::from_ledger(count, reports);
        tracing::info!(
            total = snapshot.stats.total,
            completed = snapshot.stats.completed,
            pending = snapshot.stats.pending,
            "reports loaded"
        );
        Ok(snapshot)
    }

    /// Mark a report completed, then reload everything
    ///
    /// # Errors
    /// `WalletUnavailable` without a wallet, otherwise the ledger error.
    pub async fn mark_completed(&self, id: ReportId) -> Result<DashboardSnapshot, DashboardError> {
        let ledger = self.ledger().await?;
        let tx = ledger.complete_report(id).await?;
        let receipt = ledger.await_finality(&tx).await?;
        tracing::info!(report = %id, tx = %receipt.tx_hash, "report marked completed");
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockLedger, MockLedgerConnector};
    use crate::error::LedgerError;
    use crate::types::{TxHash, TxReceipt};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn report(id: u64, timestamp: u64, location: &str, completed: bool) -> Report {
        Report {
            id: ReportId(id),
            image_url: format!("https://img.example/{id}.jpg"),
            location: location.to_string(),
            description: format!("report {id}"),
            completed,
            timestamp,
        }
    }

    fn ledger_with(reports: Vec<Report>) -> MockLedger {
        let count = reports.len() as u64;
        let mut ledger = MockLedger::new();
        ledger.expect_report_count().returning(move || Ok(count));
        ledger.expect_report().returning(move |id| {
            reports
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or(LedgerError::ReportNotFound(id))
        });
        ledger
    }

    fn connector_for(ledger: MockLedger) -> Arc<dyn LedgerConnector> {
        let ledger: Arc<dyn Ledger> = Arc::new(ledger);
        let mut connector = MockLedgerConnector::new();
        connector
            .expect_connect()
            .returning(move || Ok(Some(ledger.clone())));
        Arc::new(connector)
    }

    #[test]
    fn sorts_by_timestamp_descending() {
        let sorted = sort_most_recent_first(vec![
            report(1, 10, "a", false),
            report(2, 30, "b", false),
            report(3, 20, "c", false),
        ]);
        let stamps: Vec<u64> = sorted.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![30, 20, 10]);
    }

    #[test]
    fn ties_keep_ledger_order() {
        let sorted = sort_most_recent_first(vec![
            report(1, 10, "a", false),
            report(2, 10, "b", false),
            report(3, 5, "c", false),
        ]);
        let ids: Vec<u64> = sorted.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_sorted_is_non_increasing(stamps in proptest::collection::vec(0u64..1_000, 0..30)) {
            let reports: Vec<Report> = stamps
                .iter()
                .enumerate()
                .map(|(i, t)| report(i as u64 + 1, *t, "x", false))
                .collect();
            let sorted = sort_most_recent_first(reports);
            prop_assert!(sorted.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
            prop_assert_eq!(sorted.len(), stamps.len());
        }
    }

    #[test]
    fn select_recenters_on_coordinates_only() {
        let snapshot = DashboardSnapshot::from_ledger(
            2,
            vec![
                report(1, 10, "13.05, 80.20", false),
                report(2, 20, "near the river", false),
            ],
        );

        let first = snapshot.select(ReportId(1));
        assert_eq!(first.selected, Some(ReportId(1)));
        assert_eq!(first.map_center, Some(GeoPoint::new(13.05, 80.20)));

        let second = first.select(ReportId(2));
        assert_eq!(second.selected, Some(ReportId(2)));
        assert_eq!(second.map_center, Some(GeoPoint::new(13.05, 80.20)));
        assert_eq!(second.selected_report().map(|r| r.location.as_str()), Some("near the river"));

        assert_eq!(second.select(ReportId(99)), second);
    }

    #[tokio::test]
    async fn load_builds_sorted_snapshot_with_stats() {
        let ledger = ledger_with(vec![
            report(1, 10, "a", true),
            report(2, 30, "b", false),
            report(3, 20, "c", true),
            report(4, 5, "d", false),
            report(5, 1, "e", false),
        ]);
        let dashboard = Dashboard::new(DashboardConfig::default(), connector_for(ledger));

        let snapshot = dashboard.load().await.unwrap();
        let ids: Vec<u64> = snapshot.reports.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1, 4, 5]);
        assert_eq!(
            snapshot.stats,
            ReportStats {
                total: 5,
                completed: 2,
                pending: 3
            }
        );
    }

    #[tokio::test]
    async fn sequential_fetch_matches_concurrent_fetch() {
        let reports = vec![
            report(1, 10, "a", false),
            report(2, 30, "b", false),
            report(3, 20, "c", false),
        ];
        let ledger = ledger_with(reports.clone());

        let sequential = fetch_reports(&ledger, 3, 1).await.unwrap();
        let concurrent = fetch_reports(&ledger, 3, 8).await.unwrap();
        assert_eq!(sequential, reports);
        assert_eq!(concurrent, reports);
    }

    #[tokio::test]
    async fn empty_ledger_loads_empty_snapshot() {
        let mut ledger = MockLedger::new();
        ledger.expect_report_count().returning(|| Ok(0));
        ledger.expect_report().times(0);
        let dashboard = Dashboard::new(DashboardConfig::default(), connector_for(ledger));

        let snapshot = dashboard.load().await.unwrap();
        assert!(snapshot.reports.is_empty());
        assert_eq!(snapshot.stats, ReportStats::default());
    }

    #[tokio::test]
    async fn load_without_wallet() {
        let mut connector = MockLedgerConnector::new();
        connector.expect_connect().returning(|| Ok(None));
        let dashboard = Dashboard::new(DashboardConfig::default(), Arc::new(connector));

        assert_eq!(
            dashboard.load().await.unwrap_err(),
            DashboardError::WalletUnavailable
        );
    }

    #[tokio::test]
    async fn mark_completed_waits_then_reloads() {
        let mut ledger = ledger_with(vec![report(1, 10, "a", false)]);
        ledger
            .expect_complete_report()
            .withf(|id| *id == ReportId(1))
            .times(1)
            .returning(|_| Ok(TxHash("0x02".into())));
        ledger.expect_await_finality().times(1).returning(|tx| {
            Ok(TxReceipt {
                tx_hash: tx.clone(),
                block_number: None,
            })
        });
        let dashboard = Dashboard::new(DashboardConfig::default(), connector_for(ledger));

        let snapshot = dashboard.mark_completed(ReportId(1)).await.unwrap();
        assert_eq!(snapshot.reports.len(), 1);
    }

    #[tokio::test]
    async fn failed_completion_does_not_reload() {
        let mut ledger = MockLedger::new();
        ledger.expect_report_count().times(0);
        ledger
            .expect_complete_report()
            .times(1)
            .returning(|_| Err(LedgerError::Rpc {
                code: 4001,
                message: "User denied transaction signature".into(),
            }));
        let dashboard = Dashboard::new(DashboardConfig::default(), connector_for(ledger));

        let err = dashboard.mark_completed(ReportId(3)).await.unwrap_err();
        assert!(matches!(err, DashboardError::Ledger(LedgerError::Rpc { code: 4001, .. })));
    }
}
