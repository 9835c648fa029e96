//! `ReportStorage` contract handle.

use crate::abi::{self, Token};
use crate::rpc::RpcClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use wastewatch_core::{Ledger, LedgerError, Report, ReportId, TxHash, TxReceipt};

const REPORT_COUNT: &str = "reportCount()";
const REPORTS: &str = "reports(uint256)";
const SUBMIT_REPORT: &str = "submitReport(string,string,string)";
const COMPLETE_REPORT: &str = "completeReport(uint256)";

/// Receipt status of a successful transaction.
const STATUS_SUCCESS: &str = "0x1";

/// Fields of `eth_getTransactionReceipt` we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: Option<String>,
    block_number: Option<String>,
}

/// Handle to a deployed report contract, signing as one account
#[derive(Debug, Clone)]
pub struct ReportStorage {
    rpc: Arc<RpcClient>,
    address: String,
    from: String,
    poll_interval: Duration,
    finality_timeout: Duration,
}

impl ReportStorage {
    /// Create a handle for the contract at `address`, sending as `from`.
    #[must_use]
    pub fn new(rpc: Arc<RpcClient>, address: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            rpc,
            address: address.into(),
            from: from.into(),
            poll_interval: Duration::from_secs(1),
            finality_timeout: Duration::from_secs(120),
        }
    }

    /// Set receipt polling cadence and give-up time.
    #[must_use]
    pub fn with_finality(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.finality_timeout = timeout;
        self
    }

    /// Signing account
    #[must_use]
    pub fn signer(&self) -> &str {
        &self.from
    }

    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        let result: String = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": self.address, "data": abi::to_hex(&data) }, "latest"]),
            )
            .await?;
        abi::from_hex(&result)
    }

    async fn send(&self, data: Vec<u8>) -> Result<TxHash, LedgerError> {
        let hash: String = self
            .rpc
            .call(
                "eth_sendTransaction",
                json!([{ "from": self.from, "to": self.address, "data": abi::to_hex(&data) }]),
            )
            .await?;
        tracing::debug!(tx = %hash, "transaction sent");
        Ok(TxHash(hash))
    }
}

#[async_trait]
impl Ledger for ReportStorage {
    async fn report_count(&self) -> Result<u64, LedgerError> {
        let data = self.read(abi::encode_call(REPORT_COUNT, &[])).await?;
        abi::decode_uint(&data, 0)
    }

    async fn report(&self, id: ReportId) -> Result<Report, LedgerError> {
        let data = self.read(abi::encode_call(REPORTS, &[Token::Uint(id.0)])).await?;
        let report = abi::decode_report(&data)?;
        // unset mapping slots decode as id 0
        if report.id != id {
            return Err(LedgerError::ReportNotFound(id));
        }
        Ok(report)
    }

    async fn submit_report(
        &self,
        image_url: &str,
        location: &str,
        description: &str,
    ) -> Result<TxHash, LedgerError> {
        self.send(abi::encode_call(
            SUBMIT_REPORT,
            &[
                Token::Str(image_url.to_string()),
                Token::Str(location.to_string()),
                Token::Str(description.to_string()),
            ],
        ))
        .await
    }

    async fn complete_report(&self, id: ReportId) -> Result<TxHash, LedgerError> {
        self.send(abi::encode_call(COMPLETE_REPORT, &[Token::Uint(id.0)]))
            .await
    }

    async fn await_finality(&self, tx: &TxHash) -> Result<TxReceipt, LedgerError> {
        let started = Instant::now();
        loop {
            let receipt: Option<RpcReceipt> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([tx.0]))
                .await?;

            if let Some(receipt) = receipt {
                if receipt.status.as_deref() != Some(STATUS_SUCCESS) {
                    tracing::warn!(tx = %tx, status = ?receipt.status, "transaction reverted");
                    return Err(LedgerError::Reverted(tx.clone()));
                }
                let block_number = receipt
                    .block_number
                    .as_deref()
                    .map(abi::parse_quantity)
                    .transpose()?;
                return Ok(TxReceipt {
                    tx_hash: tx.clone(),
                    block_number,
                });
            }

            let waited = started.elapsed();
            if waited >= self.finality_timeout {
                return Err(LedgerError::FinalityTimeout {
                    tx: tx.clone(),
                    waited_secs: waited.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
