//! WasteWatch Ledger - contract client over JSON-RPC
//!
//! Talks to the deployed `ReportStorage` contract through a node that holds
//! the operator's account:
//! - [`WalletConnector`] resolves the signing account on each connect
//! - [`ReportStorage`] reads reports and sends transactions
//! - [`abi`] encodes calls and decodes results

#![warn(unreachable_pub)]

pub mod abi;
pub mod contract;
pub mod rpc;
pub mod wallet;

pub use contract::ReportStorage;
pub use rpc::RpcClient;
pub use wallet::WalletConnector;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Address of the deployed report contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x6c140d512Dd29017D70a7ca9B255645293F8F300";

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Node URL; `None` means no wallet.
    pub rpc_url: Option<String>,
    /// Contract address.
    pub contract_address: String,
    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up waiting for a receipt after this many seconds.
    pub finality_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            poll_interval_ms: 1_000,
            finality_timeout_secs: 120,
        }
    }
}

impl LedgerConfig {
    /// Polling interval as a duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Finality timeout as a duration
    #[must_use]
    pub fn finality_timeout(&self) -> Duration {
        Duration::from_secs(self.finality_timeout_secs)
    }
}
