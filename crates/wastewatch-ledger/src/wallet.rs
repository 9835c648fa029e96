//! Wallet connector backed by a node's unlocked accounts.

use crate::contract::ReportStorage;
use crate::rpc::RpcClient;
use crate::LedgerConfig;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use wastewatch_core::{Ledger, LedgerConnector, LedgerError};

/// Produces a fresh [`ReportStorage`] handle per `connect` call.
///
/// "No wallet" means no RPC URL configured or no account exposed by the
/// node. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct WalletConnector {
    http: reqwest::Client,
    config: LedgerConfig,
}

impl WalletConnector {
    /// Create a connector.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a connector sharing an HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, config: LedgerConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl LedgerConnector for WalletConnector {
    async fn connect(&self) -> Result<Option<Arc<dyn Ledger>>, LedgerError> {
        let Some(url) = self.config.rpc_url.as_deref() else {
            tracing::debug!("no rpc url configured");
            return Ok(None);
        };

        let rpc = Arc::new(RpcClient::new(self.http.clone(), url));
        let accounts: Vec<String> = rpc.call("eth_accounts", json!([])).await?;
        let Some(signer) = accounts.into_iter().next() else {
            tracing::warn!(url, "node exposes no accounts");
            return Ok(None);
        };

        tracing::debug!(signer = %signer, contract = %self.config.contract_address, "wallet connected");
        let storage = ReportStorage::new(rpc, self.config.contract_address.clone(), signer)
            .with_finality(self.config.poll_interval(), self.config.finality_timeout());
        Ok(Some(Arc::new(storage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: Option<String>) -> LedgerConfig {
        LedgerConfig {
            rpc_url: url,
            ..LedgerConfig::default()
        }
    }

    async fn node_with_accounts(accounts: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_accounts" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": accounts })),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn no_url_means_no_wallet() {
        let connector = WalletConnector::new(config(None));
        assert!(connector.connect().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_accounts_means_no_wallet() {
        let server = node_with_accounts(json!([])).await;
        let connector = WalletConnector::new(config(Some(server.uri())));
        assert!(connector.connect().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn every_connect_asks_the_node_again() {
        let server = node_with_accounts(json!(["0x00000000000000000000000000000000000000aa"])).await;
        let connector = WalletConnector::new(config(Some(server.uri())));

        assert!(connector.connect().await.unwrap().is_some());
        assert!(connector.connect().await.unwrap().is_some());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let connector = WalletConnector::new(config(Some("http://127.0.0.1:9".to_string())));
        assert!(matches!(
            connector.connect().await,
            Err(LedgerError::Transport(_))
        ));
    }
}
