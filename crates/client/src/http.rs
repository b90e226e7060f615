// Path: crates/client/src/http.rs

use crate::wire;
use crate::ChainQuery;
use async_trait::async_trait;
use forklift_types::app::{ChainStatus, Proposal};
use forklift_types::error::RpcError;
use reqwest::Client;
use std::time::Duration;

/// Upper bound on proposals returned by one list query.
const PROPOSAL_PAGE_LIMIT: u32 = 100;

/// [`ChainQuery`] over a node's CometBFT RPC and Cosmos REST endpoints.
#[derive(Clone, Debug)]
pub struct HttpChainClient {
    client: Client,
    rpc_url: String,
    api_url: String,
}

impl HttpChainClient {
    pub fn new(rpc_url: &str, api_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: rpc_url.to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            rpc_url: normalize(rpc_url),
            api_url: normalize(api_url),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn get_text(&self, url: &str) -> Result<String, RpcError> {
        let unreachable = |reason: String| RpcError::Unreachable {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("HTTP {}", status)));
        }
        let body = response
            .text()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        tracing::trace!(target: "rpc", url, bytes = body.len(), "GET ok");
        Ok(body)
    }
}

fn normalize(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl ChainQuery for HttpChainClient {
    async fn status(&self) -> Result<ChainStatus, RpcError> {
        let url = format!("{}/status", self.rpc_url);
        let body = self.get_text(&url).await?;
        wire::parse_status(&url, &body)
    }

    async fn node_version(&self) -> Result<String, RpcError> {
        let url = format!("{}/abci_info", self.rpc_url);
        let body = self.get_text(&url).await?;
        wire::parse_abci_version(&url, &body)
    }

    async fn list_proposals(&self) -> Result<Vec<String>, RpcError> {
        let url = format!(
            "{}/cosmos/gov/v1/proposals?pagination.limit={}&pagination.reverse=true",
            self.api_url, PROPOSAL_PAGE_LIMIT
        );
        let body = self.get_text(&url).await?;
        wire::parse_proposal_ids(&url, &body)
    }

    async fn proposal(&self, id: &str) -> Result<Proposal, RpcError> {
        let url = format!("{}/cosmos/gov/v1/proposals/{}", self.api_url, id);
        let body = self.get_text(&url).await?;
        wire::parse_proposal(&url, &body)
    }
}
