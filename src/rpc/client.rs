use super::address::Endpoint;
use super::staking::{self, StakingPage};
use super::types::*;
use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("RPC response missing result field")]
    MissingResult,
    #[error("ABCI query failed with code {code}: {log}")]
    Abci { code: u32, log: String },
    #[error("invalid base64 in ABCI response: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid protobuf in ABCI response: {0}")]
    Proto(#[from] prost::DecodeError),
}

/// The node routes the monitor depends on
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `node_info.network` from `/status`
    async fn network_name(&self) -> Result<String, RpcError>;

    /// One page of the validator set at `height` (latest when `None`),
    /// 1-based pages
    async fn validators(
        &self,
        height: Option<u64>,
        page: u32,
        per_page: u32,
    ) -> Result<ValidatorsResult, RpcError>;

    /// One page of bonded validators from the staking module
    async fn staking_validators(
        &self,
        key: Option<Vec<u8>>,
        limit: u64,
    ) -> Result<StakingPage, RpcError>;

    async fn consensus_state(&self) -> Result<ConsensusStateResult, RpcError>;
}

/// CometBFT RPC client speaking the URI-over-HTTP dialect
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: Endpoint,
}

impl RpcClient {
    /// Create a new RPC client with custom timeout in milliseconds
    pub fn with_timeout(endpoint: Endpoint, timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, endpoint }
    }

    pub async fn get<R>(&self, route: &str, query: &[(&str, String)]) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint.http_route(route);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        let body = response.text().await?;
        // Tendermint answers JSON-RPC errors with HTTP 500 and an error body,
        // so only give up on the status when the body isn't an envelope.
        let parsed: RpcResponse<R> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Status {
                    status: status.as_u16(),
                    url,
                })
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = parsed.error {
            let message = match error.data {
                Some(data) if !data.is_empty() => format!("{} ({})", error.message, data),
                _ => error.message,
            };
            return Err(RpcError::Node {
                code: error.code,
                message,
            });
        }

        parsed.result.ok_or(RpcError::MissingResult)
    }

    pub async fn status(&self) -> Result<StatusResult, RpcError> {
        self.get("status", &[]).await
    }

    /// Run an ABCI query and return the raw response bytes (empty when the
    /// application returned no value)
    pub async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let query = [
            ("path", format!("\"{}\"", path)),
            ("data", format!("0x{}", hex::encode(data))),
        ];
        let result: AbciQueryResult = self.get("abci_query", &query).await?;

        if result.response.code != 0 {
            return Err(RpcError::Abci {
                code: result.response.code,
                log: result.response.log,
            });
        }

        match result.response.value {
            Some(value) if !value.is_empty() => Ok(general_purpose::STANDARD.decode(value)?),
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl NodeRpc for RpcClient {
    async fn network_name(&self) -> Result<String, RpcError> {
        Ok(self.status().await?.node_info.network)
    }

    async fn validators(
        &self,
        height: Option<u64>,
        page: u32,
        per_page: u32,
    ) -> Result<ValidatorsResult, RpcError> {
        debug!(
            "Fetching validators page {} ({} per page, height {:?}) from {}",
            page, per_page, height, self.endpoint
        );
        let mut query = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        if let Some(height) = height {
            query.push(("height", height.to_string()));
        }
        self.get("validators", &query).await
    }

    async fn staking_validators(
        &self,
        key: Option<Vec<u8>>,
        limit: u64,
    ) -> Result<StakingPage, RpcError> {
        let request = staking::encode_validators_request(key, limit);
        let bytes = self
            .abci_query(staking::VALIDATORS_QUERY_PATH, &request)
            .await?;
        if bytes.is_empty() {
            return Ok(StakingPage::default());
        }
        Ok(staking::decode_validators_response(&bytes)?)
    }

    async fn consensus_state(&self) -> Result<ConsensusStateResult, RpcError> {
        self.get("consensus_state", &[]).await
    }
}
