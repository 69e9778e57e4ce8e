use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// JSON-RPC envelope returned by every CometBFT RPC route
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

/// Result of `/status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResult {
    pub node_info: NodeInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    pub network: String,
}

/// Result of `/validators?page=..&per_page=..`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorsResult {
    /// Height the set was read at
    #[serde(default, deserialize_with = "string_or_number")]
    pub block_height: u64,
    pub validators: Vec<ValidatorInfo>,
    #[serde(deserialize_with = "string_or_number")]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorInfo {
    pub pub_key: PubKey,
    #[serde(deserialize_with = "string_or_number")]
    pub voting_power: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubKey {
    pub value: String,
}

/// Result of `/consensus_state`
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusStateResult {
    pub round_state: Option<RoundStateDump>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundStateDump {
    #[serde(rename = "height/round/step")]
    pub height_round_step: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub height_vote_set: Vec<HeightVoteSet>,
    #[serde(default)]
    pub proposer: Option<Proposer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeightVoteSet {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prevotes: Vec<String>,
    #[serde(default)]
    pub prevotes_bit_array: String,
    #[serde(default)]
    pub precommits: Option<Vec<String>>,
    #[serde(default)]
    pub precommits_bit_array: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Proposer {
    pub index: i64,
}

/// Result of `/abci_query`
#[derive(Debug, Clone, Deserialize)]
pub struct AbciQueryResult {
    pub response: AbciResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbciResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    /// Base64 encoded protobuf response; absent when the result is empty
    #[serde(default)]
    pub value: Option<String>,
}

/// CometBFT encodes 64-bit integers as strings; some forks don't.
fn string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
