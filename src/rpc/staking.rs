//! Typed `cosmos.staking.v1beta1.Query/Validators` messages
//!
//! Only the fields the monitor reads are declared; prost skips the rest.

use base64::engine::general_purpose;
use base64::Engine;
use prost::Message;

pub const VALIDATORS_QUERY_PATH: &str = "/cosmos.staking.v1beta1.Query/Validators";
pub const BOND_STATUS_BONDED: &str = "BOND_STATUS_BONDED";

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorsRequest {
    #[prost(string, tag = "1")]
    pub status: String,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageRequest>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PageRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
    #[prost(uint64, tag = "3")]
    pub limit: u64,
    #[prost(bool, tag = "4")]
    pub count_total: bool,
    #[prost(bool, tag = "5")]
    pub reverse: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorsResponse {
    #[prost(message, repeated, tag = "1")]
    pub validators: Vec<StakingValidator>,
    #[prost(message, optional, tag = "2")]
    pub pagination: Option<PageResponse>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PageResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub next_key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub total: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct StakingValidator {
    #[prost(string, tag = "1")]
    pub operator_address: String,
    #[prost(message, optional, tag = "2")]
    pub consensus_pubkey: Option<Any>,
    #[prost(bool, tag = "3")]
    pub jailed: bool,
    #[prost(message, optional, tag = "7")]
    pub description: Option<Description>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// Shared layout of `cosmos.crypto.{ed25519,secp256k1}.PubKey`
#[derive(Clone, PartialEq, Message)]
pub struct ConsensusPubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Description {
    #[prost(string, tag = "1")]
    pub moniker: String,
}

/// One page of bonded validators reduced to what the registry joins on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StakingPage {
    pub validators: Vec<ValidatorMoniker>,
    /// Continuation key; `None` on the last page
    pub next_key: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorMoniker {
    /// Standard base64 of the consensus key, as `/validators` reports it
    pub pub_key_id: String,
    pub moniker: String,
}

pub fn encode_validators_request(key: Option<Vec<u8>>, limit: u64) -> Vec<u8> {
    QueryValidatorsRequest {
        status: BOND_STATUS_BONDED.to_string(),
        pagination: Some(PageRequest {
            key: key.unwrap_or_default(),
            limit,
            ..Default::default()
        }),
    }
    .encode_to_vec()
}

pub fn decode_validators_response(bytes: &[u8]) -> Result<StakingPage, prost::DecodeError> {
    let resp = QueryValidatorsResponse::decode(bytes)?;

    let mut validators = Vec::with_capacity(resp.validators.len());
    for val in resp.validators {
        let Some(any) = val.consensus_pubkey else {
            continue;
        };
        let key = ConsensusPubKey::decode(any.value.as_slice())?;
        validators.push(ValidatorMoniker {
            pub_key_id: general_purpose::STANDARD.encode(&key.key),
            moniker: val
                .description
                .map(|d| d.moniker.trim().to_string())
                .unwrap_or_default(),
        });
    }

    let next_key = resp
        .pagination
        .map(|p| p.next_key)
        .filter(|k| !k.is_empty());

    Ok(StakingPage { validators, next_key })
}
