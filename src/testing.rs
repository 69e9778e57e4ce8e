//! In-memory node used by unit tests

use crate::rpc::staking::{StakingPage, ValidatorMoniker};
use crate::rpc::{ConsensusStateResult, NodeRpc, PubKey, RpcError, ValidatorInfo, ValidatorsResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct FakeNode {
    network: String,
    validators: Vec<(String, u64)>,
    monikers: Vec<(String, String)>,
    consensus_state: Mutex<String>,
    fail_validators: AtomicBool,
    validator_calls: AtomicUsize,
    validator_heights: Mutex<Vec<Option<u64>>>,
}

impl FakeNode {
    /// Height every `/validators` page reports
    pub const BLOCK_HEIGHT: u64 = 100;

    /// `(pub_key_id, voting_power, moniker)` triples in set order
    pub fn with_validators(validators: &[(&str, u64, &str)]) -> Self {
        let mut node = Self {
            network: "testnet-1".to_string(),
            validators: Vec::new(),
            monikers: Vec::new(),
            consensus_state: Mutex::new(String::new()),
            fail_validators: AtomicBool::new(false),
            validator_calls: AtomicUsize::new(0),
            validator_heights: Mutex::new(Vec::new()),
        };
        node.set_validators(validators);
        node
    }

    pub fn set_validators(&mut self, validators: &[(&str, u64, &str)]) {
        self.validators = validators
            .iter()
            .map(|(k, p, _)| (k.to_string(), *p))
            .collect();
        self.monikers = validators
            .iter()
            .map(|(k, _, m)| (k.to_string(), m.to_string()))
            .collect();
    }

    pub fn set_monikers(&mut self, monikers: &[(&str, &str)]) {
        self.monikers = monikers
            .iter()
            .map(|(k, m)| (k.to_string(), m.to_string()))
            .collect();
    }

    /// Raw JSON served as the `/consensus_state` result
    pub fn set_consensus_state(&self, json: &str) {
        *self.consensus_state.lock().unwrap() = json.to_string();
    }

    pub fn fail_validators(&self, fail: bool) {
        self.fail_validators.store(fail, Ordering::SeqCst);
    }

    pub fn validator_calls(&self) -> usize {
        self.validator_calls.load(Ordering::SeqCst)
    }

    /// `height` argument of every `/validators` call, in order
    pub fn validator_heights(&self) -> Vec<Option<u64>> {
        self.validator_heights.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeRpc for FakeNode {
    async fn network_name(&self) -> Result<String, RpcError> {
        Ok(self.network.clone())
    }

    async fn validators(
        &self,
        height: Option<u64>,
        page: u32,
        per_page: u32,
    ) -> Result<ValidatorsResult, RpcError> {
        self.validator_calls.fetch_add(1, Ordering::SeqCst);
        self.validator_heights.lock().unwrap().push(height);
        if self.fail_validators.load(Ordering::SeqCst) {
            return Err(RpcError::Node {
                code: -32603,
                message: "Internal error".to_string(),
            });
        }

        let start = (page.saturating_sub(1) * per_page) as usize;
        let validators = self
            .validators
            .iter()
            .skip(start)
            .take(per_page as usize)
            .map(|(key, power)| ValidatorInfo {
                pub_key: PubKey { value: key.clone() },
                voting_power: *power,
            })
            .collect();

        Ok(ValidatorsResult {
            block_height: Self::BLOCK_HEIGHT,
            validators,
            total: self.validators.len() as u64,
        })
    }

    async fn staking_validators(
        &self,
        key: Option<Vec<u8>>,
        limit: u64,
    ) -> Result<StakingPage, RpcError> {
        let offset = key
            .map(|k| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&k[..8]);
                u64::from_be_bytes(buf) as usize
            })
            .unwrap_or(0);
        let end = (offset + limit as usize).min(self.monikers.len());

        let validators = self.monikers[offset.min(end)..end]
            .iter()
            .map(|(k, m)| ValidatorMoniker {
                pub_key_id: k.clone(),
                moniker: m.clone(),
            })
            .collect();
        let next_key = (end < self.monikers.len()).then(|| (end as u64).to_be_bytes().to_vec());

        Ok(StakingPage { validators, next_key })
    }

    async fn consensus_state(&self) -> Result<ConsensusStateResult, RpcError> {
        let raw = self.consensus_state.lock().unwrap().clone();
        Ok(serde_json::from_str(&raw)?)
    }
}
