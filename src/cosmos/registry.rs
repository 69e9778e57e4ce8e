//! Validator identity and voting-power registry
//!
//! The registry is assembled from three paginated enumerations: two passes
//! over `/validators` (position assignment and total power, then per
//! validator shares) and one pass over the staking module to attach
//! monikers. Readers always see a complete snapshot; a refresh builds a new
//! snapshot off to the side and swaps it in.

use crate::rpc::{NodeRpc, RpcError, ValidatorInfo};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Display width reserved for monikers in vote rows
pub const MONIKER_WIDTH: usize = 20;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("total voting power overflowed at validator {0}")]
    InvalidVotingPower(String),
    #[error("validator set has zero total voting power")]
    ZeroVotingPower,
    #[error("no validators found")]
    Empty,
}

/// Page sizes used while enumerating
#[derive(Debug, Clone, Copy)]
pub struct RegistryOptions {
    pub validators_per_page: u32,
    pub staking_page_limit: u64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            validators_per_page: 100,
            staking_page_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorEntry {
    /// 0-based position in the consensus validator set
    pub position_index: usize,
    pub pub_key_id: String,
    pub moniker: String,
    /// Fraction of total voting power, in [0, 1]
    pub voting_power_share: f64,
}

/// Immutable view of the validator set
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    entries: Vec<ValidatorEntry>,
    by_key: HashMap<String, usize>,
}

impl RegistrySnapshot {
    pub fn from_entries(entries: Vec<ValidatorEntry>) -> Self {
        let by_key = entries
            .iter()
            .map(|e| (e.pub_key_id.clone(), e.position_index))
            .collect();
        Self { entries, by_key }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&ValidatorEntry> {
        self.entries.get(index)
    }

    pub fn position_of(&self, pub_key_id: &str) -> Option<usize> {
        self.by_key.get(pub_key_id).copied()
    }

    /// Attach a moniker by consensus key; false when the key isn't in the set
    fn set_moniker(&mut self, pub_key_id: &str, moniker: String) -> bool {
        match self.position_of(pub_key_id) {
            Some(position) => {
                self.entries[position].moniker = moniker;
                true
            }
            None => false,
        }
    }

    /// Fixed-width `"<rank> <power%> <moniker>"` row for a position
    pub fn lookup(&self, index: usize) -> String {
        let (share, moniker) = match self.entries.get(index) {
            Some(entry) => (entry.voting_power_share, entry.moniker.as_str()),
            None => (0.0, ""),
        };
        format!(
            "{:<3} {:.2}%   {:<width$} ",
            index + 1,
            share * 100.0,
            truncate_moniker(moniker, MONIKER_WIDTH),
            width = MONIKER_WIDTH
        )
    }
}

/// Shared registry handle; cheap to clone
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    inner: Arc<RwLock<Arc<RegistrySnapshot>>>,
}

impl ValidatorRegistry {
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Build the registry; an empty validator set is an error
    pub async fn build(rpc: &dyn NodeRpc, options: RegistryOptions) -> Result<Self, RegistryError> {
        let snapshot = build_snapshot(rpc, options).await?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Rebuild from scratch and swap the result in. On failure the current
    /// snapshot stays in place.
    pub async fn refresh(&self, rpc: &dyn NodeRpc, options: RegistryOptions) -> Result<(), RegistryError> {
        let snapshot = build_snapshot(rpc, options).await?;
        self.replace(snapshot);
        Ok(())
    }

    pub fn replace(&self, snapshot: RegistrySnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
    }

    /// Current snapshot; holding it never blocks a concurrent refresh
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }
}

/// Positions and running power total gathered by the first pass
#[derive(Debug, Default)]
struct PowerTally {
    keys: Vec<String>,
    positions: HashMap<String, usize>,
    total_power: u64,
}

impl PowerTally {
    /// Record a validator the first time its key shows up. A key repeated
    /// across pages keeps its first position and is counted once.
    fn observe(&mut self, val: &ValidatorInfo) -> Result<(), RegistryError> {
        let key = &val.pub_key.value;
        if self.positions.contains_key(key) {
            debug!("Validator {} listed twice, counting it once", key);
            return Ok(());
        }

        self.total_power = self
            .total_power
            .checked_add(val.voting_power)
            .ok_or_else(|| RegistryError::InvalidVotingPower(key.clone()))?;
        self.positions.insert(key.clone(), self.keys.len());
        self.keys.push(key.clone());
        Ok(())
    }
}

async fn build_snapshot(rpc: &dyn NodeRpc, options: RegistryOptions) -> Result<RegistrySnapshot, RegistryError> {
    let per_page = options.validators_per_page.max(1);

    let mut tally = PowerTally::default();
    let height = paginate_validators(rpc, None, per_page, |val| tally.observe(val)).await?;

    if tally.keys.is_empty() {
        return Err(RegistryError::Empty);
    }
    if tally.total_power == 0 {
        return Err(RegistryError::ZeroVotingPower);
    }
    debug!(
        "Validator set at height {:?}: {} validators, total voting power {}",
        height,
        tally.keys.len(),
        tally.total_power
    );

    // Shares need the complete total, hence the second pass over the same
    // height.
    let mut shares = vec![0.0_f64; tally.keys.len()];
    paginate_validators(rpc, height, per_page, |val| {
        match tally.positions.get(&val.pub_key.value) {
            Some(&position) => {
                shares[position] = val.voting_power as f64 / tally.total_power as f64;
            }
            None => debug!("Validator {} joined between passes, skipping", val.pub_key.value),
        }
        Ok(())
    })
    .await?;

    let entries = tally
        .keys
        .into_iter()
        .zip(shares)
        .enumerate()
        .map(|(position_index, (pub_key_id, voting_power_share))| ValidatorEntry {
            position_index,
            pub_key_id,
            moniker: String::new(),
            voting_power_share,
        })
        .collect();
    let mut snapshot = RegistrySnapshot::from_entries(entries);

    let mut key: Option<Vec<u8>> = None;
    let mut resolved = 0usize;
    loop {
        let page = rpc
            .staking_validators(key.take(), options.staking_page_limit)
            .await?;
        let page_len = page.validators.len();
        for val in page.validators {
            if snapshot.set_moniker(&val.pub_key_id, val.moniker) {
                resolved += 1;
            }
        }
        match page.next_key {
            Some(next) if page_len > 0 => key = Some(next),
            _ => break,
        }
    }
    info!(
        "Loaded {} validators ({} with monikers)",
        snapshot.len(),
        resolved
    );

    Ok(snapshot)
}

/// Walk every `/validators` page in order, handing each entry to `visit`.
///
/// Without a `height` the first page's block height is used for the rest of
/// the walk so every page comes from the same validator set. Returns the
/// height the walk was pinned to.
async fn paginate_validators<F>(
    rpc: &dyn NodeRpc,
    height: Option<u64>,
    per_page: u32,
    mut visit: F,
) -> Result<Option<u64>, RegistryError>
where
    F: FnMut(&ValidatorInfo) -> Result<(), RegistryError> + Send,
{
    let mut height = height;
    let mut page = 1u32;
    let mut seen = 0usize;
    loop {
        let result = rpc.validators(height, page, per_page).await?;
        if height.is_none() && result.block_height > 0 {
            height = Some(result.block_height);
        }

        let count = result.validators.len();
        for val in &result.validators {
            visit(val)?;
        }
        seen += count;
        if count == 0 || seen as u64 >= result.total {
            break;
        }
        page += 1;
    }
    Ok(height)
}

/// Cut to `max` characters, ending in `…` when shortened
pub fn truncate_moniker(moniker: &str, max: usize) -> String {
    if moniker.chars().count() <= max {
        return moniker.to_string();
    }
    let mut out: String = moniker.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
