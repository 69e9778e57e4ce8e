//! Consensus round state as reported by `/consensus_state`

use crate::rpc::{NodeRpc, RoundStateDump, RpcError};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Per-tick failures; reported on screen and retried on the next tick
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("node returned no round state")]
    MissingRoundState,
    #[error("invalid height/round/step {0:?}")]
    InvalidRound(String),
    #[error("round {round} not in vote set yet ({available} rounds known)")]
    RoundOutOfRange { round: usize, available: usize },
    #[error("malformed bit array {0:?}")]
    MalformedBitArray(String),
    #[error("malformed vote fraction {0:?}")]
    MalformedFraction(String),
}

#[derive(Debug, Clone)]
pub struct RoundState {
    /// Raw `"H/R/S"` string
    pub height_round_step: String,
    pub prevotes: Vec<String>,
    pub prevotes_bit_array: String,
    /// Absent on chain variants that don't expose precommits
    pub precommits: Option<Vec<String>>,
    pub precommits_bit_array: Option<String>,
    pub proposer_index: Option<usize>,
    pub start_time: DateTime<Utc>,
}

/// Fetch and parse the node's current round state
pub async fn fetch(rpc: &dyn NodeRpc) -> Result<RoundState, PollError> {
    let result = rpc.consensus_state().await?;
    let dump = result.round_state.ok_or(PollError::MissingRoundState)?;
    RoundState::from_dump(dump)
}

impl RoundState {
    pub fn from_dump(dump: RoundStateDump) -> Result<Self, PollError> {
        let round = parse_round(&dump.height_round_step)?;

        let available = dump.height_vote_set.len();
        let votes = dump
            .height_vote_set
            .into_iter()
            .nth(round)
            .ok_or(PollError::RoundOutOfRange { round, available })?;

        let proposer_index = dump
            .proposer
            .and_then(|p| usize::try_from(p.index).ok());

        Ok(Self {
            height_round_step: dump.height_round_step,
            prevotes: votes.prevotes,
            prevotes_bit_array: votes.prevotes_bit_array,
            precommits: votes.precommits,
            precommits_bit_array: votes.precommits_bit_array.filter(|b| !b.trim().is_empty()),
            proposer_index,
            start_time: dump.start_time,
        })
    }

    /// Block height, the first `H/R/S` token
    pub fn height(&self) -> Option<u64> {
        self.height_round_step.split('/').next()?.trim().parse().ok()
    }

    pub fn vote_percent(&self) -> Result<f64, PollError> {
        parse_bit_array_percent(&self.prevotes_bit_array)
    }

    pub fn commit_percent(&self) -> Result<Option<f64>, PollError> {
        self.precommits_bit_array
            .as_deref()
            .map(parse_bit_array_percent)
            .transpose()
    }

    /// Time since the round started; zero when the node's clock is ahead
    pub fn round_duration(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Round number from the second `H/R/S` token
pub fn parse_round(height_round_step: &str) -> Result<usize, PollError> {
    let invalid = || PollError::InvalidRound(height_round_step.to_string());
    height_round_step
        .split('/')
        .nth(1)
        .ok_or_else(invalid)?
        .trim()
        .parse()
        .map_err(|_| invalid())
}

/// The last token of a bit array string is the voted share, either as a
/// ready-made float (`BA{..} 421/633 = 0.66`) or as a bare `dividend/divisor`.
pub fn parse_bit_array_percent(bit_array: &str) -> Result<f64, PollError> {
    let tokens: Vec<&str> = bit_array.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(PollError::MalformedBitArray(bit_array.to_string()));
    }
    let last = tokens[tokens.len() - 1];

    let value = match last.parse::<f64>() {
        Ok(v) => v,
        Err(_) if last.contains('/') => parse_fraction(last)?,
        Err(_) => return Err(PollError::MalformedBitArray(bit_array.to_string())),
    };

    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(PollError::MalformedBitArray(bit_array.to_string()));
    }
    Ok(value)
}

fn parse_fraction(token: &str) -> Result<f64, PollError> {
    let malformed = || PollError::MalformedFraction(token.to_string());
    let (dividend, divisor) = token.split_once('/').ok_or_else(malformed)?;
    let dividend: u64 = dividend.parse().map_err(|_| malformed())?;
    let divisor: u64 = divisor.parse().map_err(|_| malformed())?;
    if divisor == 0 {
        return Err(malformed());
    }
    Ok(dividend as f64 / divisor as f64)
}
