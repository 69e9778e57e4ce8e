//! Per-validator vote classification for one round

use super::registry::RegistrySnapshot;
use super::round_state::{PollError, RoundState};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Placeholder the node prints for validators it has no vote from
pub const NIL_VOTE: &str = "nil-Vote";
/// Prevote for the all-zero block id: online, but not converged on a block
pub const ZERO_BLOCK_PREVOTE: &str = "SIGNED_MSG_TYPE_PREVOTE(Prevote) 000000000000";

const UNKNOWN_PROPOSER: &str = "unknown proposer";

#[derive(Debug, Clone, PartialEq)]
pub struct VoteState {
    pub description: String,
    pub voted: bool,
    pub voted_zero_block: bool,
    pub committed: bool,
}

/// Everything one successful poll produces
#[derive(Debug, Clone)]
pub struct PollResult {
    pub votes: Vec<VoteState>,
    pub vote_percent: f64,
    /// `None` when the chain does not report precommits
    pub commit_percent: Option<f64>,
    pub height_round_step: String,
    pub round_duration: Duration,
    /// Registry row of the proposer, or a placeholder
    pub proposer: String,
}

impl PollResult {
    pub fn summary(&self) -> String {
        let commit = match self.commit_percent {
            Some(pct) => format!("{:.0}%", pct * 100.0),
            None => "n/a".to_string(),
        };
        format!(
            "height/round/step: {} - v: {:.0}% c: {} ({:.1}s)\n\nProposer:\n(rank/%/moniker) {}",
            self.height_round_step,
            self.vote_percent * 100.0,
            commit,
            self.round_duration.as_secs_f64(),
            self.proposer
        )
    }
}

/// `(voted, voted_zero_block)` for a raw prevote entry
pub fn classify_vote(raw: &str) -> (bool, bool) {
    let voted = !raw.is_empty() && raw != NIL_VOTE;
    let zero_block = raw.contains(ZERO_BLOCK_PREVOTE);
    (voted, zero_block)
}

/// Cross-reference a round state with the registry.
///
/// Only indices present in the vote arrays are emitted; the registry is
/// consulted through bounds-checked lookups.
pub fn build(state: &RoundState, registry: &RegistrySnapshot, now: DateTime<Utc>) -> Result<PollResult, PollError> {
    let vote_percent = state.vote_percent()?;
    let commit_percent = state.commit_percent()?;

    let mut votes: Vec<VoteState> = state
        .prevotes
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let (voted, voted_zero_block) = classify_vote(raw);
            VoteState {
                description: registry.lookup(i),
                voted,
                voted_zero_block,
                committed: false,
            }
        })
        .collect();

    if let Some(precommits) = &state.precommits {
        for (vote, raw) in votes.iter_mut().zip(precommits) {
            vote.committed = classify_vote(raw).0;
        }
    }

    let proposer = state
        .proposer_index
        .filter(|&i| registry.get(i).is_some())
        .map(|i| registry.lookup(i))
        .unwrap_or_else(|| UNKNOWN_PROPOSER.to_string());

    Ok(PollResult {
        votes,
        vote_percent,
        commit_percent,
        height_round_step: state.height_round_step.clone(),
        round_duration: state.round_duration(now),
        proposer,
    })
}
