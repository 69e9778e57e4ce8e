//! Poll loop and background registry maintenance
//!
//! The poller ticks on a fixed interval, turns each `/consensus_state` into
//! a [`PollUpdate`] and hands it to the dashboard through a bounded channel.
//! A full channel blocks the poller, so a slow screen delays ticks instead
//! of dropping frames. Registry rebuilds run in a separate task that only
//! wakes when the poller asks for one.

use crate::cosmos::{round_state, votes, PollResult, RegistryOptions, ValidatorRegistry};
use crate::rpc::NodeRpc;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What the dashboard receives once per tick
#[derive(Debug, Clone)]
pub enum PollUpdate {
    Round(PollResult),
    /// The tick failed; the previous frame stays on screen
    Failed { summary: String },
}

/// Decides when the registry is worth rebuilding, based on chain height
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    bootstrap_height: u64,
    every_blocks: u64,
    last_refresh_height: Option<u64>,
}

impl RefreshPolicy {
    pub fn new(bootstrap_height: u64, every_blocks: u64) -> Self {
        Self {
            bootstrap_height,
            every_blocks: every_blocks.max(1),
            last_refresh_height: None,
        }
    }

    /// Young chains refresh on every observation; afterwards only once the
    /// height has moved `every_blocks` past the last refresh. A height below
    /// the last refresh (chain restart, lagging node) refreshes at once and
    /// restarts the count from there.
    pub fn should_refresh(&mut self, height: u64) -> bool {
        if height < self.bootstrap_height {
            self.last_refresh_height = Some(height);
            return true;
        }

        match self.last_refresh_height {
            // The startup build counts as a refresh at the first height seen
            None => {
                self.last_refresh_height = Some(height);
                false
            }
            Some(last) if height < last => {
                self.last_refresh_height = Some(height);
                true
            }
            Some(last) if height >= last.saturating_add(self.every_blocks) => {
                self.last_refresh_height = Some(height);
                true
            }
            Some(_) => false,
        }
    }
}

pub struct Poller {
    rpc: Arc<dyn NodeRpc>,
    registry: ValidatorRegistry,
    interval: Duration,
    policy: RefreshPolicy,
    updates: mpsc::Sender<PollUpdate>,
    refresh: mpsc::Sender<()>,
}

impl Poller {
    pub fn new(
        rpc: Arc<dyn NodeRpc>,
        registry: ValidatorRegistry,
        interval: Duration,
        policy: RefreshPolicy,
        updates: mpsc::Sender<PollUpdate>,
        refresh: mpsc::Sender<()>,
    ) -> Self {
        Self {
            rpc,
            registry,
            interval,
            policy,
            updates,
            refresh,
        }
    }

    /// Poll until the dashboard hangs up
    pub async fn run(mut self) {
        info!("Polling consensus state every {:?}", self.interval);
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let update = self.tick().await;
            if self.updates.send(update).await.is_err() {
                debug!("Dashboard closed, stopping poller");
                break;
            }
        }
    }

    /// One poll: fetch, classify and decide on a registry refresh
    pub async fn tick(&mut self) -> PollUpdate {
        let state = match round_state::fetch(self.rpc.as_ref()).await {
            Ok(state) => state,
            Err(e) => {
                debug!("Poll failed: {}", e);
                return PollUpdate::Failed {
                    summary: format!("error: {}", e),
                };
            }
        };

        if let Some(height) = state.height() {
            if self.policy.should_refresh(height) {
                self.request_refresh(height);
            }
        }

        let registry = self.registry.snapshot();
        match votes::build(&state, &registry, Utc::now()) {
            Ok(result) => PollUpdate::Round(result),
            Err(e) => {
                debug!("Round state at {} unusable: {}", state.height_round_step, e);
                PollUpdate::Failed {
                    summary: format!("error: {}", e),
                }
            }
        }
    }

    fn request_refresh(&self, height: u64) {
        // A refresh already queued covers this one.
        match self.refresh.try_send(()) {
            Ok(()) => debug!("Requested registry refresh at height {}", height),
            Err(mpsc::error::TrySendError::Full(())) => {}
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!("Registry maintainer gone, refresh at {} skipped", height)
            }
        }
    }
}

/// Rebuilds the registry whenever the poller asks
pub struct RegistryMaintainer {
    rpc: Arc<dyn NodeRpc>,
    registry: ValidatorRegistry,
    options: RegistryOptions,
    requests: mpsc::Receiver<()>,
}

impl RegistryMaintainer {
    pub fn new(
        rpc: Arc<dyn NodeRpc>,
        registry: ValidatorRegistry,
        options: RegistryOptions,
        requests: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            rpc,
            registry,
            options,
            requests,
        }
    }

    pub async fn run(mut self) {
        while self.requests.recv().await.is_some() {
            match self.registry.refresh(self.rpc.as_ref(), self.options).await {
                Ok(()) => debug!("Registry refreshed: {} validators", self.registry.len()),
                Err(e) => warn!("Registry refresh failed, keeping previous set: {}", e),
            }
        }
        debug!("Refresh channel closed, registry maintainer exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeNode;

    const ROUND_STATE: &str = r#"{
        "round_state": {
            "height/round/step": "HEIGHT/0/4",
            "start_time": "2024-03-01T10:00:00Z",
            "height_vote_set": [
                {"round": 0,
                 "prevotes": ["Vote{0:AB 1/00/SIGNED_MSG_TYPE_PREVOTE(Prevote) 5D3F @ x}", "nil-Vote"],
                 "prevotes_bit_array": "BA{2:x_} 1000000/1666667",
                 "precommits": ["nil-Vote", "nil-Vote"],
                 "precommits_bit_array": "BA{2:__} 0/1666667 = 0.00"}
            ],
            "proposer": {"address": "AA", "index": 0}
        }
    }"#;

    fn round_state_at(height: u64) -> String {
        ROUND_STATE.replace("HEIGHT", &height.to_string())
    }

    async fn setup() -> (Arc<FakeNode>, Poller, mpsc::Receiver<PollUpdate>, mpsc::Receiver<()>) {
        let node = Arc::new(FakeNode::with_validators(&[("k1", 6, "Alice"), ("k2", 4, "Bob")]));
        let registry = ValidatorRegistry::build(node.as_ref(), RegistryOptions::default())
            .await
            .unwrap();
        let (updates_tx, updates_rx) = mpsc::channel(1);
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let poller = Poller::new(
            node.clone(),
            registry,
            Duration::from_millis(10),
            RefreshPolicy::new(10, 100),
            updates_tx,
            refresh_tx,
        );
        (node, poller, updates_rx, refresh_rx)
    }

    #[test]
    fn test_refresh_policy_bootstrap() {
        let mut policy = RefreshPolicy::new(10, 100);
        assert!(policy.should_refresh(1));
        assert!(policy.should_refresh(2));
        assert!(policy.should_refresh(9));
        // Past bootstrap: wait a full interval from the last refresh
        assert!(!policy.should_refresh(10));
        assert!(!policy.should_refresh(108));
        assert!(policy.should_refresh(109));
        assert!(!policy.should_refresh(150));
    }

    #[test]
    fn test_refresh_policy_after_startup() {
        let mut policy = RefreshPolicy::new(10, 100);
        assert!(!policy.should_refresh(5000));
        assert!(!policy.should_refresh(5099));
        assert!(policy.should_refresh(5100));
        assert!(!policy.should_refresh(5101));
    }

    #[test]
    fn test_refresh_policy_height_goes_backwards() {
        let mut policy = RefreshPolicy::new(10, 100);
        assert!(!policy.should_refresh(5000));
        // Switched to a node that is behind
        assert!(policy.should_refresh(4000));
        assert!(!policy.should_refresh(4001));
        assert!(!policy.should_refresh(4099));
        assert!(policy.should_refresh(4100));
    }

    #[tokio::test]
    async fn test_tick_success() {
        let (node, mut poller, _updates, _refresh) = setup().await;
        node.set_consensus_state(&round_state_at(500));

        match poller.tick().await {
            PollUpdate::Round(result) => {
                assert!((result.vote_percent - 0.6).abs() < 1e-6);
                assert_eq!(result.votes.len(), 2);
                assert!(result.votes[0].voted && result.votes[0].description.contains("Alice"));
                assert!(!result.votes[1].voted && result.votes[1].description.contains("Bob"));
                assert!(result.summary().contains("500/0/4"));
            }
            other => panic!("expected a round, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_failure_emits_only_summary() {
        let (node, mut poller, _updates, _refresh) = setup().await;
        // Round 3 is not in the vote set yet
        node.set_consensus_state(&round_state_at(500).replace("500/0/4", "500/3/1"));

        match poller.tick().await {
            PollUpdate::Failed { summary } => assert!(summary.contains("round 3")),
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_height_requests_refresh() {
        let (node, mut poller, _updates, mut refresh) = setup().await;
        node.set_consensus_state(&round_state_at(3));

        poller.tick().await;
        poller.tick().await;
        // Coalesced into one pending request
        assert!(refresh.try_recv().is_ok());
        assert!(refresh.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_delivers_in_order_and_stops_when_dashboard_closes() {
        let (node, poller, mut updates, _refresh) = setup().await;
        node.set_consensus_state(&round_state_at(700));
        let handle = tokio::spawn(poller.run());

        for _ in 0..3 {
            assert!(matches!(updates.recv().await, Some(PollUpdate::Round(_))));
        }
        node.set_consensus_state("not json");
        loop {
            match updates.recv().await {
                Some(PollUpdate::Failed { .. }) => break,
                Some(PollUpdate::Round(_)) => continue,
                None => panic!("poller stopped early"),
            }
        }

        drop(updates);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_maintainer_refreshes_on_request() {
        let node = Arc::new(FakeNode::with_validators(&[("k1", 1, "Alice")]));
        let registry = ValidatorRegistry::build(node.as_ref(), RegistryOptions::default())
            .await
            .unwrap();
        let calls_after_build = node.validator_calls();

        let (tx, rx) = mpsc::channel(1);
        let maintainer =
            RegistryMaintainer::new(node.clone(), registry.clone(), RegistryOptions::default(), rx);
        let handle = tokio::spawn(maintainer.run());

        tx.send(()).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(node.validator_calls(), calls_after_build * 2);
        assert!(registry.snapshot().lookup(0).contains("Alice"));
    }

    #[tokio::test]
    async fn test_maintainer_keeps_registry_on_failure() {
        let node = Arc::new(FakeNode::with_validators(&[("k1", 1, "Alice")]));
        let registry = ValidatorRegistry::build(node.as_ref(), RegistryOptions::default())
            .await
            .unwrap();
        node.fail_validators(true);

        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(
            RegistryMaintainer::new(node.clone(), registry.clone(), RegistryOptions::default(), rx)
                .run(),
        );
        tx.send(()).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.snapshot().lookup(0).contains("Alice"));
    }
}
