use crate::rpc::NodeRpc;
use anyhow::{Context, Result};

/// Chain id reported by the node, used as the dashboard title
pub async fn network_name(rpc: &dyn NodeRpc) -> Result<String> {
    let network = rpc
        .network_name()
        .await
        .context("Failed to fetch network name from /status")?;

    let network = network.trim();
    if network.is_empty() {
        anyhow::bail!("Node reported an empty network name");
    }
    Ok(network.to_string())
}
