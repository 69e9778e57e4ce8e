//! CometBFT RPC transport, wire types and endpoint resolution

mod address;
mod client;
pub mod staking;
mod types;

pub use address::Endpoint;
pub use client::{NodeRpc, RpcClient, RpcError};
pub use types::*;
