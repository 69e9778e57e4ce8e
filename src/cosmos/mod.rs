//! CometBFT consensus monitoring: validator registry, round state and votes

mod network;
pub mod registry;
pub mod round_state;
pub mod votes;

pub use network::network_name;
pub use registry::{RegistryOptions, ValidatorRegistry};
pub use votes::{PollResult, VoteState};
