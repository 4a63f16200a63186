//! # Observer Consensus
//!
//! Decides which gateways observe network health in each epoch.
//!
//! ## Pipeline
//!
//! 1. Epoch Clock - derive the epoch window from the current height
//! 2. Eligibility - keep gateways whose membership covers the epoch
//! 3. Weighting - stake weight x tenure weight x reward-ratio weights
//! 4. Entropy - SHA-256 over finalized historical block identifiers
//! 5. Sortition - weighted draw without replacement from a hash chain
//!
//! Every step is a pure function of its inputs and the finalized chain, so
//! all replicas converge on the same committee in the same order.

pub mod context;
pub mod eligibility;
pub mod entropy;
pub mod epoch;
pub mod sortition;

// Re-exports
pub use context::{ChainContext, InMemoryChain};
pub use eligibility::*;
pub use entropy::{entropy_for_epoch, sampled_heights};
pub use epoch::{epoch_boundaries, period_at_height, periodic_update_due, EpochWindow};
pub use sortition::{
    prescribed_observers_for_epoch, run_sortition, weigh_observers, WeightedObserver, WEIGHT_SCALE,
};
