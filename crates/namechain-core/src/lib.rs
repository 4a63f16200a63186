//! # Namechain Core
//!
//! Shared building blocks for the Namechain name-registry ledger:
//! - `Gateway` - a staked network participant that may be chosen as observer
//! - `ProtocolSettings` - every tunable the economic and consensus core reads
//! - `fixed` - the integer fixed-point arithmetic all replicas must agree on
//! - `LedgerError` - the error taxonomy shared by every action
//!
//! Nothing in this crate reads the clock, the network, or a random source.
//! Every value is passed in, so replaying the same action log yields the
//! same bytes on every replica.

pub mod error;
pub mod fixed;
pub mod settings;
pub mod types;

pub use error::*;
pub use settings::*;
pub use types::*;
