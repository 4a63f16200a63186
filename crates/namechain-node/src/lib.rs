//! # Namechain Node
//!
//! Host-facing layer of the name-registry ledger: the persisted
//! [`LedgerState`], the entry points action handlers call, node
//! configuration, and logging setup.
//!
//! ```text
//!  action ──► Ledger ──► consensus (observers)   ──┐
//!               │    └─► economics (prices)      ──┼──► new LedgerState
//!               └──────── ChainContext (reads) ────┘
//! ```

pub mod config;
pub mod ledger;
pub mod logging;

pub use config::{LogFormat, LoggingConfig, NodeConfig};
pub use ledger::{AuctionSettlement, Ledger, LedgerState, ObserverEpoch};
pub use logging::init_logging;
