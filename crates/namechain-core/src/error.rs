//! Error types for Namechain ledger actions
//!
//! Any error aborts the enclosing action as a whole. The state committed by
//! the last successful action stays authoritative.

use crate::types::BlockHeight;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while evaluating a ledger action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Chain Data ===
    /// A sampled historical block has no identifier
    #[error("Block {height} has no identifier")]
    MissingHistoricalData { height: BlockHeight },

    /// A block identifier could not be decoded
    #[error("Block {height} has a malformed identifier: {reason}")]
    MalformedBlockIdentifier { height: BlockHeight, reason: String },

    // === Input ===
    /// Payload rejected by a calculator
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Eligibility ===
    /// Stake below the network minimum
    #[error("Insufficient stake: need {required}, have {provided}")]
    InsufficientStake { required: u64, provided: u64 },

    /// Gateway not eligible for the requested transition
    #[error("Not eligible: {0}")]
    Ineligible(String),

    // === Auctions ===
    /// Bid is below the current minimum
    #[error("Bid of {bid} is below the current minimum bid of {minimum}")]
    BidBelowMinimum { bid: u64, minimum: u64 },

    /// No auction is open for the name
    #[error("No auction found for name: {0}")]
    AuctionNotFound(String),

    // === Internal ===
    /// Stored state violates an internal invariant
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),
}

impl LedgerError {
    /// Stable error code surfaced to callers
    pub fn code(&self) -> u32 {
        match self {
            Self::MissingHistoricalData { .. } | Self::MalformedBlockIdentifier { .. } => 2001,
            Self::InvalidInput(_) => 2002,
            Self::InsufficientStake { .. } => 2003,
            Self::Ineligible(_) => 2004,
            Self::BidBelowMinimum { .. } => 2005,
            Self::AuctionNotFound(_) => 2006,
            Self::InconsistentState(_) => 9999,
        }
    }

    /// Whether resubmitting the same action later could succeed.
    ///
    /// Missing chain data may still be in flight at the host; every other
    /// rejection is a property of the action itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingHistoricalData { .. })
    }

    pub(crate) fn overflow(context: &str) -> Self {
        Self::InconsistentState(format!("arithmetic overflow in {context}"))
    }
}
