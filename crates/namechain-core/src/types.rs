//! Core type definitions for Namechain
//!
//! Gateways are the only participants the core reasons about. They are
//! created and mutated by the join/leave handlers and are read-only here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height. Non-decreasing across the ordered action log.
pub type BlockHeight = u64;

/// Wallet or contract address as issued by the host chain
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Network membership status of a gateway
///
/// ```text
/// Joined ──► Leaving ──► (removed)
///   ▲  │
///   │  ▼
///  Hidden
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    #[default]
    Joined,
    Leaving,
    Hidden,
}

impl GatewayStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::Leaving => "leaving",
            Self::Hidden => "hidden",
        }
    }
}

/// A gateway registered on the network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    /// Operator wallet that staked the gateway
    pub address: Address,

    /// Stake held by the operator, in minor token units
    pub operator_stake: u64,

    /// Height at which the gateway joined
    pub start: BlockHeight,

    /// Height at which the gateway leaves; 0 while membership is indefinite
    pub end: BlockHeight,

    /// Membership status
    pub status: GatewayStatus,

    /// Wallet that submits observation reports for this gateway
    pub observer_address: Address,
}

impl Gateway {
    /// Create a joined gateway that observes with its own wallet
    pub fn joined(address: impl Into<Address>, operator_stake: u64, start: BlockHeight) -> Self {
        let address = address.into();
        Self {
            observer_address: address.clone(),
            address,
            operator_stake,
            start,
            end: 0,
            status: GatewayStatus::Joined,
        }
    }

    /// Use a dedicated observer wallet
    pub fn with_observer(mut self, observer: impl Into<Address>) -> Self {
        self.observer_address = observer.into();
        self
    }

    /// Set status and end height
    pub fn with_status(mut self, status: GatewayStatus, end: BlockHeight) -> Self {
        self.status = status;
        self.end = end;
        self
    }
}

/// Gateways keyed by operator address, in insertion order.
///
/// Sortition walks this map front to back; a hash-ordered map here would
/// make replicas disagree on the committee.
pub type Gateways = IndexMap<Address, Gateway>;

/// How a name is held
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    #[default]
    Lease,
    Permabuy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults_observer_to_operator() {
        let gateway = Gateway::joined("gw-1", 10_000, 5);
        assert_eq!(gateway.observer_address, Address::from("gw-1"));
        assert_eq!(gateway.status, GatewayStatus::Joined);
        assert_eq!(gateway.end, 0);
    }

    #[test]
    fn test_gateways_keep_insertion_order() {
        let mut gateways = Gateways::new();
        for name in ["zeta", "alpha", "mike"] {
            gateways.insert(Address::from(name), Gateway::joined(name, 1, 0));
        }
        let order: Vec<&str> = gateways.keys().map(Address::as_str).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mike"]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&GatewayStatus::Leaving).unwrap();
        assert_eq!(json, "\"leaving\"");
        assert_eq!(GatewayStatus::Hidden.name(), "hidden");
    }
}
