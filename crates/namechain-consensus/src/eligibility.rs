//! Gateway eligibility predicates
//!
//! | Predicate | Holds when |
//! |-----------|------------|
//! | `eligible_for_distribution` | joined before the epoch, or leaving after it ends |
//! | `eligible_to_leave` | joined long enough and still joined or hidden |
//! | `eligible_to_be_removed` | leaving and past its end height |
//! | `joined` | joined and not yet past its end height |
//! | `eligible_observer` | started, and not inside its leave window |

use namechain_core::{
    BlockHeight, Gateway, GatewayStatus, Gateways, LedgerError, RegistrySettings, Result,
};

/// Whether the gateway earns from the distribution of the given epoch
pub fn eligible_for_distribution(
    gateway: Option<&Gateway>,
    epoch_start: BlockHeight,
    epoch_end: BlockHeight,
) -> bool {
    let Some(gateway) = gateway else {
        return false;
    };
    let started_before_epoch = gateway.start < epoch_start;
    match gateway.status {
        GatewayStatus::Joined => started_before_epoch,
        GatewayStatus::Leaving => started_before_epoch && gateway.end > epoch_end,
        GatewayStatus::Hidden => false,
    }
}

/// Whether the gateway is joined at `height`
pub fn joined(gateway: Option<&Gateway>, height: BlockHeight) -> bool {
    gateway.is_some_and(|g| g.status == GatewayStatus::Joined && g.end > height)
}

pub fn hidden(gateway: Option<&Gateway>) -> bool {
    gateway.is_some_and(|g| g.status == GatewayStatus::Hidden)
}

/// Whether the gateway may start leaving the network at `height`
pub fn eligible_to_leave(
    gateway: Option<&Gateway>,
    height: BlockHeight,
    settings: &RegistrySettings,
) -> bool {
    let Some(g) = gateway else {
        return false;
    };
    let joined_for_minimum = height >= g.start.saturating_add(settings.min_gateway_join_length);
    joined_for_minimum && (joined(gateway, height) || hidden(gateway))
}

/// Whether a leaving gateway has served its leave window
pub fn eligible_to_be_removed(gateway: Option<&Gateway>, height: BlockHeight) -> bool {
    gateway.is_some_and(|g| g.status == GatewayStatus::Leaving && g.end <= height)
}

/// Whether the gateway may sit on the observer committee at `height`
pub fn eligible_observer(gateway: &Gateway, height: BlockHeight, gateway_leave_length: u64) -> bool {
    let started = gateway.start <= height;
    let before_leave_window = gateway.end == 0
        || gateway
            .end
            .checked_sub(gateway_leave_length)
            .is_some_and(|leave_start| leave_start >= height);
    started && before_leave_window
}

/// Gateways eligible to observe at `height`, in registry order
pub fn eligible_observers(
    gateways: &Gateways,
    height: BlockHeight,
    gateway_leave_length: u64,
) -> Gateways {
    gateways
        .iter()
        .filter(|(_, gateway)| eligible_observer(gateway, height, gateway_leave_length))
        .map(|(address, gateway)| (address.clone(), gateway.clone()))
        .collect()
}

/// Reject a stake below the network minimum
pub fn assert_minimum_stake(stake: u64, settings: &RegistrySettings) -> Result<()> {
    if stake < settings.min_network_join_stake_amount {
        return Err(LedgerError::InsufficientStake {
            required: settings.min_network_join_stake_amount,
            provided: stake,
        });
    }
    Ok(())
}

/// Reject a leave request from a gateway that may not leave yet
pub fn assert_eligible_to_leave(
    gateway: Option<&Gateway>,
    height: BlockHeight,
    settings: &RegistrySettings,
) -> Result<()> {
    if eligible_to_leave(gateway, height, settings) {
        return Ok(());
    }
    let status = gateway.map_or("unregistered", |g| g.status.name());
    Err(LedgerError::Ineligible(format!(
        "gateway must be joined for at least {} blocks and not already leaving (status: {})",
        settings.min_gateway_join_length, status
    )))
}
