//! Protocol settings
//!
//! Every tunable read by the core lives here. Algorithms receive these
//! values as arguments; none of them are hardcoded at the call site.
//!
//! | Group | Governs |
//! |-------|---------|
//! | `EpochSettings` | observer epoch windows |
//! | `ObserverSettings` | committee size, tenure weighting, entropy sampling |
//! | `RegistrySettings` | gateway stake and join/leave windows |
//! | `DemandFactorSettings` | purchase-period cadence and price multiplier |
//! | `PricingSettings` | annual and undername fee percentages |
//! | `AuctionSettings` | auction start/floor multipliers and decay |

use crate::error::{LedgerError, Result};
use crate::fixed::PPM;
use serde::{Deserialize, Serialize};

/// Minor units in one whole token
pub const MINOR_UNITS_PER_TOKEN: u64 = 1_000_000;

/// Complete protocol settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSettings {
    #[serde(default)]
    pub epochs: EpochSettings,

    #[serde(default)]
    pub observers: ObserverSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub demand: DemandFactorSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub auctions: AuctionSettings,
}

impl ProtocolSettings {
    /// Reject settings that would make a calculator divide by zero or
    /// break the demand-factor invariants
    pub fn validate(&self) -> Result<()> {
        fn require(condition: bool, message: &str) -> Result<()> {
            if condition {
                Ok(())
            } else {
                Err(LedgerError::InvalidInput(message.to_string()))
            }
        }

        require(self.epochs.epoch_block_length > 0, "epoch_block_length must be positive")?;
        require(
            self.observers.tenure_weight_total_block_count > 0,
            "tenure_weight_total_block_count must be positive",
        )?;
        require(self.observers.num_sampled_blocks > 0, "num_sampled_blocks must be positive")?;
        require(
            self.registry.min_network_join_stake_amount > 0,
            "min_network_join_stake_amount must be positive",
        )?;
        require(self.demand.period_block_count > 0, "period_block_count must be positive")?;
        require(
            self.demand.moving_avg_period_count > 0,
            "moving_avg_period_count must be positive",
        )?;
        require(self.demand.min_ppm > 0, "demand factor minimum must be positive")?;
        require(
            self.demand.min_ppm <= self.demand.base_value_ppm,
            "demand factor minimum must not exceed the base value",
        )?;
        require(
            self.demand.down_adjustment_ppm < PPM,
            "down adjustment must be below 100%",
        )?;
        require(self.demand.step_down_threshold > 0, "step_down_threshold must be positive")?;
        require(
            self.auctions.decay_interval_blocks > 0,
            "auction decay_interval_blocks must be positive",
        )?;
        require(self.auctions.decay_rate_ppm < PPM, "auction decay rate must be below 100%")?;
        Ok(())
    }
}

/// Observer epoch cadence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSettings {
    /// Height of the first epoch
    #[serde(default)]
    pub zero_height: u64,

    /// Blocks per epoch
    #[serde(default = "default_epoch_block_length")]
    pub epoch_block_length: u64,
}

fn default_epoch_block_length() -> u64 {
    720 // ~1 day
}

impl Default for EpochSettings {
    fn default() -> Self {
        Self {
            zero_height: 0,
            epoch_block_length: default_epoch_block_length(),
        }
    }
}

/// Observer committee selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverSettings {
    /// Committee size cap
    #[serde(default = "default_max_observers")]
    pub max_observers_per_epoch: usize,

    /// Tenure (in blocks) worth a weight of 1
    #[serde(default = "default_tenure_block_count")]
    pub tenure_weight_total_block_count: u64,

    /// Cap on the tenure weight
    #[serde(default = "default_max_tenure_weight")]
    pub max_tenure_weight: u64,

    /// Historical blocks hashed into the epoch entropy
    #[serde(default = "default_num_sampled_blocks")]
    pub num_sampled_blocks: u64,

    /// Distance between the epoch start and the first sampled block
    #[serde(default = "default_sampled_blocks_offset")]
    pub sampled_blocks_offset: u64,
}

fn default_max_observers() -> usize {
    50
}

fn default_tenure_block_count() -> u64 {
    180 * 720 // ~6 months
}

fn default_max_tenure_weight() -> u64 {
    4
}

fn default_num_sampled_blocks() -> u64 {
    3
}

fn default_sampled_blocks_offset() -> u64 {
    50
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            max_observers_per_epoch: default_max_observers(),
            tenure_weight_total_block_count: default_tenure_block_count(),
            max_tenure_weight: default_max_tenure_weight(),
            num_sampled_blocks: default_num_sampled_blocks(),
            sampled_blocks_offset: default_sampled_blocks_offset(),
        }
    }
}

/// Gateway registry rules
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Minimum operator stake, in minor units
    #[serde(default = "default_min_join_stake")]
    pub min_network_join_stake_amount: u64,

    /// Blocks between a leave request and removal
    #[serde(default = "default_gateway_leave_length")]
    pub gateway_leave_length: u64,

    /// Blocks a gateway must stay joined before it may leave
    #[serde(default = "default_min_gateway_join_length")]
    pub min_gateway_join_length: u64,
}

fn default_min_join_stake() -> u64 {
    10_000 * MINOR_UNITS_PER_TOKEN
}

fn default_gateway_leave_length() -> u64 {
    21_600 // ~30 days
}

fn default_min_gateway_join_length() -> u64 {
    3_600 // ~5 days
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            min_network_join_stake_amount: default_min_join_stake(),
            gateway_leave_length: default_gateway_leave_length(),
            min_gateway_join_length: default_min_gateway_join_length(),
        }
    }
}

/// Demand factor state machine parameters (ratios in ppm)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandFactorSettings {
    /// Blocks per purchase period
    #[serde(default = "default_period_block_count")]
    pub period_block_count: u64,

    /// Length of the trailing purchase buffer
    #[serde(default = "default_moving_avg_period_count")]
    pub moving_avg_period_count: usize,

    /// Value the factor resets to after a step-down
    #[serde(default = "default_base_value")]
    pub base_value_ppm: u64,

    /// Floor of the demand factor
    #[serde(default = "default_demand_min")]
    pub min_ppm: u64,

    /// Growth applied when demand rises
    #[serde(default = "default_up_adjustment")]
    pub up_adjustment_ppm: u64,

    /// Decay applied when demand falls
    #[serde(default = "default_down_adjustment")]
    pub down_adjustment_ppm: u64,

    /// Consecutive periods at the floor before fees are rebased
    #[serde(default = "default_step_down_threshold")]
    pub step_down_threshold: u32,

    /// Smallest fee a rebase may produce, in minor units
    #[serde(default = "default_fee_floor")]
    pub fee_floor: u64,
}

fn default_period_block_count() -> u64 {
    720
}

fn default_moving_avg_period_count() -> usize {
    7
}

fn default_base_value() -> u64 {
    PPM
}

fn default_demand_min() -> u64 {
    PPM / 2
}

fn default_up_adjustment() -> u64 {
    50_000 // 5%
}

fn default_down_adjustment() -> u64 {
    25_000 // 2.5%
}

fn default_step_down_threshold() -> u32 {
    3
}

fn default_fee_floor() -> u64 {
    MINOR_UNITS_PER_TOKEN
}

impl Default for DemandFactorSettings {
    fn default() -> Self {
        Self {
            period_block_count: default_period_block_count(),
            moving_avg_period_count: default_moving_avg_period_count(),
            base_value_ppm: default_base_value(),
            min_ppm: default_demand_min(),
            up_adjustment_ppm: default_up_adjustment(),
            down_adjustment_ppm: default_down_adjustment(),
            step_down_threshold: default_step_down_threshold(),
            fee_floor: default_fee_floor(),
        }
    }
}

/// Fee percentages (ppm)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Annual fee as a share of the base fee
    #[serde(default = "default_annual_fee")]
    pub annual_fee_ppm: u64,

    /// Years of annual fees a permabuy costs
    #[serde(default = "default_permabuy_lease_years")]
    pub permabuy_lease_years: u64,

    /// Undername surcharge for leased names
    #[serde(default = "default_undername_lease_fee")]
    pub undername_lease_fee_ppm: u64,

    /// Undername surcharge for permabought names
    #[serde(default = "default_undername_permabuy_fee")]
    pub undername_permabuy_fee_ppm: u64,
}

fn default_annual_fee() -> u64 {
    200_000 // 20%
}

fn default_permabuy_lease_years() -> u64 {
    10
}

fn default_undername_lease_fee() -> u64 {
    1_000 // 0.1%
}

fn default_undername_permabuy_fee() -> u64 {
    5_000 // 0.5%
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            annual_fee_ppm: default_annual_fee(),
            permabuy_lease_years: default_permabuy_lease_years(),
            undername_lease_fee_ppm: default_undername_lease_fee(),
            undername_permabuy_fee_ppm: default_undername_permabuy_fee(),
        }
    }
}

/// Auction parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettings {
    /// Floor price as a multiple of the registration fee
    #[serde(default = "default_floor_multiplier")]
    pub floor_price_multiplier_ppm: u64,

    /// Start price as a multiple of the floor price
    #[serde(default = "default_start_multiplier")]
    pub start_price_multiplier_ppm: u64,

    /// Blocks an auction stays open
    #[serde(default = "default_auction_duration")]
    pub auction_duration_blocks: u64,

    /// Blocks between price steps
    #[serde(default = "default_decay_interval")]
    pub decay_interval_blocks: u64,

    /// Price reduction per step
    #[serde(default = "default_decay_rate")]
    pub decay_rate_ppm: u64,
}

fn default_floor_multiplier() -> u64 {
    PPM
}

fn default_start_multiplier() -> u64 {
    50 * PPM
}

fn default_auction_duration() -> u64 {
    10_080 // ~14 days
}

fn default_decay_interval() -> u64 {
    30
}

fn default_decay_rate() -> u64 {
    22_500 // 2.25%
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            floor_price_multiplier_ppm: default_floor_multiplier(),
            start_price_multiplier_ppm: default_start_multiplier(),
            auction_duration_blocks: default_auction_duration(),
            decay_interval_blocks: default_decay_interval(),
            decay_rate_ppm: default_decay_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(ProtocolSettings::default().validate().is_ok());
    }

    #[test]
    fn test_minimum_above_base_rejected() {
        let mut settings = ProtocolSettings::default();
        settings.demand.min_ppm = settings.demand.base_value_ppm + 1;
        assert!(matches!(
            settings.validate(),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_epoch_length_rejected() {
        let mut settings = ProtocolSettings::default();
        settings.epochs.epoch_block_length = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ProtocolSettings =
            serde_json::from_str(r#"{"observers": {"max_observers_per_epoch": 4}}"#).unwrap();
        assert_eq!(settings.observers.max_observers_per_epoch, 4);
        assert_eq!(settings.observers.num_sampled_blocks, 3);
        assert_eq!(settings.demand, DemandFactorSettings::default());
    }
}
