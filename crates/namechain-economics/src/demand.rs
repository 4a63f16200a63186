//! Demand factor
//!
//! A price multiplier that rises while each purchase period outsells the
//! trailing average and decays otherwise. Once it has sat at its floor for
//! `step_down_threshold` periods in a row, the fee table is rebased onto the
//! floor prices and the multiplier returns to its base value.

use crate::fees::FeeTable;
use namechain_consensus::periodic_update_due;
use namechain_core::fixed::{format_ppm, mul_ppm, saturating_mul_ppm, PPM};
use namechain_core::{BlockHeight, DemandFactorSettings, LedgerError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Persisted demand factor state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandFactorState {
    /// Current multiplier (ppm), never below the configured minimum
    pub demand_factor_ppm: u64,

    /// Height at which period 0 began
    pub period_zero_height: BlockHeight,

    /// Index of the period being tallied
    pub current_period: u64,

    /// Purchases tallied in the current period
    pub purchases_this_period: u64,

    /// Purchase counts of past periods, indexed by `period % len`
    pub trailing_period_purchases: Vec<u64>,

    /// Consecutive closed periods that ended at the minimum
    pub consecutive_periods_at_min: u32,
}

/// Result of closing a purchase period
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemandUpdate {
    pub state: DemandFactorState,

    /// Replacement fee table when the period triggered a rebase
    pub rebased_fees: Option<FeeTable>,
}

/// Whether demand rose: `purchases >= mean(trailing)` and `purchases != 0`.
///
/// Compared as `purchases * len >= sum(trailing)` so the mean never rounds.
pub fn demand_is_increasing(purchases: u64, trailing: &[u64]) -> bool {
    if purchases == 0 {
        return false;
    }
    let sum: u128 = trailing.iter().map(|count| *count as u128).sum();
    purchases as u128 * trailing.len() as u128 >= sum
}

impl DemandFactorState {
    /// State at genesis
    pub fn genesis(period_zero_height: BlockHeight, settings: &DemandFactorSettings) -> Self {
        Self {
            demand_factor_ppm: settings.base_value_ppm,
            period_zero_height,
            current_period: 0,
            purchases_this_period: 0,
            trailing_period_purchases: vec![0; settings.moving_avg_period_count],
            consecutive_periods_at_min: 0,
        }
    }

    /// Count one completed registration
    pub fn tally_purchase(&mut self) {
        self.purchases_this_period = self.purchases_this_period.saturating_add(1);
    }

    /// Whether the period being tallied has ended at `height`
    pub fn update_due(&self, height: BlockHeight, settings: &DemandFactorSettings) -> bool {
        periodic_update_due(
            height,
            self.period_zero_height,
            settings.period_block_count,
            self.current_period,
        )
    }

    /// Close the current period if it has ended.
    ///
    /// Returns `None` when no period boundary has been crossed. Advances at
    /// most one period per call, whatever the height gap.
    pub fn maybe_advance(
        &self,
        height: BlockHeight,
        fees: &FeeTable,
        settings: &DemandFactorSettings,
    ) -> Result<Option<DemandUpdate>> {
        if !self.update_due(height, settings) {
            return Ok(None);
        }
        if self.trailing_period_purchases.len() != settings.moving_avg_period_count
            || self.trailing_period_purchases.is_empty()
        {
            return Err(LedgerError::InconsistentState(format!(
                "trailing purchase buffer has {} entries, expected {}",
                self.trailing_period_purchases.len(),
                settings.moving_avg_period_count
            )));
        }

        let mut next = self.clone();
        let purchases = self.purchases_this_period;
        let min = settings.min_ppm;

        if demand_is_increasing(purchases, &self.trailing_period_purchases) {
            // saturates at u64::MAX
            next.demand_factor_ppm = saturating_mul_ppm(
                self.demand_factor_ppm,
                PPM.saturating_add(settings.up_adjustment_ppm),
            );
        } else if self.demand_factor_ppm > min {
            next.demand_factor_ppm = mul_ppm(
                self.demand_factor_ppm,
                PPM.saturating_sub(settings.down_adjustment_ppm),
            )?
            .max(min);
        }

        let mut rebased_fees = None;
        if next.demand_factor_ppm == min {
            next.consecutive_periods_at_min = next.consecutive_periods_at_min.saturating_add(1);
            if next.consecutive_periods_at_min >= settings.step_down_threshold {
                next.consecutive_periods_at_min = 0;
                next.demand_factor_ppm = settings.base_value_ppm;
                rebased_fees = Some(fees.rebase(min, settings.fee_floor)?);
                info!(
                    period = self.current_period,
                    base = %format_ppm(settings.base_value_ppm),
                    "Demand factor held at minimum, rebased fee table"
                );
            }
        } else {
            next.consecutive_periods_at_min = 0;
        }

        let slot = (self.current_period % settings.moving_avg_period_count as u64) as usize;
        next.trailing_period_purchases[slot] = purchases;
        next.current_period = self.current_period.saturating_add(1);
        next.purchases_this_period = 0;

        debug!(
            period = self.current_period,
            purchases,
            demand_factor = %format_ppm(next.demand_factor_ppm),
            "Closed purchase period"
        );

        Ok(Some(DemandUpdate {
            state: next,
            rebased_fees,
        }))
    }
}
