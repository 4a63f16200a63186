//! Observer sortition
//!
//! Weighted sampling without replacement over the eligible gateways.
//!
//! ## Weights
//!
//! All weights are fixed point, scaled by `WEIGHT_SCALE` (1.0 = 10^12):
//!
//! ```text
//! stake      = operator_stake / min_stake
//! tenure     = min(max_tenure, (epoch_start - start) / tenure_blocks)
//! composite  = stake * tenure * gateway_ratio * observer_ratio
//! normalized = composite / sum(composite)
//! ```
//!
//! ## Draw
//!
//! Each round reads a 32-bit draw from the head of a SHA-256 hash chain
//! seeded with the epoch entropy, then walks the full list and selects the
//! first unselected gateway whose cumulative weight covers the draw. The
//! chain advances once per position passed over, so a selection leaves the
//! hash for the next round as is.

use crate::context::ChainContext;
use crate::entropy::entropy_for_epoch;
use namechain_core::fixed::mul_div;
use namechain_core::{Address, BlockHeight, Gateways, LedgerError, ObserverSettings, Result};
use namechain_crypto::{Digest32, HashPrimitive};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Fixed-point scale of every sortition weight
pub const WEIGHT_SCALE: u128 = 1_000_000_000_000;

/// Bits of the hash consumed per draw
const DRAW_BITS: u32 = 32;

/// A gateway with its sortition weights for one epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedObserver {
    pub gateway_address: Address,
    pub observer_address: Address,
    pub stake: u64,
    pub start: BlockHeight,
    pub stake_weight: u128,
    pub tenure_weight: u128,
    pub gateway_reward_ratio_weight: u128,
    pub observer_reward_ratio_weight: u128,
    pub composite_weight: u128,
    pub normalized_composite_weight: u128,
}

/// Weigh gateways in registry order.
///
/// The input is expected to be filtered already; see
/// [`eligible_observers`](crate::eligibility::eligible_observers).
pub fn weigh_observers(
    gateways: &Gateways,
    min_network_join_stake_amount: u64,
    epoch_start: BlockHeight,
    settings: &ObserverSettings,
) -> Result<Vec<WeightedObserver>> {
    if min_network_join_stake_amount == 0 {
        return Err(LedgerError::InvalidInput(
            "min_network_join_stake_amount must be positive".into(),
        ));
    }

    let max_tenure = (settings.max_tenure_weight as u128)
        .checked_mul(WEIGHT_SCALE)
        .ok_or_else(|| LedgerError::InconsistentState("max tenure weight overflow".into()))?;

    let mut weighted = Vec::with_capacity(gateways.len());
    let mut total: u128 = 0;

    for (address, gateway) in gateways {
        let stake_weight = mul_div(
            gateway.operator_stake as u128,
            WEIGHT_SCALE,
            min_network_join_stake_amount as u128,
        )?;
        let elapsed = epoch_start.saturating_sub(gateway.start);
        let tenure_weight = mul_div(
            elapsed as u128,
            WEIGHT_SCALE,
            settings.tenure_weight_total_block_count as u128,
        )?
        .min(max_tenure);

        // Reward-ratio weights stay at 1.0 until performance tracking feeds them
        let gateway_reward_ratio_weight = WEIGHT_SCALE;
        let observer_reward_ratio_weight = WEIGHT_SCALE;

        let composite_weight = [tenure_weight, gateway_reward_ratio_weight, observer_reward_ratio_weight]
            .into_iter()
            .try_fold(stake_weight, |acc, w| mul_div(acc, w, WEIGHT_SCALE))?;

        total = total
            .checked_add(composite_weight)
            .ok_or_else(|| LedgerError::InconsistentState("composite weight overflow".into()))?;

        weighted.push(WeightedObserver {
            gateway_address: address.clone(),
            observer_address: gateway.observer_address.clone(),
            stake: gateway.operator_stake,
            start: gateway.start,
            stake_weight,
            tenure_weight,
            gateway_reward_ratio_weight,
            observer_reward_ratio_weight,
            composite_weight,
            normalized_composite_weight: 0,
        });
    }

    if total > 0 {
        for observer in &mut weighted {
            observer.normalized_composite_weight =
                mul_div(observer.composite_weight, WEIGHT_SCALE, total)?;
        }
    }

    Ok(weighted)
}

/// `floor(running * 2^32 / total)` for `running <= total`, by binary long
/// division so that no intermediate exceeds `total`.
fn cumulative_threshold(running: u128, total: u128) -> u128 {
    let mut quotient = running / total;
    let mut remainder = running % total;
    for _ in 0..DRAW_BITS {
        let headroom = total - remainder;
        if remainder >= headroom {
            quotient = (quotient << 1) | 1;
            remainder -= headroom;
        } else {
            quotient <<= 1;
            remainder <<= 1;
        }
    }
    quotient
}

fn draw_from(hash: &Digest32) -> u128 {
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]) as u128
}

/// Select up to `count` observers from `weighted`, in selection order.
///
/// The first draw is read from `entropy` itself, unhashed.
/// `draw / 2^32 <= running / total` is evaluated exactly as
/// `draw <= floor(running * 2^32 / total)`. A round whose draw lands on an
/// already selected observer moves forward to the next unselected one; if
/// none remains past that point the round selects nothing.
pub fn run_sortition<H>(
    weighted: &[WeightedObserver],
    count: usize,
    entropy: &Digest32,
    hasher: &H,
) -> Vec<WeightedObserver>
where
    H: HashPrimitive + ?Sized,
{
    let total = weighted
        .iter()
        .fold(0u128, |acc, o| acc.saturating_add(o.composite_weight));

    let mut selected = vec![false; weighted.len()];
    let mut committee = Vec::with_capacity(count.min(weighted.len()));
    let mut hash = *entropy;

    for round in 0..count {
        let draw = draw_from(&hash);
        let mut running: u128 = 0;

        for (index, observer) in weighted.iter().enumerate() {
            running = running.saturating_add(observer.composite_weight);
            let covered = total == 0 || draw <= cumulative_threshold(running, total);

            if covered && !selected[index] {
                trace!(
                    round,
                    index,
                    draw = %draw,
                    gateway = %observer.gateway_address,
                    "Selected observer"
                );
                selected[index] = true;
                committee.push(observer.clone());
                break;
            }
            hash = hasher.digest(&hash);
        }
    }

    committee
}

/// Observer committee for the epoch starting at `epoch_start`.
///
/// When the eligible set fits in the committee every gateway is returned in
/// registry order and no entropy is read.
pub async fn prescribed_observers_for_epoch<C>(
    ctx: &C,
    eligible: &Gateways,
    min_network_join_stake_amount: u64,
    epoch_start: BlockHeight,
    settings: &ObserverSettings,
) -> Result<Vec<WeightedObserver>>
where
    C: ChainContext + ?Sized,
{
    let weighted = weigh_observers(eligible, min_network_join_stake_amount, epoch_start, settings)?;
    let max = settings.max_observers_per_epoch;

    if weighted.len() <= max {
        debug!(
            epoch_start,
            observers = weighted.len(),
            "Eligible set fits the committee, skipping sortition"
        );
        return Ok(weighted);
    }

    let entropy = entropy_for_epoch(ctx, epoch_start, settings).await?;
    let committee = run_sortition(&weighted, max, &entropy, ctx);

    debug!(
        epoch_start,
        eligible = weighted.len(),
        selected = committee.len(),
        "Ran observer sortition"
    );
    Ok(committee)
}
