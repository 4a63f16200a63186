//! Auction price curve
//!
//! Contested names are sold by descending-price auction. The minimum bid
//! starts at `start_price` and is cut by `decay_rate` every
//! `decay_interval_blocks`, never falling below `floor_price`:
//!
//! ```text
//! price
//!   │ ▇▇
//!   │   ▇▇
//!   │     ▇▇▇
//!   │        ▇▇▇▇
//!   │            ▇▇▇▇▇▇
//!   │                  ▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇  floor
//!   └──────────────────────────────────────┤── height
//!  start                              start + duration
//! ```

use crate::fees::name_length;
use namechain_core::fixed::{mul_ppm, PPM};
use namechain_core::{Address, AuctionSettings, BlockHeight, LedgerError, RegistrationType, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Permabought names shorter than this must go through auction
pub const AUCTION_REQUIRED_BELOW_LENGTH: usize = 12;

/// Whether registering `name` this way must go through auction
pub fn is_name_required_to_be_auctioned(name: &str, registration_type: RegistrationType) -> bool {
    registration_type == RegistrationType::Permabuy && name_length(name) < AUCTION_REQUIRED_BELOW_LENGTH
}

fn end_height_of(start_height: BlockHeight, settings: &AuctionSettings) -> BlockHeight {
    start_height.saturating_add(settings.auction_duration_blocks)
}

fn decay_step(price: u64, floor_price: u64, settings: &AuctionSettings) -> Result<u64> {
    let decayed = mul_ppm(price, PPM.saturating_sub(settings.decay_rate_ppm))?;
    Ok(decayed.max(floor_price))
}

/// Minimum bid at `height` for an auction opened at `start_height`
pub fn auction_price_at(
    start_height: BlockHeight,
    start_price: u64,
    floor_price: u64,
    height: BlockHeight,
    settings: &AuctionSettings,
) -> Result<u64> {
    if height >= end_height_of(start_height, settings) {
        return Ok(floor_price);
    }

    let steps = height.saturating_sub(start_height) / settings.decay_interval_blocks.max(1);
    let mut price = start_price.max(floor_price);
    for _ in 0..steps {
        if price == floor_price {
            break;
        }
        price = decay_step(price, floor_price, settings)?;
    }
    Ok(price)
}

/// Minimum bid at every height where it changes, ending with the floor at
/// the auction's end height
pub fn price_schedule(
    start_height: BlockHeight,
    start_price: u64,
    floor_price: u64,
    settings: &AuctionSettings,
) -> Result<BTreeMap<BlockHeight, u64>> {
    let end_height = end_height_of(start_height, settings);
    let interval = settings.decay_interval_blocks.max(1);

    let mut prices = BTreeMap::new();
    let mut price = start_price.max(floor_price);
    let mut height = start_height;
    while height < end_height {
        prices.insert(height, price);
        price = decay_step(price, floor_price, settings)?;
        height = match height.checked_add(interval) {
            Some(next) => next,
            None => break,
        };
    }
    prices.insert(end_height, floor_price);
    Ok(prices)
}

/// An open auction for a contested name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    pub name: String,
    pub registration_type: RegistrationType,
    pub initiator: Address,
    pub start_height: BlockHeight,
    pub start_price: u64,
    pub floor_price: u64,
    /// Lease years the winner receives; 0 for permabuy
    pub years: u64,
    pub settings: AuctionSettings,
}

impl AuctionState {
    /// Open an auction priced off the name's registration fee.
    ///
    /// The initiator pays the floor price up front.
    pub fn open(
        name: impl Into<String>,
        registration_type: RegistrationType,
        initiator: impl Into<Address>,
        years: u64,
        registration_fee: u64,
        start_height: BlockHeight,
        settings: &AuctionSettings,
    ) -> Result<Self> {
        let floor_price = mul_ppm(registration_fee, settings.floor_price_multiplier_ppm)?;
        let start_price = mul_ppm(floor_price, settings.start_price_multiplier_ppm)?;
        let years = match registration_type {
            RegistrationType::Lease => years,
            RegistrationType::Permabuy => 0,
        };

        Ok(Self {
            name: name.into(),
            registration_type,
            initiator: initiator.into(),
            start_height,
            start_price,
            floor_price,
            years,
            settings: settings.clone(),
        })
    }

    /// First height at which the auction no longer accepts bids
    pub fn end_height(&self) -> BlockHeight {
        end_height_of(self.start_height, &self.settings)
    }

    pub fn is_active(&self, height: BlockHeight) -> bool {
        self.end_height() > height
    }

    /// Current minimum bid
    pub fn minimum_bid(&self, height: BlockHeight) -> Result<u64> {
        auction_price_at(
            self.start_height,
            self.start_price,
            self.floor_price,
            height,
            &self.settings,
        )
    }

    pub fn price_schedule(&self) -> Result<BTreeMap<BlockHeight, u64>> {
        price_schedule(self.start_height, self.start_price, self.floor_price, &self.settings)
    }

    /// Amount `caller` pays to win with `submitted_bid` at `height`.
    ///
    /// A bid below the current minimum is rejected. The charge never
    /// exceeds the minimum, and the initiator is credited the floor price
    /// it paid when opening the auction.
    pub fn required_bid_for_caller(
        &self,
        caller: &Address,
        submitted_bid: Option<u64>,
        height: BlockHeight,
    ) -> Result<u64> {
        if !self.is_active(height) {
            return Err(LedgerError::InvalidInput(format!(
                "auction for {} ended at height {}",
                self.name,
                self.end_height()
            )));
        }

        let required = self.minimum_bid(height)?;
        if let Some(bid) = submitted_bid {
            if bid < required {
                return Err(LedgerError::BidBelowMinimum {
                    bid,
                    minimum: required,
                });
            }
        }

        let charge = submitted_bid.map_or(required, |bid| bid.min(required));
        if caller == &self.initiator {
            return Ok(charge.saturating_sub(self.floor_price));
        }
        Ok(charge)
    }

    /// Pricing view of this auction at `height`
    pub fn pricing(&self, height: BlockHeight) -> Result<AuctionPricing> {
        Ok(AuctionPricing {
            name: self.name.clone(),
            registration_type: self.registration_type,
            is_active: self.is_active(height),
            is_required_to_be_auctioned: is_name_required_to_be_auctioned(
                &self.name,
                self.registration_type,
            ),
            minimum_bid: self.minimum_bid(height)?,
            start_height: self.start_height,
            end_height: self.end_height(),
            start_price: self.start_price,
            floor_price: self.floor_price,
            prices: self.price_schedule()?,
        })
    }
}

/// Price quote for an open or prospective auction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPricing {
    pub name: String,
    pub registration_type: RegistrationType,
    pub is_active: bool,
    pub is_required_to_be_auctioned: bool,
    pub minimum_bid: u64,
    pub start_height: BlockHeight,
    pub end_height: BlockHeight,
    pub start_price: u64,
    pub floor_price: u64,
    pub prices: BTreeMap<BlockHeight, u64>,
}

impl AuctionPricing {
    /// Quote for an auction that would open at `height`.
    ///
    /// Until someone opens it, the minimum bid is the floor price.
    pub fn prospective(
        name: &str,
        registration_type: RegistrationType,
        registration_fee: u64,
        height: BlockHeight,
        settings: &AuctionSettings,
    ) -> Result<Self> {
        let floor_price = mul_ppm(registration_fee, settings.floor_price_multiplier_ppm)?;
        let start_price = mul_ppm(floor_price, settings.start_price_multiplier_ppm)?;

        Ok(Self {
            name: name.to_string(),
            registration_type,
            is_active: false,
            is_required_to_be_auctioned: is_name_required_to_be_auctioned(name, registration_type),
            minimum_bid: floor_price,
            start_height: height,
            end_height: end_height_of(height, settings),
            start_price,
            floor_price,
            prices: price_schedule(height, start_price, floor_price, settings)?,
        })
    }
}
