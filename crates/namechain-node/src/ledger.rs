//! Ledger state and action entry points
//!
//! Every mutating entry point computes its result before touching the
//! state, so an action that fails leaves the previous state in place.
//!
//! | Entry point | Cadence |
//! |-------------|---------|
//! | `tally_purchase` | once per completed registration |
//! | `maybe_advance_demand_period` | any action; acts at purchase-period boundaries |
//! | `maybe_advance_observer_epoch` | any action; acts at epoch boundaries |
//! | `open_auction` / `settle_auction_bid` | auction actions |
//! | `remove_expired_auctions` | any action |

use namechain_consensus::{
    eligible_for_distribution, eligible_observers, prescribed_observers_for_epoch, ChainContext,
    EpochWindow, WeightedObserver,
};
use namechain_core::{
    Address, BlockHeight, Gateway, Gateways, LedgerError, ProtocolSettings, RegistrationType,
    Result,
};
use namechain_crypto::{hash_blake3, Digest32};
use namechain_economics::{
    registration_fee, undername_cost, AuctionPricing, AuctionState, DemandFactorState, FeeTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Observer committee persisted for one epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverEpoch {
    pub window: EpochWindow,
    pub committee: Vec<WeightedObserver>,
}

/// Persisted ledger state shared by the pricing and observer cadences
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Registered gateways in join order
    pub gateways: Gateways,

    pub demand: DemandFactorState,

    pub fees: FeeTable,

    /// Open auctions keyed by normalized name
    pub auctions: BTreeMap<String, AuctionState>,

    /// Committee of the most recently advanced epoch
    pub observers: Option<ObserverEpoch>,
}

impl LedgerState {
    /// State at the genesis height
    pub fn genesis(settings: &ProtocolSettings) -> Self {
        Self {
            gateways: Gateways::new(),
            demand: DemandFactorState::genesis(settings.epochs.zero_height, &settings.demand),
            fees: FeeTable::genesis(),
            auctions: BTreeMap::new(),
            observers: None,
        }
    }
}

/// Outcome of a winning auction bid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettlement {
    pub name: String,
    pub winner: Address,
    pub registration_type: RegistrationType,
    pub years: u64,
    /// Amount the winner pays now
    pub amount: u64,
    pub height: BlockHeight,
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The name-registry ledger
#[derive(Clone, Debug)]
pub struct Ledger {
    settings: ProtocolSettings,
    state: LedgerState,
}

impl Ledger {
    /// Ledger at genesis
    pub fn new(settings: ProtocolSettings) -> Result<Self> {
        settings.validate()?;
        let state = LedgerState::genesis(&settings);
        Ok(Self { settings, state })
    }

    /// Resume from a previously persisted state
    pub fn from_state(settings: ProtocolSettings, state: LedgerState) -> Result<Self> {
        settings.validate()?;
        if state.demand.trailing_period_purchases.len() != settings.demand.moving_avg_period_count {
            return Err(LedgerError::InconsistentState(
                "trailing purchase buffer does not match moving_avg_period_count".into(),
            ));
        }
        Ok(Self { settings, state })
    }

    /// Resume from a JSON snapshot
    pub fn from_snapshot(settings: ProtocolSettings, snapshot: &str) -> Result<Self> {
        let state: LedgerState = serde_json::from_str(snapshot)
            .map_err(|e| LedgerError::InvalidInput(format!("invalid ledger snapshot: {}", e)))?;
        Self::from_state(settings, state)
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    // === Gateway registry (written by the join/leave handlers) ===

    /// Insert or replace a gateway; a replaced gateway keeps its position
    pub fn upsert_gateway(&mut self, gateway: Gateway) {
        self.state.gateways.insert(gateway.address.clone(), gateway);
    }

    /// Remove a gateway, preserving the order of the rest
    pub fn remove_gateway(&mut self, address: &Address) -> Option<Gateway> {
        self.state.gateways.shift_remove(address)
    }

    // === Queries ===

    /// Epoch window containing `height`
    pub fn epoch_window(&self, height: BlockHeight) -> EpochWindow {
        EpochWindow::for_height(
            height,
            self.settings.epochs.zero_height,
            self.settings.epochs.epoch_block_length,
        )
    }

    /// Gateways that earn from the distribution of the epoch containing `height`
    pub fn distribution_eligible_gateways(&self, height: BlockHeight) -> Gateways {
        let window = self.epoch_window(height);
        self.state
            .gateways
            .iter()
            .filter(|(_, g)| eligible_for_distribution(Some(g), window.start_height, window.end_height))
            .map(|(address, g)| (address.clone(), g.clone()))
            .collect()
    }

    async fn committee_for<C>(&self, ctx: &C, window: &EpochWindow) -> Result<Vec<WeightedObserver>>
    where
        C: ChainContext + ?Sized,
    {
        let eligible = eligible_observers(
            &self.state.gateways,
            window.start_height,
            self.settings.registry.gateway_leave_length,
        );
        prescribed_observers_for_epoch(
            ctx,
            &eligible,
            self.settings.registry.min_network_join_stake_amount,
            window.start_height,
            &self.settings.observers,
        )
        .await
    }

    /// Observer committee for the epoch containing `height`.
    ///
    /// Served from the persisted committee when it belongs to that epoch,
    /// otherwise computed without being stored.
    pub async fn prescribed_observers<C>(&self, ctx: &C, height: BlockHeight) -> Result<Vec<WeightedObserver>>
    where
        C: ChainContext + ?Sized,
    {
        let window = self.epoch_window(height);
        if let Some(epoch) = self.state.observers.as_ref().filter(|e| e.window == window) {
            return Ok(epoch.committee.clone());
        }
        self.committee_for(ctx, &window).await
    }

    /// Whether `observer_address` sits on the committee for `height`
    pub async fn prescribed_observer<C>(
        &self,
        ctx: &C,
        height: BlockHeight,
        observer_address: &Address,
    ) -> Result<bool>
    where
        C: ChainContext + ?Sized,
    {
        let committee = self.prescribed_observers(ctx, height).await?;
        Ok(committee.iter().any(|o| &o.observer_address == observer_address))
    }

    /// Registration fee at the current demand factor
    pub fn registration_fee(
        &self,
        registration_type: RegistrationType,
        name: &str,
        years: u64,
    ) -> Result<u64> {
        registration_fee(
            registration_type,
            &normalize_name(name),
            years,
            &self.state.fees,
            self.state.demand.demand_factor_ppm,
            &self.settings.pricing,
        )
    }

    /// Cost of adding undernames at the current demand factor
    pub fn undername_cost(
        &self,
        name: &str,
        increase_qty: u64,
        years: u64,
        registration_type: RegistrationType,
    ) -> Result<u64> {
        undername_cost(
            &normalize_name(name),
            increase_qty,
            years,
            registration_type,
            &self.state.fees,
            self.state.demand.demand_factor_ppm,
            &self.settings.pricing,
        )
    }

    /// Auction quote for `name`, open or prospective
    pub fn auction_pricing(
        &self,
        name: &str,
        registration_type: RegistrationType,
        height: BlockHeight,
    ) -> Result<AuctionPricing> {
        let name = normalize_name(name);
        match self.state.auctions.get(&name) {
            Some(auction) => auction.pricing(height),
            None => {
                let fee = self.registration_fee(registration_type, &name, 1)?;
                AuctionPricing::prospective(&name, registration_type, fee, height, &self.settings.auctions)
            }
        }
    }

    /// BLAKE3 over the bincode encoding of the state.
    ///
    /// Replicas that replayed the same actions report the same fingerprint.
    pub fn fingerprint(&self) -> Result<Digest32> {
        let bytes = bincode::serialize(&self.state)
            .map_err(|e| LedgerError::InconsistentState(format!("state encoding failed: {}", e)))?;
        Ok(hash_blake3(&bytes))
    }

    pub fn fingerprint_hex(&self) -> Result<String> {
        self.fingerprint().map(hex::encode)
    }

    /// JSON snapshot of the state
    pub fn snapshot(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| LedgerError::InconsistentState(format!("snapshot failed: {}", e)))
    }

    // === Mutations ===

    /// Count one completed registration toward the current purchase period
    pub fn tally_purchase(&mut self) {
        self.state.demand.tally_purchase();
    }

    /// Close the purchase period if `height` is past it. Returns whether it closed.
    pub fn maybe_advance_demand_period(&mut self, height: BlockHeight) -> Result<bool> {
        let Some(update) =
            self.state
                .demand
                .maybe_advance(height, &self.state.fees, &self.settings.demand)?
        else {
            return Ok(false);
        };

        self.state.demand = update.state;
        if let Some(fees) = update.rebased_fees {
            self.state.fees = fees;
        }
        Ok(true)
    }

    /// Select and persist the committee when `height` enters a new epoch.
    /// Returns whether a new committee was stored.
    ///
    /// `height` must be the height of the block `ctx` is evaluating.
    pub async fn maybe_advance_observer_epoch<C>(&mut self, ctx: &C, height: BlockHeight) -> Result<bool>
    where
        C: ChainContext + ?Sized,
    {
        let tip = ctx.block_height();
        if height != tip {
            return Err(LedgerError::InvalidInput(format!(
                "epoch advance at height {} evaluated in block {}",
                height, tip
            )));
        }

        let window = self.epoch_window(height);
        if self.state.observers.as_ref().is_some_and(|e| e.window == window) {
            return Ok(false);
        }

        let committee = self.committee_for(ctx, &window).await?;
        info!(
            epoch = window.index(),
            start = window.start_height,
            end = window.end_height,
            observers = committee.len(),
            "Advanced observer epoch"
        );
        self.state.observers = Some(ObserverEpoch { window, committee });
        Ok(true)
    }

    /// Open an auction for `name`; the initiator pays the returned floor price
    pub fn open_auction(
        &mut self,
        name: &str,
        registration_type: RegistrationType,
        initiator: &Address,
        years: u64,
        height: BlockHeight,
    ) -> Result<AuctionState> {
        let name = normalize_name(name);
        if let Some(existing) = self.state.auctions.get(&name) {
            if existing.is_active(height) {
                return Err(LedgerError::InvalidInput(format!(
                    "an auction for {} is already open until height {}",
                    name,
                    existing.end_height()
                )));
            }
        }

        let fee = self.registration_fee(registration_type, &name, years)?;
        let auction = AuctionState::open(
            name.clone(),
            registration_type,
            initiator.clone(),
            years,
            fee,
            height,
            &self.settings.auctions,
        )?;

        info!(
            name = %name,
            floor = auction.floor_price,
            start_price = auction.start_price,
            end = auction.end_height(),
            "Opened auction"
        );
        self.state.auctions.insert(name, auction.clone());
        Ok(auction)
    }

    /// Close the auction for `name` in favour of `caller`.
    ///
    /// The winning bid counts as a completed registration.
    pub fn settle_auction_bid(
        &mut self,
        name: &str,
        caller: &Address,
        submitted_bid: Option<u64>,
        height: BlockHeight,
    ) -> Result<AuctionSettlement> {
        let name = normalize_name(name);
        let auction = self
            .state
            .auctions
            .get(&name)
            .ok_or_else(|| LedgerError::AuctionNotFound(name.clone()))?;
        let amount = auction.required_bid_for_caller(caller, submitted_bid, height)?;

        let settlement = AuctionSettlement {
            name: name.clone(),
            winner: caller.clone(),
            registration_type: auction.registration_type,
            years: auction.years,
            amount,
            height,
        };

        self.state.auctions.remove(&name);
        self.state.demand.tally_purchase();
        info!(name = %name, winner = %caller, amount, "Settled auction");
        Ok(settlement)
    }

    /// Drop auctions that ended without a winner. Returns the removed names.
    pub fn remove_expired_auctions(&mut self, height: BlockHeight) -> Vec<String> {
        let expired: Vec<String> = self
            .state
            .auctions
            .iter()
            .filter(|(_, auction)| !auction.is_active(height))
            .map(|(name, _)| name.clone())
            .collect();

        for name in &expired {
            self.state.auctions.remove(name);
            debug!(name = %name, height, "Removed expired auction");
        }
        expired
    }
}
