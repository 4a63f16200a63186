//! # Namechain Economics - Name Pricing
//!
//! Every price a registrant pays is a base fee for the name's length, scaled
//! by a demand factor that follows registration volume.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | `fees` | base fee per name length, rebased after sustained low demand |
//! | `demand` | per-period demand factor state machine |
//! | `pricing` | lease, permabuy and undername fee calculators |
//! | `auction` | decaying minimum bid for contested names |
//!
//! ## Demand Factor
//!
//! ```text
//!            purchases >= moving average          df at min for
//!          ┌──────────── x (1 + up) ───┐        `threshold` periods
//!          │                           ▼       ┌──────────────────┐
//!   ... ──►│ df ──── x (1 - down) ───► df ────►│ df = base, rebase│
//!          │         (floor: min)              │ fees at min      │
//!          └───────────────────────────────────┴──────────────────┘
//! ```
//!
//! All amounts are integer minor units and all ratios are parts-per-million,
//! so every replica computes the same price to the unit.

pub mod auction;
pub mod demand;
pub mod fees;
pub mod pricing;

// Re-exports
pub use auction::{
    auction_price_at, is_name_required_to_be_auctioned, price_schedule, AuctionPricing,
    AuctionState,
};
pub use demand::{demand_is_increasing, DemandFactorState, DemandUpdate};
pub use fees::{name_length, FeeTable, MAX_NAME_LENGTH};
pub use pricing::{
    annual_renewal_fee, lease_fee, permabuy_fee, registration_fee, undername_cost,
};
