//! Name fee calculators
//!
//! Each fee is computed as one exact integer product and truncated once at
//! the end, so intermediate ppm ratios never lose precision.
//!
//! | Fee | Formula |
//! |-----|---------|
//! | lease | `df * (base + base * annual * years)` |
//! | permabuy | `df * base * annual * permabuy_years` |
//! | undername | `df * base * (1 + undername_pct) * qty * years` |
//! | annual renewal | `base * annual * years` |

use crate::fees::FeeTable;
use namechain_core::fixed::{mul_div, to_u64, PPM};
use namechain_core::{LedgerError, PricingSettings, RegistrationType, Result};

const PPM_SQUARED: u128 = (PPM as u128) * (PPM as u128);

fn product(factors: &[u128]) -> Result<u128> {
    factors.iter().try_fold(1u128, |acc, factor| {
        acc.checked_mul(*factor)
            .ok_or_else(|| LedgerError::InconsistentState("fee product overflow".into()))
    })
}

/// Apply the demand factor to an amount carrying one extra ppm scale
fn with_demand_factor(scaled_amount: u128, demand_factor_ppm: u64, context: &str) -> Result<u64> {
    to_u64(
        mul_div(scaled_amount, demand_factor_ppm as u128, PPM_SQUARED)?,
        context,
    )
}

/// Annual fees for `years`, without the demand factor
pub fn annual_renewal_fee(
    name: &str,
    years: u64,
    fees: &FeeTable,
    settings: &PricingSettings,
) -> Result<u64> {
    let base = fees.base_fee(name)? as u128;
    let scaled = product(&[base, settings.annual_fee_ppm as u128, years as u128])?;
    to_u64(scaled / PPM as u128, "annual_renewal_fee")
}

/// Cost of leasing `name` for `years`
pub fn lease_fee(
    name: &str,
    years: u64,
    fees: &FeeTable,
    demand_factor_ppm: u64,
    settings: &PricingSettings,
) -> Result<u64> {
    let base = fees.base_fee(name)? as u128;
    let annual = product(&[settings.annual_fee_ppm as u128, years as u128])?;
    let multiplier = (PPM as u128)
        .checked_add(annual)
        .ok_or_else(|| LedgerError::InconsistentState("lease multiplier overflow".into()))?;
    with_demand_factor(product(&[base, multiplier])?, demand_factor_ppm, "lease_fee")
}

/// Cost of buying `name` outright
pub fn permabuy_fee(
    name: &str,
    fees: &FeeTable,
    demand_factor_ppm: u64,
    settings: &PricingSettings,
) -> Result<u64> {
    let base = fees.base_fee(name)? as u128;
    let scaled = product(&[
        base,
        settings.annual_fee_ppm as u128,
        settings.permabuy_lease_years as u128,
    ])?;
    with_demand_factor(scaled, demand_factor_ppm, "permabuy_fee")
}

/// Cost of adding `increase_qty` undernames to `name` for `years`
pub fn undername_cost(
    name: &str,
    increase_qty: u64,
    years: u64,
    registration_type: RegistrationType,
    fees: &FeeTable,
    demand_factor_ppm: u64,
    settings: &PricingSettings,
) -> Result<u64> {
    let base = fees.base_fee(name)? as u128;
    let surcharge = match registration_type {
        RegistrationType::Lease => settings.undername_lease_fee_ppm,
        RegistrationType::Permabuy => settings.undername_permabuy_fee_ppm,
    };
    let scaled = product(&[
        base,
        PPM as u128 + surcharge as u128,
        increase_qty as u128,
        years as u128,
    ])?;
    with_demand_factor(scaled, demand_factor_ppm, "undername_cost")
}

/// Registration fee for either holding type; `years` is ignored for permabuy
pub fn registration_fee(
    registration_type: RegistrationType,
    name: &str,
    years: u64,
    fees: &FeeTable,
    demand_factor_ppm: u64,
    settings: &PricingSettings,
) -> Result<u64> {
    match registration_type {
        RegistrationType::Lease => lease_fee(name, years, fees, demand_factor_ppm, settings),
        RegistrationType::Permabuy => permabuy_fee(name, fees, demand_factor_ppm, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DF_ONE: u64 = PPM;

    fn settings() -> PricingSettings {
        PricingSettings::default()
    }

    #[test]
    fn test_lease_fee() {
        let fees = FeeTable::genesis();
        // 1_000 tokens * (1 + 0.2 * 1)
        assert_eq!(
            lease_fee("a-long-enough-name", 1, &fees, DF_ONE, &settings()).unwrap(),
            1_200_000_000
        );
        // demand factor 1.05 over 3 years: 1_250 * 1.6 * 1.05 tokens
        assert_eq!(
            lease_fee("twelve-chars", 3, &fees, 1_050_000, &settings()).unwrap(),
            2_100_000_000
        );
    }

    #[test]
    fn test_permabuy_fee() {
        let fees = FeeTable::genesis();
        // 0.2 * 10 years = 2x the base fee
        assert_eq!(
            permabuy_fee("name", &fees, DF_ONE, &settings()).unwrap(),
            50_000_000_000
        );
        assert_eq!(
            permabuy_fee("name", &fees, 500_000, &settings()).unwrap(),
            25_000_000_000
        );
    }

    #[test]
    fn test_undername_cost() {
        let fees = FeeTable::genesis();
        // 1_000 tokens * 1.001 * 10 * 1
        assert_eq!(
            undername_cost(
                "a-long-enough-name",
                10,
                1,
                RegistrationType::Lease,
                &fees,
                DF_ONE,
                &settings()
            )
            .unwrap(),
            10_010_000_000
        );
        // 1_000 tokens * 1.005 * 1 * 1
        assert_eq!(
            undername_cost(
                "a-long-enough-name",
                1,
                1,
                RegistrationType::Permabuy,
                &fees,
                DF_ONE,
                &settings()
            )
            .unwrap(),
            1_005_000_000
        );
    }

    #[test]
    fn test_single_truncation() {
        let fees = FeeTable::from_entries((1..=32).map(|len| (len, 3))).unwrap();
        // 3 * 1.2 * 1.05 = 3.78, truncated once
        assert_eq!(lease_fee("abc", 1, &fees, 1_050_000, &settings()).unwrap(), 3);
        // 3 * 2 * 0.999999 = 5.999994
        assert_eq!(permabuy_fee("abc", &fees, 999_999, &settings()).unwrap(), 5);
    }

    #[test]
    fn test_annual_renewal_fee_ignores_demand_factor() {
        let fees = FeeTable::genesis();
        assert_eq!(
            annual_renewal_fee("a-long-enough-name", 2, &fees, &settings()).unwrap(),
            400_000_000
        );
    }

    #[test]
    fn test_registration_fee_dispatch() {
        let fees = FeeTable::genesis();
        let lease = registration_fee(RegistrationType::Lease, "name", 1, &fees, DF_ONE, &settings());
        let permabuy =
            registration_fee(RegistrationType::Permabuy, "name", 1, &fees, DF_ONE, &settings());
        assert_eq!(lease.unwrap(), 30_000_000_000);
        assert_eq!(permabuy.unwrap(), 50_000_000_000);
    }

    #[test]
    fn test_unknown_length_is_invalid_input() {
        let fees = FeeTable::genesis();
        let err = lease_fee(&"x".repeat(40), 1, &fees, DF_ONE, &settings()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }
}
