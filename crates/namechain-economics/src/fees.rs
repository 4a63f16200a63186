//! Base fee table
//!
//! | Length | Genesis fee (tokens) |
//! |--------|----------------------|
//! | 1 | 5,000,000 |
//! | 2 | 500,000 |
//! | 3 | 100,000 |
//! | 4 | 25,000 |
//! | 5 | 10,000 |
//! | 6 | 5,000 |
//! | 7 | 2,500 |
//! | 8 | 1,500 |
//! | 9-12 | 1,250 |
//! | 13-32 | 1,000 |

use namechain_core::fixed::mul_ppm;
use namechain_core::{LedgerError, Result, MINOR_UNITS_PER_TOKEN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest registrable name
pub const MAX_NAME_LENGTH: usize = 32;

/// Length of a name as the fee table counts it
pub fn name_length(name: &str) -> usize {
    name.chars().count()
}

fn genesis_fee_tokens(length: usize) -> u64 {
    match length {
        1 => 5_000_000,
        2 => 500_000,
        3 => 100_000,
        4 => 25_000,
        5 => 10_000,
        6 => 5_000,
        7 => 2_500,
        8 => 1_500,
        9..=12 => 1_250,
        _ => 1_000,
    }
}

/// Base registration fee per name length, in minor units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTable {
    fees: BTreeMap<usize, u64>,
}

impl Default for FeeTable {
    fn default() -> Self {
        Self::genesis()
    }
}

impl FeeTable {
    /// Fee table at network launch
    pub fn genesis() -> Self {
        let fees = (1..=MAX_NAME_LENGTH)
            .map(|length| (length, genesis_fee_tokens(length) * MINOR_UNITS_PER_TOKEN))
            .collect();
        Self { fees }
    }

    /// Build a table from explicit entries; every length 1..=32 must be present
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, u64)>) -> Result<Self> {
        let fees: BTreeMap<usize, u64> = entries.into_iter().collect();
        let complete = fees.len() == MAX_NAME_LENGTH
            && fees.keys().copied().eq(1..=MAX_NAME_LENGTH);
        if !complete {
            return Err(LedgerError::InvalidInput(format!(
                "fee table must cover name lengths 1..={}",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self { fees })
    }

    /// Base fee for a name length
    pub fn fee_for_length(&self, length: usize) -> Result<u64> {
        self.fees.get(&length).copied().ok_or_else(|| {
            LedgerError::InvalidInput(format!("no base fee for name length {}", length))
        })
    }

    /// Base fee for a name
    pub fn base_fee(&self, name: &str) -> Result<u64> {
        self.fee_for_length(name_length(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.fees.iter().map(|(length, fee)| (*length, *fee))
    }

    /// Rebase every fee onto its value at the minimum demand factor:
    /// `new = max(old * min_ppm, floor)`
    pub fn rebase(&self, demand_factor_min_ppm: u64, fee_floor: u64) -> Result<Self> {
        let fees = self
            .fees
            .iter()
            .map(|(length, fee)| {
                mul_ppm(*fee, demand_factor_min_ppm).map(|rebased| (*length, rebased.max(fee_floor)))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { fees })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_covers_all_lengths() {
        let table = FeeTable::genesis();
        assert_eq!(table.iter().count(), MAX_NAME_LENGTH);
        assert_eq!(table.fee_for_length(1).unwrap(), 5_000_000_000_000);
        assert_eq!(table.fee_for_length(12).unwrap(), 1_250_000_000);
        assert_eq!(table.fee_for_length(32).unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_unknown_length_rejected() {
        let table = FeeTable::genesis();
        assert!(matches!(table.fee_for_length(0), Err(LedgerError::InvalidInput(_))));
        assert!(table.base_fee(&"a".repeat(33)).is_err());
        assert_eq!(table.base_fee("name").unwrap(), 25_000_000_000);
    }

    #[test]
    fn test_rebase_applies_minimum_and_floor() {
        let table = FeeTable::from_entries((1..=MAX_NAME_LENGTH).map(|len| {
            let fee = if len == 32 { 1_500_000 } else { 3_000_000 };
            (len, fee)
        }))
        .unwrap();

        let rebased = table.rebase(500_000, 1_000_000).unwrap();
        assert_eq!(rebased.fee_for_length(1).unwrap(), 1_500_000);
        // 750_000 is raised to the floor
        assert_eq!(rebased.fee_for_length(32).unwrap(), 1_000_000);
    }

    #[test]
    fn test_incomplete_table_rejected() {
        let err = FeeTable::from_entries([(1, 10), (2, 10)]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let table = FeeTable::genesis();
        let json = serde_json::to_string(&table).unwrap();
        let parsed: FeeTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }
}
