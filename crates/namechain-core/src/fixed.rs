//! Integer fixed-point arithmetic
//!
//! Ratios are carried as parts-per-million (`PPM` = 1.0). Every product or
//! quotient truncates toward zero. All operands are non-negative, so
//! truncation is floor. Replicas must never see a float in a consensus path.

use crate::error::{LedgerError, Result};

/// One whole unit expressed in parts-per-million
pub const PPM: u64 = 1_000_000;

/// `a * b / d`, truncated, with a u128 intermediate
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(LedgerError::InconsistentState("division by zero".into()));
    }
    a.checked_mul(b)
        .map(|product| product / d)
        .ok_or_else(|| LedgerError::overflow("mul_div"))
}

/// `value * ratio_ppm / PPM`, truncated
pub fn mul_ppm(value: u64, ratio_ppm: u64) -> Result<u64> {
    let scaled = mul_div(value as u128, ratio_ppm as u128, PPM as u128)?;
    u64::try_from(scaled).map_err(|_| LedgerError::overflow("mul_ppm"))
}

/// `value * ratio_ppm / PPM`, truncated and capped at `u64::MAX`
pub fn saturating_mul_ppm(value: u64, ratio_ppm: u64) -> u64 {
    let scaled = value as u128 * ratio_ppm as u128 / PPM as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Narrow a u128 result back to a u64 amount
pub fn to_u64(value: u128, context: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| LedgerError::overflow(context))
}

/// Render a ppm ratio as a decimal string for logs, e.g. `1.050000`
pub fn format_ppm(ratio_ppm: u64) -> String {
    format!("{}.{:06}", ratio_ppm / PPM, ratio_ppm % PPM)
}
