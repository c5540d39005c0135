//! Conversions between wei, gwei and ether amounts.

use crate::U256;

pub const WEI_PER_GWEI: u64 = 1_000_000_000;
const WEI_PER_MICRO_ETH: u64 = 1_000_000_000_000;

/// Converts a (possibly fractional) gwei amount into wei. Negative and non-finite inputs map to zero.
pub fn gwei_to_wei(gwei: f64) -> U256 {
    if !gwei.is_finite() || gwei <= 0.0 {
        return U256::zero();
    }
    U256::from((gwei * WEI_PER_GWEI as f64).round() as u128)
}

/// Converts wei into gwei for display purposes.
pub fn wei_to_gwei(wei: U256) -> f64 {
    let whole = wei / WEI_PER_GWEI;
    let fraction = wei % WEI_PER_GWEI;
    whole.low_u128() as f64 + fraction.low_u64() as f64 / WEI_PER_GWEI as f64
}

/// Formats a wei amount as ether, rounded down to 6 decimal places.
pub fn format_eth(wei: U256) -> String {
    let micro_eth = wei / WEI_PER_MICRO_ETH;
    let whole = micro_eth / 1_000_000;
    let fraction = (micro_eth % 1_000_000).low_u64();
    format!("{whole}.{fraction:06}")
}
