//! # Meta Pool Token Math
//!
//! mAPT units are shares of the LP Account's total value. Each pool's
//! balance is its claim on deployed capital.

use crate::constants::DEFAULT_MAPT_TO_UNDERLYER_FACTOR;
use crate::errors::{MaptError, MaptResult};
use crate::math::{mul_div, safe_mul_u128, value_of};

/// Value attributed to a holder of `balance` mAPT out of `total_supply`
pub fn deployed_value(tvl: u128, balance: u128, total_supply: u128) -> MaptResult<u128> {
    if total_supply == 0 {
        return Ok(0);
    }
    mul_div(tvl, balance, total_supply)
}

/// mAPT corresponding to moving `amount` of an underlyer at `price`
///
/// Uses the bootstrap rate while either TVL or supply is zero.
pub fn calculate_delta(amount: u128, price: u128, decimals: u8, tvl: u128, total_supply: u128) -> MaptResult<u128> {
    let value = value_of(amount, price, decimals)?;
    if tvl == 0 || total_supply == 0 {
        return safe_mul_u128(value, DEFAULT_MAPT_TO_UNDERLYER_FACTOR);
    }
    mul_div(total_supply, value, tvl)
}

/// Pool → LP Account amounts: magnitudes of negative top-ups
pub fn get_fund_amounts(top_ups: &[i128]) -> Vec<u128> {
    top_ups
        .iter()
        .map(|top_up| if *top_up < 0 { top_up.unsigned_abs() } else { 0 })
        .collect()
}

/// LP Account → pool amounts: positive top-ups capped at what the LP
/// Account holds
pub fn calculate_amounts_to_withdraw(top_ups: &[i128], available: &[u128]) -> MaptResult<Vec<u128>> {
    if top_ups.len() != available.len() {
        return Err(MaptError::lengths_must_match(top_ups.len(), available.len()));
    }
    Ok(top_ups
        .iter()
        .zip(available)
        .map(|(top_up, available)| {
            if *top_up > 0 {
                top_up.unsigned_abs().min(*available)
            } else {
                0
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_DOLLAR: u128 = 100_000_000;
    const DAI: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_deployed_value() {
        assert_eq!(deployed_value(1_000, 10, 0), Ok(0));
        assert_eq!(deployed_value(1_000, 25, 100), Ok(250));
        assert_eq!(deployed_value(1_000, 1, 3), Ok(333));
    }

    #[test]
    fn test_delta_bootstrap() {
        let expected = 300 * ONE_DOLLAR * DEFAULT_MAPT_TO_UNDERLYER_FACTOR;
        assert_eq!(calculate_delta(300 * DAI, ONE_DOLLAR, 18, 0, 0), Ok(expected));
        // zero TVL with outstanding supply still bootstraps
        assert_eq!(calculate_delta(300 * DAI, ONE_DOLLAR, 18, 0, 5), Ok(expected));
        // zero supply with a TVL still bootstraps
        assert_eq!(calculate_delta(300 * DAI, ONE_DOLLAR, 18, 7, 0), Ok(expected));
    }

    #[test]
    fn test_delta_proportional() {
        let supply = 1_000 * DAI;
        let tvl = 10_000 * ONE_DOLLAR;
        // 5% of TVL earns 5% of supply
        assert_eq!(
            calculate_delta(500 * 1_000_000, ONE_DOLLAR, 6, tvl, supply),
            Ok(50 * DAI)
        );
    }

    #[test]
    fn test_fund_amounts() {
        assert_eq!(get_fund_amounts(&[-5, 0, 7]), vec![5, 0, 0]);
    }

    #[test]
    fn test_amounts_to_withdraw() {
        assert_eq!(
            calculate_amounts_to_withdraw(&[100, 100, -5, 0], &[40, 150, 10, 10]),
            Ok(vec![40, 100, 0, 0])
        );
        assert_eq!(
            calculate_amounts_to_withdraw(&[1], &[]),
            Err(MaptError::LengthsMustMatch(1, 0))
        );
    }
}
