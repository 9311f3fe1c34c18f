//! # Valuation
//!
//! Conversions between underlyer amounts (native decimals) and USD values
//! (feed decimals). A price is the feed answer for one whole token.

use crate::errors::{MaptError, MaptResult};
use crate::math::mul_div::{mul_div, mul_div_signed};
use crate::math::safe_math::pow10;

/// Value of `amount` underlyer units at `price`: `amount * price / 10^decimals`
pub fn value_of(amount: u128, price: u128, decimals: u8) -> MaptResult<u128> {
    mul_div(amount, price, pow10(decimals)?)
}

/// Underlyer units worth `value` at `price`: `value * 10^decimals / price`
pub fn amount_from_value(value: u128, price: u128, decimals: u8) -> MaptResult<u128> {
    if price == 0 {
        return Err(MaptError::DivisionByZero);
    }
    mul_div(value, pow10(decimals)?, price)
}

/// Signed variant of [`amount_from_value`], truncating toward zero
pub fn signed_amount_from_value(value: i128, price: u128, decimals: u8) -> MaptResult<i128> {
    if price == 0 {
        return Err(MaptError::DivisionByZero);
    }
    mul_div_signed(value, pow10(decimals)?, price)
}

/// Rescale `amount` from `from_decimals` to `to_decimals` (floors when shrinking)
pub fn normalize_decimals(amount: u128, from_decimals: u8, to_decimals: u8) -> MaptResult<u128> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if from_decimals < to_decimals {
        let factor = pow10(to_decimals - from_decimals)?;
        amount.checked_mul(factor).ok_or(MaptError::MathOverflow)
    } else {
        Ok(amount / pow10(from_decimals - to_decimals)?)
    }
}
