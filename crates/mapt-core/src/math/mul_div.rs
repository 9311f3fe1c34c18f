//! Multiply-then-divide with a 256-bit intermediate.
//!
//! Share math multiplies two 128-bit quantities (supply times value) before
//! dividing, so the product is carried in `ethnum::U256`.

use ethnum::U256;

use crate::errors::{MaptError, MaptResult};

/// `a * b / denominator`, floored
pub fn mul_div(a: u128, b: u128, denominator: u128) -> MaptResult<u128> {
    if denominator == 0 {
        return Err(MaptError::DivisionByZero);
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(MaptError::MathOverflow);
    }
    Ok(quotient.as_u128())
}

/// Signed `a * b / denominator`, truncated toward zero
pub fn mul_div_signed(a: i128, b: u128, denominator: u128) -> MaptResult<i128> {
    let magnitude = mul_div(a.unsigned_abs(), b, denominator)?;
    if a < 0 {
        if magnitude == i128::MIN.unsigned_abs() {
            return Ok(i128::MIN);
        }
        let magnitude = i128::try_from(magnitude).map_err(|_| MaptError::MathOverflow)?;
        Ok(-magnitude)
    } else {
        i128::try_from(magnitude).map_err(|_| MaptError::MathOverflow)
    }
}
