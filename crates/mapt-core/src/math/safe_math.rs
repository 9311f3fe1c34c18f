//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for ledger amounts.

use crate::constants::{BPS_DENOMINATOR, MAX_TOKEN_DECIMALS};
use crate::errors::{MaptError, MaptResult};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation
        pub fn $fn_name(a: $type, b: $type) -> MaptResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, MaptError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, MaptError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, MaptError::MathOverflow);
safe_arith!(safe_sub_i128, i128, checked_sub, MaptError::MathUnderflow);

/// Power of ten for a token's decimals
pub fn pow10(decimals: u8) -> MaptResult<u128> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(MaptError::MathOverflow);
    }
    10u128
        .checked_pow(decimals as u32)
        .ok_or(MaptError::MathOverflow)
}

/// Portion of `amount` given by basis points (floors)
pub fn safe_calculate_bps(amount: u128, bps: u32) -> MaptResult<u128> {
    crate::math::mul_div::mul_div(amount, bps as u128, BPS_DENOMINATOR as u128)
}

/// Convert unsigned to signed, failing above `i128::MAX`
pub fn safe_cast_u128_to_i128(value: u128) -> MaptResult<i128> {
    i128::try_from(value).map_err(|_| MaptError::ConversionError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_ops() {
        assert_eq!(safe_add_u128(1, 2), Ok(3));
        assert_eq!(safe_add_u128(u128::MAX, 1), Err(MaptError::MathOverflow));
        assert_eq!(safe_sub_u128(1, 2), Err(MaptError::MathUnderflow));
        assert_eq!(safe_mul_u128(u128::MAX, 2), Err(MaptError::MathOverflow));
        assert_eq!(safe_sub_i128(-5, 10), Ok(-15));
        assert_eq!(safe_sub_i128(i128::MIN, 1), Err(MaptError::MathUnderflow));
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), Ok(1));
        assert_eq!(pow10(6), Ok(1_000_000));
        assert_eq!(pow10(18), Ok(1_000_000_000_000_000_000));
        assert_eq!(pow10(39), Err(MaptError::MathOverflow));
    }

    #[test]
    fn test_bps() {
        assert_eq!(safe_calculate_bps(1_000_000, 10), Ok(1_000));
        assert_eq!(safe_calculate_bps(1_000_000, 500), Ok(50_000));
        // floors
        assert_eq!(safe_calculate_bps(999, 10), Ok(0));
    }

    #[test]
    fn test_casts() {
        assert_eq!(safe_cast_u128_to_i128(5), Ok(5));
        assert_eq!(safe_cast_u128_to_i128(u128::MAX), Err(MaptError::ConversionError));
    }
}
