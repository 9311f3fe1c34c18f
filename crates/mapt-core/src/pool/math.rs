//! # Pool Share Math
//!
//! Pure conversions between underlyer amounts, USD values and pool shares,
//! evaluated against a [`PoolSnapshot`] taken before any state changes.
//!
//! All results floor, so rounding favors existing holders.

use crate::constants::{BPS_DENOMINATOR, DEFAULT_APT_TO_UNDERLYER_FACTOR, PERCENT_DENOMINATOR, SHARE_DECIMALS};
use crate::errors::{MaptError, MaptResult};
use crate::math::{
    amount_from_value, mul_div, normalize_decimals, safe_add_u128, safe_calculate_bps, safe_cast_u128_to_i128,
    safe_mul_u128, safe_sub_i128, safe_sub_u128, signed_amount_from_value, value_of,
};

/// Pool state as seen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSnapshot {
    /// Underlyer USD price, feed units per whole token
    pub price: u128,
    /// Underlyer decimals
    pub decimals: u8,
    /// Underlyer held by the pool
    pub idle_balance: u128,
    /// Value of the pool's claim on the LP Account
    pub deployed_value: u128,
    /// Outstanding pool shares
    pub share_supply: u128,
}

impl PoolSnapshot {
    pub fn value_of(&self, amount: u128) -> MaptResult<u128> {
        value_of(amount, self.price, self.decimals)
    }

    pub fn idle_value(&self) -> MaptResult<u128> {
        self.value_of(self.idle_balance)
    }

    /// Idle value plus deployed value
    pub fn total_value(&self) -> MaptResult<u128> {
        safe_add_u128(self.idle_value()?, self.deployed_value)
    }

    /// Shares minted for a deposit of `amount`, valued before the deposit lands
    pub fn calculate_mint_amount(&self, amount: u128) -> MaptResult<u128> {
        let total_value = self.total_value()?;
        if self.share_supply == 0 || total_value == 0 {
            return bootstrap_mint_amount(amount, self.decimals);
        }
        let deposit_value = self.value_of(amount)?;
        mul_div(self.share_supply, deposit_value, total_value)
    }

    /// USD value of `shares`
    pub fn share_value(&self, shares: u128) -> MaptResult<u128> {
        if self.share_supply == 0 {
            return Err(MaptError::InsufficientTotalSupply);
        }
        mul_div(self.total_value()?, shares, self.share_supply)
    }

    /// Underlyer amount redeemable for `shares` before fees
    pub fn underlyer_amount(&self, shares: u128) -> MaptResult<u128> {
        if shares == 0 {
            return Ok(0);
        }
        let value = self.share_value(shares)?;
        amount_from_value(value, self.price, self.decimals)
    }

    /// Signed underlyer amount that moves idle value to `reserve_percentage`
    /// of total value
    ///
    /// Positive: the pool is below target and needs a top-up from the LP
    /// Account. Negative: the pool holds a surplus to deploy.
    pub fn reserve_top_up(&self, reserve_percentage: u8) -> MaptResult<i128> {
        let total_value = self.total_value()?;
        if total_value == 0 {
            return Ok(0);
        }
        let target = mul_div(total_value, reserve_percentage as u128, PERCENT_DENOMINATOR as u128)?;
        let top_up_value = safe_sub_i128(
            safe_cast_u128_to_i128(target)?,
            safe_cast_u128_to_i128(self.idle_value()?)?,
        )?;
        signed_amount_from_value(top_up_value, self.price, self.decimals)
    }
}

/// Bootstrap exchange rate, independent of pool balances and price
pub fn bootstrap_mint_amount(amount: u128, decimals: u8) -> MaptResult<u128> {
    let normalized = normalize_decimals(amount, decimals, SHARE_DECIMALS)?;
    safe_mul_u128(normalized, DEFAULT_APT_TO_UNDERLYER_FACTOR)
}

/// Breakdown of a redemption payout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct RedeemQuote {
    pub base_amount: u128,
    pub withdraw_fee: u128,
    pub arbitrage_fee: u128,
    pub net_amount: u128,
}

/// Deduct fees from `base_amount`; both fees use the same base
pub fn quote_redeem(
    base_amount: u128,
    withdraw_fee_bps: u32,
    arbitrage_fee_bps: u32,
    early: bool,
) -> MaptResult<RedeemQuote> {
    if withdraw_fee_bps > BPS_DENOMINATOR || arbitrage_fee_bps > BPS_DENOMINATOR {
        return Err(MaptError::InvalidParameter("fee above 100%".to_string()));
    }
    let withdraw_fee = safe_calculate_bps(base_amount, withdraw_fee_bps)?;
    let arbitrage_fee = if early {
        safe_calculate_bps(base_amount, arbitrage_fee_bps)?
    } else {
        0
    };
    let net_amount = base_amount
        .checked_sub(withdraw_fee)
        .and_then(|rest| rest.checked_sub(arbitrage_fee))
        .unwrap_or(0);
    Ok(RedeemQuote {
        base_amount,
        withdraw_fee,
        arbitrage_fee,
        net_amount,
    })
}

/// Idle value after `top_up` underlyer moves into (positive) or out of
/// (negative) the pool
pub fn reserve_after_top_up(snapshot: &PoolSnapshot, top_up: i128) -> MaptResult<u128> {
    let idle_balance = if top_up >= 0 {
        safe_add_u128(snapshot.idle_balance, top_up.unsigned_abs())?
    } else {
        safe_sub_u128(snapshot.idle_balance, top_up.unsigned_abs())?
    };
    value_of(idle_balance, snapshot.price, snapshot.decimals)
}
