//! Pool entry points: valuation views, deposits, redemptions and
//! emergency controls.

use tracing::{debug, info};

use crate::errors::{MaptError, MaptResult};
use crate::events::ProtocolEvent;
use crate::mapt::deployed_value;
use crate::math::value_of;
use crate::pool::{bootstrap_mint_amount, quote_redeem, PoolSnapshot, RedeemQuote};
use crate::types::Address;

use super::Protocol;

impl Protocol {
    // ========================================================================
    // Valuation
    // ========================================================================

    pub fn get_underlyer_price(&self, pool: &Address) -> MaptResult<u128> {
        let underlyer = self.pool(pool)?.underlyer();
        self.get_asset_price(underlyer)
    }

    pub fn get_value_from_underlyer_amount(&self, pool: &Address, amount: u128) -> MaptResult<u128> {
        if amount == 0 {
            return Ok(0);
        }
        let underlyer = self.pool(pool)?.underlyer();
        let decimals = self.tokens.decimals(underlyer)?;
        value_of(amount, self.get_asset_price(underlyer)?, decimals)
    }

    /// Value of the pool's mAPT claim on the LP Account
    ///
    /// Zero without reading the oracle while no mAPT exists.
    pub fn get_deployed_value(&self, pool: &Address) -> MaptResult<u128> {
        let total_supply = self.mapt.total_supply();
        if total_supply == 0 {
            return Ok(0);
        }
        deployed_value(self.get_tvl()?, self.mapt.balance_of(pool), total_supply)
    }

    /// Price, balances and supply of `pool` at this instant
    pub fn pool_snapshot(&self, pool: &Address) -> MaptResult<PoolSnapshot> {
        let token = self.pool(pool)?;
        let underlyer = token.underlyer();
        Ok(PoolSnapshot {
            price: self.get_asset_price(underlyer)?,
            decimals: self.tokens.decimals(underlyer)?,
            idle_balance: self.tokens.balance_of(underlyer, pool)?,
            deployed_value: self.get_deployed_value(pool)?,
            share_supply: token.total_supply(),
        })
    }

    pub fn get_pool_total_value(&self, pool: &Address) -> MaptResult<u128> {
        self.pool_snapshot(pool)?.total_value()
    }

    /// USD value of `shares` pool tokens
    pub fn get_apt_value(&self, pool: &Address, shares: u128) -> MaptResult<u128> {
        if self.pool(pool)?.total_supply() == 0 {
            return Err(MaptError::InsufficientTotalSupply);
        }
        self.pool_snapshot(pool)?.share_value(shares)
    }

    /// Shares a deposit of `amount` would mint right now
    pub fn calculate_mint_amount(&self, pool: &Address, amount: u128) -> MaptResult<u128> {
        let token = self.pool(pool)?;
        if token.total_supply() == 0 {
            return bootstrap_mint_amount(amount, self.tokens.decimals(token.underlyer())?);
        }
        self.pool_snapshot(pool)?.calculate_mint_amount(amount)
    }

    /// Underlyer redeemable for `shares` before fees
    pub fn get_underlyer_amount(&self, pool: &Address, shares: u128) -> MaptResult<u128> {
        if shares == 0 {
            return Ok(0);
        }
        if self.pool(pool)?.total_supply() == 0 {
            return Err(MaptError::InsufficientTotalSupply);
        }
        self.pool_snapshot(pool)?.underlyer_amount(shares)
    }

    pub fn is_early_redeem(&self, pool: &Address, holder: &Address) -> MaptResult<bool> {
        Ok(self.pool(pool)?.is_early_redeem(holder, self.env.timestamp))
    }

    /// Fee breakdown for `holder` redeeming `shares` right now
    pub fn quote_redeem(&self, pool: &Address, holder: &Address, shares: u128) -> MaptResult<RedeemQuote> {
        let token = self.pool(pool)?;
        let params = *token.params();
        let early = token.is_early_redeem(holder, self.env.timestamp);
        let base_amount = self.get_underlyer_amount(pool, shares)?;
        quote_redeem(base_amount, params.withdraw_fee_bps, params.arbitrage_fee_bps, early)
    }

    /// Underlyer `holder` would receive for `shares` after fees
    pub fn get_underlyer_amount_with_fee(&self, pool: &Address, holder: &Address, shares: u128) -> MaptResult<u128> {
        Ok(self.quote_redeem(pool, holder, shares)?.net_amount)
    }

    /// Signed underlyer amount that restores the reserve target
    ///
    /// Positive: the pool needs a top-up from the LP Account. Negative: the
    /// pool holds a surplus for the LP Account.
    pub fn get_reserve_top_up_value(&self, pool: &Address) -> MaptResult<i128> {
        let reserve_percentage = self.pool(pool)?.params().reserve_percentage;
        let top_up = self.pool_snapshot(pool)?.reserve_top_up(reserve_percentage)?;
        debug!("Pool {} reserve top-up {}", pool, top_up);
        Ok(top_up)
    }

    // ========================================================================
    // Deposits and Redemptions
    // ========================================================================

    /// Deposit `amount` underlyer and mint pool shares to `caller`
    pub fn add_liquidity(&mut self, caller: &Address, pool: &Address, amount: u128) -> MaptResult<u128> {
        self.transact("addLiquidity", |p| {
            let token = p.pool(pool)?;
            token.ensure_can_add_liquidity()?;
            if amount == 0 {
                return Err(MaptError::AmountInsufficient);
            }
            let underlyer = token.underlyer().clone();
            if p.tokens.allowance(&underlyer, caller, pool)? < amount {
                return Err(MaptError::AllowanceInsufficient);
            }

            // valued before the deposit lands
            let minted = p.calculate_mint_amount(pool, amount)?;

            p.tokens.transfer_from(&underlyer, pool, caller, pool, amount)?;
            let now = p.env.timestamp;
            p.pool_mut(pool)?.record_deposit(caller, minted, now)?;

            let total_value = p.get_pool_total_value(pool)?;
            info!(
                "{} deposited {} {} into {} for {} shares",
                caller, amount, underlyer, pool, minted
            );
            p.emit(ProtocolEvent::DepositedApt {
                pool: pool.clone(),
                sender: caller.clone(),
                token: underlyer,
                token_amount: amount,
                apt_minted: minted,
                total_value,
            });
            Ok(minted)
        })
    }

    /// Burn `shares` and pay out the underlyer net of fees
    pub fn redeem(&mut self, caller: &Address, pool: &Address, shares: u128) -> MaptResult<u128> {
        self.transact("redeem", |p| {
            let token = p.pool(pool)?;
            token.ensure_can_redeem()?;
            if shares == 0 {
                return Err(MaptError::AmountInsufficient);
            }
            if token.balance_of(caller) < shares {
                return Err(MaptError::BalanceInsufficient);
            }
            let underlyer = token.underlyer().clone();

            let quote = p.quote_redeem(pool, caller, shares)?;
            let available = p.tokens.balance_of(&underlyer, pool)?;
            if quote.net_amount > available {
                return Err(MaptError::ReserveInsufficient {
                    requested: quote.net_amount,
                    available,
                });
            }
            debug!("Redeem quote for {}: {:?}", caller, quote);

            p.pool_mut(pool)?.burn_shares(caller, shares)?;
            p.tokens.transfer(&underlyer, pool, caller, quote.net_amount)?;

            let total_value = p.get_pool_total_value(pool)?;
            info!(
                "{} redeemed {} shares from {} for {} {}",
                caller, shares, pool, quote.net_amount, underlyer
            );
            p.emit(ProtocolEvent::RedeemedApt {
                pool: pool.clone(),
                sender: caller.clone(),
                token: underlyer,
                redeemed_token_amount: quote.net_amount,
                apt_redeemed: shares,
                total_value,
            });
            Ok(quote.net_amount)
        })
    }

    /// Move idle underlyer from `pool` to the LP Account (meta pool token only)
    pub fn transfer_to_lp_account(&mut self, caller: &Address, pool: &Address, amount: u128) -> MaptResult<()> {
        self.transact("transferToLpAccount", |p| {
            let token = p.pool(pool)?;
            token.authorize_transfer_to_lp_account(caller)?;
            let underlyer = token.underlyer().clone();
            let lp_account = p.lp_account.address().clone();
            p.tokens.transfer(&underlyer, pool, &lp_account, amount)?;
            p.emit(ProtocolEvent::FundedLpAccount {
                pool: pool.clone(),
                token: underlyer,
                amount,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Emergency Controls
    // ========================================================================

    pub fn emergency_lock_pool(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.transact("emergencyLock", |p| {
            p.pool_mut(pool)?.emergency_lock(caller)?;
            p.emit(ProtocolEvent::PoolPaused {
                pool: pool.clone(),
                paused: true,
            });
            Ok(())
        })
    }

    pub fn emergency_unlock_pool(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.transact("emergencyUnlock", |p| {
            p.pool_mut(pool)?.emergency_unlock(caller)?;
            p.emit(ProtocolEvent::PoolPaused {
                pool: pool.clone(),
                paused: false,
            });
            Ok(())
        })
    }

    pub fn lock_add_liquidity(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.set_add_liquidity_lock(caller, pool, true)
    }

    pub fn unlock_add_liquidity(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.set_add_liquidity_lock(caller, pool, false)
    }

    fn set_add_liquidity_lock(&mut self, caller: &Address, pool: &Address, locked: bool) -> MaptResult<()> {
        self.transact("addLiquidity lock", |p| {
            let token = p.pool_mut(pool)?;
            if locked {
                token.lock_add_liquidity(caller)?;
            } else {
                token.unlock_add_liquidity(caller)?;
            }
            p.emit(ProtocolEvent::AddLiquidityLocked {
                pool: pool.clone(),
                locked,
            });
            Ok(())
        })
    }

    pub fn lock_redeem(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.set_redeem_lock(caller, pool, true)
    }

    pub fn unlock_redeem(&mut self, caller: &Address, pool: &Address) -> MaptResult<()> {
        self.set_redeem_lock(caller, pool, false)
    }

    fn set_redeem_lock(&mut self, caller: &Address, pool: &Address, locked: bool) -> MaptResult<()> {
        self.transact("redeem lock", |p| {
            let token = p.pool_mut(pool)?;
            if locked {
                token.lock_redeem(caller)?;
            } else {
                token.unlock_redeem(caller)?;
            }
            p.emit(ProtocolEvent::RedeemLocked {
                pool: pool.clone(),
                locked,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn set_reserve_percentage(&mut self, caller: &Address, pool: &Address, reserve_percentage: u8) -> MaptResult<()> {
        self.transact("setReservePercentage", |p| {
            p.pool_mut(pool)?.set_reserve_percentage(caller, reserve_percentage)?;
            p.emit(ProtocolEvent::ReservePercentageChanged {
                pool: pool.clone(),
                reserve_percentage,
            });
            Ok(())
        })
    }

    pub fn set_withdraw_fee(&mut self, caller: &Address, pool: &Address, withdraw_fee_bps: u32) -> MaptResult<()> {
        self.transact("setWithdrawFee", |p| {
            p.pool_mut(pool)?.set_withdraw_fee(caller, withdraw_fee_bps)?;
            p.emit(ProtocolEvent::WithdrawFeeChanged {
                pool: pool.clone(),
                withdraw_fee_bps,
            });
            Ok(())
        })
    }

    pub fn set_arbitrage_fee(
        &mut self,
        caller: &Address,
        pool: &Address,
        arbitrage_fee_bps: u32,
        arbitrage_fee_period: i64,
    ) -> MaptResult<()> {
        self.transact("setArbitrageFee", |p| {
            p.pool_mut(pool)?
                .set_arbitrage_fee(caller, arbitrage_fee_bps, arbitrage_fee_period)?;
            p.emit(ProtocolEvent::ArbitrageFeeChanged {
                pool: pool.clone(),
                arbitrage_fee_bps,
                arbitrage_fee_period,
            });
            Ok(())
        })
    }
}
