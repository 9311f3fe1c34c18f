use std::time::Duration;

use mapt_core::mapt::{calculate_amounts_to_withdraw, get_fund_amounts};
use mapt_core::math::{mul_div, pow10, safe_add_u128, safe_cast_u128_to_i128, safe_mul_u128, value_of};
use mapt_core::{Address, BlockNumber, MaptError, Protocol, BPS_DENOMINATOR};
use serde::Serialize;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};

/// What a keeper cycle did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CycleAction {
    /// Oracle still locked by an earlier rebalance
    Locked { lock_end: BlockNumber },
    /// Every pool within threshold of its reserve target
    Balanced,
    /// Reserve surplus sent to the LP Account
    Funded { pools: Vec<String>, amounts: Vec<u128> },
    /// Reserve shortfall pulled back from the LP Account
    Withdrawn { pools: Vec<String>, amounts: Vec<u128> },
}

impl CycleAction {
    pub fn moved_capital(&self) -> bool {
        matches!(self, CycleAction::Funded { .. } | CycleAction::Withdrawn { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub block_number: BlockNumber,
    /// TVL pushed to the oracle this cycle
    pub tvl: u128,
    pub dry_run: bool,
    pub action: CycleAction,
    /// Protocol events emitted since the previous cycle
    pub events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub id: String,
    pub idle_balance: u128,
    pub share_supply: u128,
    pub mapt_balance: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeeperSummary {
    pub cycles: u64,
    pub block_number: BlockNumber,
    pub mapt_supply: u128,
    pub oracle_locked: bool,
    pub pools: Vec<PoolSummary>,
}

/// Off-chain rebalancing service
///
/// Plays the external oracle network against a simulated protocol and
/// calls the LP-role rebalance entry points whenever a pool drifts from
/// its reserve target.
pub struct Keeper {
    config: KeeperConfig,
    protocol: Protocol,
    lp_safe: Address,
    pool_ids: Vec<String>,
    dry_run: bool,
    cycles: u64,
}

impl Keeper {
    /// Deploy the configured protocol and seed the initial deposits
    pub fn new(config: KeeperConfig, dry_run: bool) -> KeeperResult<Self> {
        config.validate()?;
        let protocol = Protocol::new(&config.protocol)?;
        let lp_safe = Address::from(config.protocol.lp_safe.as_str());
        let pool_ids = config.pool_ids();

        let mut keeper = Self {
            config,
            protocol,
            lp_safe,
            pool_ids,
            dry_run,
            cycles: 0,
        };
        keeper.seed_deposits()?;
        Ok(keeper)
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Direct access for admin actions outside the keeper's role
    pub fn protocol_mut(&mut self) -> &mut Protocol {
        &mut self.protocol
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn seed_deposits(&mut self) -> KeeperResult<()> {
        let deposits = self.config.deposits.clone();
        for deposit in deposits {
            let pool = self.protocol.resolve_pool(&deposit.pool)?;
            let underlyer = self.protocol.pool(&pool)?.underlyer().clone();
            let decimals = self.protocol.tokens().decimals(&underlyer)?;
            let amount = safe_mul_u128(u128::from(deposit.amount), pow10(decimals)?)?;
            let depositor = Address::from(deposit.depositor.as_str());

            self.protocol.mint_underlyer(&underlyer, &depositor, amount)?;
            self.protocol.approve(&underlyer, &depositor, &pool, amount)?;
            let shares = self.protocol.add_liquidity(&depositor, &pool, amount)?;
            info!(
                "Seeded {} {} from {} into {} for {} shares",
                deposit.amount, underlyer, depositor, pool, shares
            );
        }
        Ok(())
    }

    /// Push configured prices and report LP Account holdings as TVL
    pub fn sync_oracle(&mut self) -> KeeperResult<u128> {
        let lp_account = self.protocol.lp_account().address().clone();
        let mut tvl = 0u128;

        for token in &self.config.protocol.tokens {
            let asset = Address::from(token.symbol.as_str());
            let source = self
                .protocol
                .oracle()
                .asset_source(&asset)
                .cloned()
                .ok_or(MaptError::InvalidSource)?;
            let price = u128::try_from(token.price).map_err(|_| MaptError::NegativeValue)?;
            self.protocol.submit_feed(&source, i128::from(token.price))?;

            let balance = self.protocol.underlyer_balance(&asset, &lp_account)?;
            tvl = safe_add_u128(tvl, value_of(balance, price, token.decimals)?)?;
        }

        self.protocol.submit_tvl(safe_cast_u128_to_i128(tvl)?)?;
        debug!("Reported TVL {} at block {}", tvl, self.protocol.env().block_number);
        Ok(tvl)
    }

    /// Advance the chain one cycle, refresh the oracle and rebalance if due
    pub fn run_cycle(&mut self) -> KeeperResult<CycleReport> {
        self.cycles += 1;
        self.protocol.mine(self.config.blocks_per_cycle, self.config.seconds_per_block);
        let tvl = self.sync_oracle()?;

        let action = if self.protocol.is_oracle_locked() {
            let lock_end = self.protocol.oracle().lock_end();
            debug!("Oracle locked until block {}, skipping", lock_end);
            CycleAction::Locked { lock_end }
        } else {
            self.rebalance()?
        };

        let events = self.protocol.drain_events();
        for record in &events {
            debug!("Block {}: {:?}", record.block_number, record.event);
        }

        Ok(CycleReport {
            cycle: self.cycles,
            block_number: self.protocol.env().block_number,
            tvl,
            dry_run: self.dry_run,
            action,
            events: events.len(),
        })
    }

    fn rebalance(&mut self) -> KeeperResult<CycleAction> {
        let (pools, top_ups) = self.protocol.get_rebalance_amounts(&self.pool_ids)?;

        let mut withdraw = (Vec::new(), Vec::new());
        let mut fund = (Vec::new(), Vec::new());
        for ((id, pool), top_up) in self.pool_ids.iter().zip(&pools).zip(top_ups) {
            if !self.is_significant(pool, top_up)? {
                continue;
            }
            let side = if top_up > 0 { &mut withdraw } else { &mut fund };
            side.0.push(id.clone());
            side.1.push(top_up);
        }

        // funding locks the oracle, so it waits until reserves are restored
        if !withdraw.0.is_empty() {
            let (ids, top_ups) = withdraw;
            let amounts = if self.dry_run {
                let available = self.protocol.get_lp_account_balances(&ids)?;
                let planned = calculate_amounts_to_withdraw(&top_ups, &available)?;
                info!("DRY RUN: Would withdraw {:?} to {:?}", planned, ids);
                planned
            } else {
                let withdrawn = self.protocol.withdraw_from_lp_account(&self.lp_safe, &ids)?;
                info!("Withdrew {:?} from LP Account to {:?}", withdrawn, ids);
                withdrawn
            };
            return Ok(CycleAction::Withdrawn { pools: ids, amounts });
        }

        if !fund.0.is_empty() {
            let (ids, top_ups) = fund;
            let amounts = if self.dry_run {
                let planned = get_fund_amounts(&top_ups);
                info!("DRY RUN: Would fund LP Account with {:?} from {:?}", planned, ids);
                planned
            } else {
                let funded = self.protocol.fund_lp_account(&self.lp_safe, &ids)?;
                info!("Funded LP Account with {:?} from {:?}", funded, ids);
                funded
            };
            return Ok(CycleAction::Funded { pools: ids, amounts });
        }

        Ok(CycleAction::Balanced)
    }

    /// Whether a top-up is large enough relative to the pool to act on
    fn is_significant(&self, pool: &Address, top_up: i128) -> KeeperResult<bool> {
        if top_up == 0 {
            return Ok(false);
        }
        let total_value = self.protocol.get_pool_total_value(pool)?;
        let moved_value = self
            .protocol
            .get_value_from_underlyer_amount(pool, top_up.unsigned_abs())?;
        let change_bps = calculate_change_bps(moved_value, total_value)?;

        let significant = change_bps >= u128::from(self.config.rebalance_threshold_bps);
        if !significant {
            debug!("Pool {} off target by {}bps, below threshold", pool, change_bps);
        }
        Ok(significant)
    }

    /// Run cycles on a fixed interval, forever or for `iterations` cycles
    ///
    /// Returns how many cycles moved capital.
    pub async fn run(&mut self, iterations: Option<u64>, period: Duration) -> KeeperResult<u64> {
        let mut interval_timer = time::interval(period);
        let mut rebalances = 0u64;

        while iterations.map_or(true, |limit| self.cycles < limit) {
            interval_timer.tick().await;

            match self.run_cycle() {
                Ok(report) => {
                    if report.action.moved_capital() {
                        rebalances += 1;
                        info!("Cycle {}: {:?}", report.cycle, report.action);
                    } else {
                        debug!("Cycle {}: {:?}", report.cycle, report.action);
                    }
                }
                Err(e) => {
                    error!("Error in keeper cycle {}: {}", self.cycles, e);
                    // Continue running even if individual cycles fail
                }
            }

            if self.cycles % 100 == 0 {
                info!("Keeper health check - cycle {}", self.cycles);
                if let Err(e) = self.health_check() {
                    warn!("Health check warning: {}", e);
                }
            }
        }

        Ok(rebalances)
    }

    /// Ledger invariants hold and the oracle answers when unlocked
    pub fn health_check(&self) -> KeeperResult<()> {
        self.protocol
            .check_invariants()
            .map_err(|e| KeeperError::Unhealthy(e.to_string()))?;

        if !self.protocol.is_oracle_locked() {
            let tvl = self
                .protocol
                .get_tvl()
                .map_err(|e| KeeperError::Unhealthy(format!("TVL unreadable: {}", e)))?;
            debug!("Health check passed - TVL: {}", tvl);
        }
        Ok(())
    }

    pub fn summary(&self) -> KeeperResult<KeeperSummary> {
        let pools = self
            .pool_ids
            .iter()
            .map(|id| {
                let address = self.protocol.resolve_pool(id)?;
                let pool = self.protocol.pool(&address)?;
                Ok(PoolSummary {
                    id: id.clone(),
                    idle_balance: self.protocol.underlyer_balance(pool.underlyer(), &address)?,
                    share_supply: pool.total_supply(),
                    mapt_balance: self.protocol.mapt().balance_of(&address),
                })
            })
            .collect::<KeeperResult<Vec<_>>>()?;

        Ok(KeeperSummary {
            cycles: self.cycles,
            block_number: self.protocol.env().block_number,
            mapt_supply: self.protocol.mapt().total_supply(),
            oracle_locked: self.protocol.is_oracle_locked(),
            pools,
        })
    }

    pub fn summary_json(&self) -> KeeperResult<String> {
        Ok(serde_json::to_string_pretty(&self.summary()?)?)
    }
}

/// Share of `whole` that `part` represents, in basis points
fn calculate_change_bps(part: u128, whole: u128) -> KeeperResult<u128> {
    if whole == 0 {
        return Ok(if part == 0 { 0 } else { u128::from(BPS_DENOMINATOR) });
    }
    Ok(mul_div(part, u128::from(BPS_DENOMINATOR), whole)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepositConfig;

    const DAI_UNIT: u128 = 1_000_000_000_000_000_000;

    fn config_with_dai(amount: u64) -> KeeperConfig {
        KeeperConfig {
            deposits: vec![DepositConfig {
                depositor: "alice".to_string(),
                pool: "daiPool".to_string(),
                amount,
            }],
            ..KeeperConfig::default()
        }
    }

    #[test]
    fn test_change_bps() {
        assert_eq!(calculate_change_bps(0, 0).unwrap(), 0);
        assert_eq!(calculate_change_bps(5, 0).unwrap(), 10_000);
        assert_eq!(calculate_change_bps(950, 1_000).unwrap(), 9_500);
    }

    #[test]
    fn test_seeded_deposits() {
        let keeper = Keeper::new(config_with_dai(1_000), false).unwrap();
        let dai_pool = Address::from("daiPool");
        let pool = keeper.protocol().pool(&dai_pool).unwrap();
        assert_eq!(pool.balance_of(&Address::from("alice")), 1_000 * DAI_UNIT * 1_000);
        assert_eq!(
            keeper.protocol().underlyer_balance(&Address::from("DAI"), &dai_pool),
            Ok(1_000 * DAI_UNIT)
        );
    }

    #[test]
    fn test_dry_run_plans_without_moving() {
        let mut keeper = Keeper::new(config_with_dai(1_000), true).unwrap();
        let report = keeper.run_cycle().unwrap();
        assert_eq!(
            report.action,
            CycleAction::Funded {
                pools: vec!["daiPool".to_string()],
                amounts: vec![950 * DAI_UNIT],
            }
        );
        assert!(report.dry_run);
        assert_eq!(keeper.protocol().mapt().total_supply(), 0);
        assert!(!keeper.protocol().is_oracle_locked());
    }

    #[test]
    fn test_threshold_suppresses_rebalance() {
        let mut config = config_with_dai(1_000);
        config.rebalance_threshold_bps = 10_000;
        let mut keeper = Keeper::new(config, false).unwrap();
        assert_eq!(keeper.run_cycle().unwrap().action, CycleAction::Balanced);
    }

    #[tokio::test]
    async fn test_keeper_cycles_end_to_end() {
        let mut keeper = Keeper::new(config_with_dai(1_000), false).unwrap();
        let dai = Address::from("DAI");
        let dai_pool = Address::from("daiPool");
        let lp_account = keeper.protocol().lp_account().address().clone();

        // first cycle sends the surplus above the 5% reserve
        let rebalances = keeper.run(Some(1), Duration::from_millis(1)).await.unwrap();
        assert_eq!(rebalances, 1);
        assert_eq!(keeper.protocol().underlyer_balance(&dai, &lp_account), Ok(950 * DAI_UNIT));
        assert!(keeper.protocol().is_oracle_locked());

        // 135-block lock outlasts two 45-block cycles
        for _ in 0..2 {
            assert!(matches!(keeper.run_cycle().unwrap().action, CycleAction::Locked { .. }));
        }
        let report = keeper.run_cycle().unwrap();
        assert_eq!(report.action, CycleAction::Balanced);
        assert_eq!(report.tvl, 950 * 100_000_000);

        let admin = Address::from("adminSafe");
        keeper
            .protocol_mut()
            .set_reserve_percentage(&admin, &dai_pool, 10)
            .unwrap();
        assert_eq!(
            keeper.run_cycle().unwrap().action,
            CycleAction::Withdrawn {
                pools: vec!["daiPool".to_string()],
                amounts: vec![50 * DAI_UNIT],
            }
        );
        assert_eq!(
            keeper.protocol().underlyer_balance(&dai, &dai_pool),
            Ok(100 * DAI_UNIT)
        );

        assert!(keeper.health_check().is_ok());
        let summary = keeper.summary().unwrap();
        assert_eq!(summary.cycles, 5);
        assert_eq!(summary.pools[0].idle_balance, 100 * DAI_UNIT);
        assert!(keeper.summary_json().unwrap().contains("\"daiPool\""));
    }

    #[test]
    fn test_event_log_drained_every_cycle() {
        let mut keeper = Keeper::new(config_with_dai(1_000), false).unwrap();
        let admin = Address::from("adminSafe");
        let dai_pool = Address::from("daiPool");

        let mut reserve = 5;
        let mut moves = 0;
        let mut drained = 0;
        for _ in 0..60 {
            if !keeper.protocol().is_oracle_locked() {
                reserve = if reserve == 5 { 10 } else { 5 };
                keeper
                    .protocol_mut()
                    .set_reserve_percentage(&admin, &dai_pool, reserve)
                    .unwrap();
            }
            let report = keeper.run_cycle().unwrap();
            if report.action.moved_capital() {
                moves += 1;
            }
            drained += report.events;
            assert!(keeper.protocol().events().is_empty());
        }

        assert!(moves > 10);
        assert!(drained > moves);
    }
}
