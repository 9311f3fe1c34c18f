//! # Protocol
//!
//! In-process ledger hosting every component: the oracle adapter, the
//! pools, the meta pool token, the LP Account, the underlyer tokens and the
//! registries. Operations take the caller's address explicitly and are
//! checked against each component's policy table.
//!
//! Every state-changing operation runs inside [`Protocol::transact`]. On
//! error the whole protocol is restored to the state it had before the
//! operation started and events emitted since are dropped, so batch
//! operations are all-or-nothing.

mod config;
mod oracle_ops;
mod pool_ops;
mod rebalance;

pub use config::{PoolConfig, ProtocolConfig, TokenConfig};

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::access::{AccessControl, Role};
use crate::allocation::Erc20Allocation;
use crate::constants::{
    ADMIN_SAFE_ID, EMERGENCY_SAFE_ID, LP_ACCOUNT_ID, LP_SAFE_ID, MAPT_ID, ORACLE_ADAPTER_ID, TVL_MANAGER_ID,
};
use crate::errors::{MaptError, MaptResult};
use crate::events::{EventRecord, ProtocolEvent};
use crate::ledger::TokenLedger;
use crate::lp_account::LpAccount;
use crate::mapt::MetaPoolToken;
use crate::oracle::{FeedNetwork, OracleAdapter};
use crate::pool::PoolToken;
use crate::registry::{AddressLookup, AddressRegistry};
use crate::types::{Address, BlockEnv, Timestamp};

/// Address of the TVL aggregator
pub const TVL_FEED_SOURCE: &str = "tvl-usd-agg";

#[derive(Debug, Clone)]
pub struct Protocol {
    env: BlockEnv,
    feeds: FeedNetwork,
    tokens: TokenLedger,
    registry: AddressRegistry,
    oracle: OracleAdapter,
    pools: BTreeMap<Address, PoolToken>,
    mapt: MetaPoolToken,
    lp_account: LpAccount,
    allocation: Erc20Allocation,
    events: Vec<EventRecord>,
}

impl Protocol {
    /// Deploy every component described by `config`
    pub fn new(config: &ProtocolConfig) -> MaptResult<Self> {
        Self::with_env(config, BlockEnv::default())
    }

    pub fn with_env(config: &ProtocolConfig, env: BlockEnv) -> MaptResult<Self> {
        config.validate()?;

        let admin_safe = Address::new(config.admin_safe.as_str());
        let emergency_safe = Address::new(config.emergency_safe.as_str());
        let lp_safe = Address::new(config.lp_safe.as_str());
        let mapt_address = Address::from(MAPT_ID);
        let lp_account_address = Address::from(LP_ACCOUNT_ID);
        let tvl_manager = Address::from(TVL_MANAGER_ID);

        let mut registry = AddressRegistry::new();
        registry.register(MAPT_ID, mapt_address.clone())?;
        registry.register(LP_ACCOUNT_ID, lp_account_address.clone())?;
        registry.register(ORACLE_ADAPTER_ID, Address::from(ORACLE_ADAPTER_ID))?;
        registry.register(TVL_MANAGER_ID, tvl_manager.clone())?;
        registry.register(ADMIN_SAFE_ID, admin_safe.clone())?;
        registry.register(EMERGENCY_SAFE_ID, emergency_safe.clone())?;
        registry.register(LP_SAFE_ID, lp_safe.clone())?;

        // Every component shares the operator safes; contract callers differ
        let operators = |contracts: &[&Address]| {
            let mut access = AccessControl::new();
            access.grant_role(Role::Admin, admin_safe.clone());
            access.grant_role(Role::Emergency, emergency_safe.clone());
            for contract in contracts {
                access.grant_role(Role::Contract, (*contract).clone());
            }
            access
        };

        let mut feeds = FeedNetwork::new();
        let mut tokens = TokenLedger::new();
        feeds.deploy(Address::from(TVL_FEED_SOURCE), 0, env.timestamp)?;
        for token in &config.tokens {
            let address = Address::new(token.symbol.as_str());
            tokens.register(address, token.symbol.as_str(), token.decimals)?;
            feeds.deploy(Address::new(token.feed_source()), token.price as i128, env.timestamp)?;
        }

        let mut oracle = OracleAdapter::new(
            operators(&[&mapt_address, &tvl_manager]),
            &feeds,
            Address::from(TVL_FEED_SOURCE),
            config.stale_period,
            config.default_lock_period,
        )?;
        let assets: Vec<Address> = config.tokens.iter().map(|t| Address::new(t.symbol.as_str())).collect();
        let sources: Vec<Address> = config.tokens.iter().map(|t| Address::new(t.feed_source())).collect();
        oracle.set_asset_sources(&emergency_safe, &feeds, &assets, &sources)?;

        let mut pools = BTreeMap::new();
        for pool_config in &config.pools {
            let address = Address::new(pool_config.id.as_str());
            let pool = PoolToken::new(
                address.clone(),
                Address::new(pool_config.underlyer.as_str()),
                operators(&[&mapt_address]),
                pool_config.params(),
            )?;
            registry.register(pool_config.id.as_str(), address.clone())?;
            pools.insert(address, pool);
        }

        let mut mapt_access = operators(&[]);
        mapt_access.grant_role(Role::Lp, lp_safe);
        let mapt = MetaPoolToken::new(mapt_address.clone(), mapt_access);
        let lp_account = LpAccount::new(lp_account_address, operators(&[&mapt_address]));
        let allocation = Erc20Allocation::new(operators(&[&mapt_address]));

        info!(
            "Protocol deployed with {} tokens and {} pools at block {}",
            config.tokens.len(),
            config.pools.len(),
            env.block_number
        );

        Ok(Self {
            env,
            feeds,
            tokens,
            registry,
            oracle,
            pools,
            mapt,
            lp_account,
            allocation,
            events: Vec::new(),
        })
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run `operation` atomically
    ///
    /// The checkpoint leaves the event log out. On rollback the log is cut
    /// back to its length before the operation.
    pub fn transact<T>(&mut self, label: &str, operation: impl FnOnce(&mut Self) -> MaptResult<T>) -> MaptResult<T> {
        let events = std::mem::take(&mut self.events);
        let mark = events.len();
        let checkpoint = self.clone();
        self.events = events;

        match operation(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!("{} reverted: {}", label, err);
                let mut events = std::mem::take(&mut self.events);
                events.truncate(mark);
                *self = checkpoint;
                self.events = events;
                Err(err)
            }
        }
    }

    fn emit(&mut self, event: ProtocolEvent) {
        debug!("Event at block {}: {:?}", self.env.block_number, event);
        self.events.push(EventRecord {
            block_number: self.env.block_number,
            timestamp: self.env.timestamp,
            event,
        });
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Remove and return the event log
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Clock
    // ========================================================================

    pub fn env(&self) -> &BlockEnv {
        &self.env
    }

    pub fn now(&self) -> Timestamp {
        self.env.timestamp
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.env.advance_blocks(blocks);
    }

    pub fn advance_time(&mut self, seconds: i64) {
        self.env.advance_time(seconds);
    }

    pub fn mine(&mut self, blocks: u64, seconds_per_block: i64) {
        self.env.mine(blocks, seconds_per_block);
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    pub fn oracle(&self) -> &OracleAdapter {
        &self.oracle
    }

    pub fn feeds(&self) -> &FeedNetwork {
        &self.feeds
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn mapt(&self) -> &MetaPoolToken {
        &self.mapt
    }

    pub fn lp_account(&self) -> &LpAccount {
        &self.lp_account
    }

    pub fn allocation(&self) -> &Erc20Allocation {
        &self.allocation
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolToken> {
        self.pools.values()
    }

    pub fn pool(&self, pool: &Address) -> MaptResult<&PoolToken> {
        self.pools
            .get(pool)
            .ok_or_else(|| MaptError::UnknownPool(pool.clone()))
    }

    fn pool_mut(&mut self, pool: &Address) -> MaptResult<&mut PoolToken> {
        self.pools
            .get_mut(pool)
            .ok_or_else(|| MaptError::UnknownPool(pool.clone()))
    }

    /// Resolve a registry id to a deployed pool
    pub fn resolve_pool(&self, id: &str) -> MaptResult<Address> {
        let address = self.registry.get_address(id)?;
        self.pool(&address)?;
        Ok(address)
    }

    /// Registry lookup for a well-known identifier
    pub fn address_of(&self, id: &str) -> MaptResult<Address> {
        self.registry.get_address(id)
    }

    // ========================================================================
    // External Environment
    // ========================================================================

    /// Publish a new answer on an aggregator, timestamped now
    pub fn submit_feed(&mut self, source: &Address, answer: i128) -> MaptResult<()> {
        let now = self.env.timestamp;
        self.feeds.submit(source, answer, now)
    }

    /// Publish the TVL aggregator's answer
    pub fn submit_tvl(&mut self, answer: i128) -> MaptResult<()> {
        self.submit_feed(&Address::from(TVL_FEED_SOURCE), answer)
    }

    /// Publish a price on the aggregator currently backing `asset`
    pub fn submit_asset_price(&mut self, asset: &Address, answer: i128) -> MaptResult<()> {
        let source = self
            .oracle
            .asset_source(asset)
            .cloned()
            .ok_or(MaptError::MissingAssetValue)?;
        self.submit_feed(&source, answer)
    }

    /// Deploy an additional aggregator (for source migrations)
    pub fn deploy_feed(&mut self, source: Address, answer: i128) -> MaptResult<()> {
        let now = self.env.timestamp;
        self.feeds.deploy(source, answer, now)
    }

    /// Credit underlyer to an account
    pub fn mint_underlyer(&mut self, token: &Address, to: &Address, amount: u128) -> MaptResult<()> {
        self.tokens.mint(token, to, amount)
    }

    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: u128) -> MaptResult<()> {
        self.tokens.approve(token, owner, spender, amount)
    }

    pub fn underlyer_balance(&self, token: &Address, holder: &Address) -> MaptResult<u128> {
        self.tokens.balance_of(token, holder)
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Ledger invariants: balances sum to supply for mAPT and every pool
    pub fn check_invariants(&self) -> MaptResult<()> {
        if !self.mapt.shares().is_consistent() {
            return Err(MaptError::InvalidParameter("mAPT balances do not sum to supply".to_string()));
        }
        let holder_sum = self
            .pools
            .keys()
            .try_fold(0u128, |sum, pool| sum.checked_add(self.mapt.balance_of(pool)))
            .ok_or(MaptError::MathOverflow)?;
        if holder_sum != self.mapt.total_supply() {
            return Err(MaptError::InvalidParameter("mAPT held outside pools".to_string()));
        }
        for pool in self.pools.values() {
            if !pool.shares().is_consistent() {
                return Err(MaptError::InvalidParameter(format!(
                    "pool {} balances do not sum to supply",
                    pool.address()
                )));
            }
        }
        Ok(())
    }
}
