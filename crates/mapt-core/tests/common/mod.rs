//! Shared fixtures for integration tests

#![allow(dead_code)]

use mapt_core::math::value_of;
use mapt_core::{Address, MaptResult, Protocol, ProtocolConfig, MAPT_ID, TVL_MANAGER_ID};

pub const ONE_DOLLAR: i128 = 100_000_000;
pub const DAI_UNIT: u128 = 1_000_000_000_000_000_000;
pub const USDC_UNIT: u128 = 1_000_000;
pub const SECONDS_PER_BLOCK: i64 = 13;

pub struct Actors {
    pub admin: Address,
    pub emergency: Address,
    pub lp: Address,
    pub mapt: Address,
    pub tvl_manager: Address,
    pub alice: Address,
    pub bob: Address,
}

pub struct TestContext {
    pub protocol: Protocol,
    pub actors: Actors,
    pub dai: Address,
    pub usdc: Address,
    pub dai_pool: Address,
    pub usdc_pool: Address,
}

pub fn setup() -> TestContext {
    let config = ProtocolConfig::default();
    let protocol = Protocol::new(&config).expect("default config deploys");
    TestContext {
        protocol,
        actors: Actors {
            admin: Address::from(config.admin_safe.as_str()),
            emergency: Address::from(config.emergency_safe.as_str()),
            lp: Address::from(config.lp_safe.as_str()),
            mapt: Address::from(MAPT_ID),
            tvl_manager: Address::from(TVL_MANAGER_ID),
            alice: Address::from("alice"),
            bob: Address::from("bob"),
        },
        dai: Address::from("DAI"),
        usdc: Address::from("USDC"),
        dai_pool: Address::from("daiPool"),
        usdc_pool: Address::from("usdcPool"),
    }
}

impl TestContext {
    /// Faucet, approve and deposit in one step
    pub fn deposit(&mut self, user: &Address, pool: &Address, amount: u128) -> MaptResult<u128> {
        let token = self.protocol.pool(pool)?.underlyer().clone();
        self.protocol.mint_underlyer(&token, user, amount)?;
        self.protocol.approve(&token, user, pool, amount)?;
        self.protocol.add_liquidity(user, pool, amount)
    }

    /// Mine past the oracle lock
    pub fn mine_past_lock(&mut self) {
        let lock_end = self.protocol.oracle().lock_end();
        let block = self.protocol.env().block_number;
        if block < lock_end {
            self.protocol.mine(lock_end - block, SECONDS_PER_BLOCK);
        }
    }

    /// Report LP Account holdings as TVL and refresh every asset price
    pub fn sync_tvl(&mut self) {
        let lp_account = self.protocol.lp_account().address().clone();
        let mut tvl = 0u128;
        let tokens: Vec<Address> = self.protocol.tokens().tokens().cloned().collect();
        for token in tokens {
            let source = self.protocol.oracle().asset_source(&token).cloned().unwrap();
            let price = self.protocol.feeds().latest(&source).unwrap().answer;
            self.protocol.submit_feed(&source, price).unwrap();
            let balance = self.protocol.underlyer_balance(&token, &lp_account).unwrap();
            let decimals = self.protocol.tokens().decimals(&token).unwrap();
            tvl += value_of(balance, price as u128, decimals).unwrap();
        }
        self.protocol.submit_tvl(tvl as i128).unwrap();
    }

    pub fn lp_balance(&self, token: &Address) -> u128 {
        let lp_account = self.protocol.lp_account().address();
        self.protocol.underlyer_balance(token, lp_account).unwrap()
    }

    pub fn idle_balance(&self, pool: &Address) -> u128 {
        let token = self.protocol.pool(pool).unwrap().underlyer();
        self.protocol.underlyer_balance(token, pool).unwrap()
    }
}
