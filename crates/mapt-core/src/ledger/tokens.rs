//! ERC-20 style ledger for underlyer tokens (DAI, USDC, USDT, ...).
//!
//! Stands in for the external token contracts: balances, allowances and
//! metadata per registered token.

use std::collections::BTreeMap;

use crate::constants::MAX_TOKEN_DECIMALS;
use crate::errors::{MaptError, MaptResult};
use crate::math::{safe_add_u128, safe_sub_u128};
use crate::types::Address;

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenState {
    info: TokenInfo,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLedger {
    tokens: BTreeMap<Address, TokenState>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: Address, symbol: impl Into<String>, decimals: u8) -> MaptResult<()> {
        if token.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(MaptError::InvalidParameter(format!(
                "decimals {} exceeds {}",
                decimals, MAX_TOKEN_DECIMALS
            )));
        }
        if self.tokens.contains_key(&token) {
            return Err(MaptError::AlreadyRegistered(token));
        }
        let state = TokenState {
            info: TokenInfo {
                symbol: symbol.into(),
                decimals,
            },
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        };
        self.tokens.insert(token, state);
        Ok(())
    }

    pub fn is_registered(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Address> {
        self.tokens.keys()
    }

    fn state(&self, token: &Address) -> MaptResult<&TokenState> {
        self.tokens
            .get(token)
            .ok_or_else(|| MaptError::UnknownToken(token.clone()))
    }

    fn state_mut(&mut self, token: &Address) -> MaptResult<&mut TokenState> {
        self.tokens
            .get_mut(token)
            .ok_or_else(|| MaptError::UnknownToken(token.clone()))
    }

    pub fn info(&self, token: &Address) -> MaptResult<&TokenInfo> {
        Ok(&self.state(token)?.info)
    }

    pub fn decimals(&self, token: &Address) -> MaptResult<u8> {
        Ok(self.info(token)?.decimals)
    }

    pub fn symbol(&self, token: &Address) -> MaptResult<&str> {
        Ok(self.info(token)?.symbol.as_str())
    }

    pub fn total_supply(&self, token: &Address) -> MaptResult<u128> {
        Ok(self.state(token)?.total_supply)
    }

    pub fn balance_of(&self, token: &Address, holder: &Address) -> MaptResult<u128> {
        Ok(self.state(token)?.balances.get(holder).copied().unwrap_or(0))
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> MaptResult<u128> {
        Ok(self
            .state(token)?
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0))
    }

    /// Credit new tokens to `to` (test faucet / bridge in)
    pub fn mint(&mut self, token: &Address, to: &Address, amount: u128) -> MaptResult<()> {
        let state = self.state_mut(token)?;
        let total_supply = safe_add_u128(state.total_supply, amount)?;
        let balance = safe_add_u128(state.balances.get(to).copied().unwrap_or(0), amount)?;
        state.total_supply = total_supply;
        state.balances.insert(to.clone(), balance);
        Ok(())
    }

    pub fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: u128) -> MaptResult<()> {
        let state = self.state_mut(token)?;
        state.allowances.insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }

    pub fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: u128) -> MaptResult<()> {
        if to.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        let state = self.state_mut(token)?;
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(MaptError::TransferExceedsBalance {
                token: token.clone(),
                holder: from.clone(),
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let to_balance = safe_add_u128(state.balances.get(to).copied().unwrap_or(0), amount)?;
        state.balances.insert(from.clone(), from_balance - amount);
        state.balances.insert(to.clone(), to_balance);
        Ok(())
    }

    /// Move tokens on behalf of `from`, spending `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> MaptResult<()> {
        let allowance = self.allowance(token, from, spender)?;
        if allowance < amount {
            return Err(MaptError::AllowanceInsufficient);
        }
        self.transfer(token, from, to, amount)?;
        let remaining = safe_sub_u128(allowance, amount)?;
        self.approve(token, from, spender, remaining)
    }
}
