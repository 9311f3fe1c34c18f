//! Share ledger with mint/burn only.
//!
//! Holder balances always sum to `total_supply`; there is no transfer
//! between holders.

use std::collections::BTreeMap;

use crate::errors::{MaptError, MaptResult};
use crate::math::{safe_add_u128, safe_sub_u128};
use crate::types::Address;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ShareLedger {
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn mint(&mut self, to: &Address, amount: u128) -> MaptResult<()> {
        if to.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        let total_supply = safe_add_u128(self.total_supply, amount)?;
        let balance = safe_add_u128(self.balance_of(to), amount)?;
        self.total_supply = total_supply;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    pub fn burn(&mut self, from: &Address, amount: u128) -> MaptResult<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(MaptError::BalanceInsufficient);
        }
        let total_supply = safe_sub_u128(self.total_supply, amount)?;
        self.total_supply = total_supply;
        if balance == amount {
            self.balances.remove(from);
        } else {
            self.balances.insert(from.clone(), balance - amount);
        }
        Ok(())
    }

    /// Holders with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, u128)> {
        self.balances.iter().map(|(holder, balance)| (holder, *balance))
    }

    /// Sum of balances equals total supply
    pub fn is_consistent(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |sum, balance| sum.checked_add(*balance))
            .map(|sum| sum == self.total_supply)
            .unwrap_or(false)
    }
}
