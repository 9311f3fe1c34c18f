//! Meta pool token ledger.
//!
//! Balances change only through the mint-and-transfer and
//! burn-and-transfer steps driven by [`crate::protocol::Protocol`].

use crate::access::{AccessControl, Operation};
use crate::errors::MaptResult;
use crate::ledger::ShareLedger;
use crate::types::Address;

#[derive(Debug, Clone)]
pub struct MetaPoolToken {
    address: Address,
    access: AccessControl,
    shares: ShareLedger,
}

impl MetaPoolToken {
    pub fn new(address: Address, access: AccessControl) -> Self {
        Self {
            address,
            access,
            shares: ShareLedger::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.shares.balance_of(holder)
    }

    pub fn authorize(&self, caller: &Address, operation: Operation) -> MaptResult<()> {
        self.access.authorize(caller, operation)
    }

    pub(crate) fn mint(&mut self, pool: &Address, amount: u128) -> MaptResult<()> {
        self.shares.mint(pool, amount)
    }

    pub(crate) fn burn(&mut self, pool: &Address, amount: u128) -> MaptResult<()> {
        self.shares.burn(pool, amount)
    }
}
