//! Deployment account (LP Account).
//!
//! Holds deployed underlyer on the token ledger. Strategy execution is out
//! of scope; the core only needs its balances and `transfer_to_pool`.

use crate::access::{AccessControl, Operation};
use crate::errors::MaptResult;
use crate::types::Address;

#[derive(Debug, Clone)]
pub struct LpAccount {
    address: Address,
    access: AccessControl,
}

impl LpAccount {
    pub fn new(address: Address, access: AccessControl) -> Self {
        Self { address, access }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Only the meta pool token may pull underlyer back into a pool
    pub fn authorize_transfer_to_pool(&self, caller: &Address) -> MaptResult<()> {
        self.access.authorize(caller, Operation::LpAccountTransferToPool)
    }
}
