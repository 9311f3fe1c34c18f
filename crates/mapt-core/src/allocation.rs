//! ERC-20 allocation registry.
//!
//! Records every token the LP Account may hold so TVL reporting can find
//! it. Pool underlyers are registered the first time capital moves.

use std::collections::BTreeMap;

use tracing::info;

use crate::access::{AccessControl, Operation};
use crate::errors::{MaptError, MaptResult};
use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenData {
    pub token: Address,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct Erc20Allocation {
    access: AccessControl,
    tokens: BTreeMap<Address, TokenData>,
}

impl Erc20Allocation {
    pub fn new(access: AccessControl) -> Self {
        Self {
            access,
            tokens: BTreeMap::new(),
        }
    }

    pub fn is_token_registered(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenData> {
        self.tokens.values()
    }

    pub fn register_erc20_token(&mut self, caller: &Address, data: TokenData) -> MaptResult<()> {
        self.access.authorize(caller, Operation::RegisterErc20Token)?;
        if data.token.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        if self.is_token_registered(&data.token) {
            return Err(MaptError::AlreadyRegistered(data.token));
        }
        info!("Registered allocation token {} ({})", data.symbol, data.token);
        self.tokens.insert(data.token.clone(), data);
        Ok(())
    }
}
