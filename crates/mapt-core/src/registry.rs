//! Symbolic identifier → address lookup.

use std::collections::BTreeMap;

use crate::errors::{MaptError, MaptResult};
use crate::types::Address;

/// Resolves registry identifiers such as `"daiPool"` or `"lpAccount"`
pub trait AddressLookup {
    fn get_address(&self, id: &str) -> MaptResult<Address>;

    fn get_addresses(&self, ids: &[String]) -> MaptResult<Vec<Address>> {
        ids.iter().map(|id| self.get_address(id)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressRegistry {
    entries: BTreeMap<String, Address>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, address: Address) -> MaptResult<()> {
        if address.is_empty() {
            return Err(MaptError::InvalidAddress);
        }
        self.entries.insert(id.into(), address);
        Ok(())
    }
}

impl AddressLookup for AddressRegistry {
    fn get_address(&self, id: &str) -> MaptResult<Address> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| MaptError::missing_address(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut registry = AddressRegistry::new();
        registry.register("daiPool", Address::from("0xdai")).unwrap();

        assert_eq!(registry.get_address("daiPool"), Ok(Address::from("0xdai")));
        assert_eq!(
            registry.get_addresses(&["daiPool".to_string(), "usdtPool".to_string()]),
            Err(MaptError::MissingAddress("usdtPool".to_string()))
        );
        assert_eq!(
            registry.register("empty", Address::default()),
            Err(MaptError::InvalidAddress)
        );
    }
}
