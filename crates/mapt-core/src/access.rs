//! # Access Control
//!
//! Role membership plus a static policy table mapping each gated operation
//! to the single role allowed to invoke it. Every gated entry point calls
//! [`AccessControl::authorize`] with the caller before touching state.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{MaptError, MaptResult};
use crate::types::Address;

/// Capability held by an operator or a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Parameter changes
    Admin,
    /// Locks, overrides and manual rebalances
    Emergency,
    /// Oracle-driven rebalances
    Lp,
    /// Component-to-component calls (mAPT, allocation registry)
    Contract,
}

impl Role {
    /// Error returned when a caller lacks this role
    pub fn missing_error(self) -> MaptError {
        match self {
            Role::Admin => MaptError::NotAdminRole,
            Role::Emergency => MaptError::NotEmergencyRole,
            Role::Lp => MaptError::NotLpRole,
            Role::Contract => MaptError::NotContractRole,
        }
    }
}

/// Every permissioned operation in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Oracle adapter
    OracleLock,
    OracleEmergencyUnlock,
    OracleSetTvlOverride,
    OracleUnsetTvlOverride,
    OracleSetAssetOverride,
    OracleUnsetAssetOverride,
    OracleSetTvlSource,
    OracleSetAssetSource,
    OracleSetAssetSources,
    OracleSetStalePeriod,
    OracleSetDefaultLockPeriod,

    // Pool
    PoolEmergencyLock,
    PoolLockAddLiquidity,
    PoolLockRedeem,
    PoolSetReservePercentage,
    PoolSetWithdrawFee,
    PoolSetArbitrageFee,
    PoolTransferToLpAccount,

    // Meta pool token
    FundLpAccount,
    WithdrawFromLpAccount,
    EmergencyFundLpAccount,
    EmergencyWithdrawFromLpAccount,

    // LP account and allocation registry
    LpAccountTransferToPool,
    RegisterErc20Token,
}

impl Operation {
    /// Policy table
    pub fn required_role(self) -> Role {
        use Operation::*;
        match self {
            OracleLock | PoolTransferToLpAccount | LpAccountTransferToPool | RegisterErc20Token => {
                Role::Contract
            }
            OracleEmergencyUnlock
            | OracleSetTvlOverride
            | OracleUnsetTvlOverride
            | OracleSetAssetOverride
            | OracleUnsetAssetOverride
            | OracleSetTvlSource
            | OracleSetAssetSource
            | OracleSetAssetSources
            | PoolEmergencyLock
            | PoolLockAddLiquidity
            | PoolLockRedeem
            | EmergencyFundLpAccount
            | EmergencyWithdrawFromLpAccount => Role::Emergency,
            OracleSetStalePeriod
            | OracleSetDefaultLockPeriod
            | PoolSetReservePercentage
            | PoolSetWithdrawFee
            | PoolSetArbitrageFee => Role::Admin,
            FundLpAccount | WithdrawFromLpAccount => Role::Lp,
        }
    }
}

/// Role membership table
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_role(&mut self, role: Role, account: Address) {
        self.members.entry(role).or_default().insert(account);
    }

    pub fn revoke_role(&mut self, role: Role, account: &Address) {
        if let Some(holders) = self.members.get_mut(&role) {
            holders.remove(account);
        }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .map(|holders| holders.contains(account))
            .unwrap_or(false)
    }

    pub fn require_role(&self, role: Role, account: &Address) -> MaptResult<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(role.missing_error())
        }
    }

    /// Check `caller` against the policy table entry for `operation`
    pub fn authorize(&self, caller: &Address, operation: Operation) -> MaptResult<()> {
        self.require_role(operation.required_role(), caller)
    }
}
