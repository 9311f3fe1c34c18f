//! # Core Error Types
//!
//! Every operation either completes or fails with one of these errors and
//! leaves no partial effect behind.

use thiserror::Error;

use crate::types::Address;

/// Protocol errors grouped by failure class
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum MaptError {
    // ========================================================================
    // Permission Errors
    // ========================================================================

    #[error("Caller lacks the LP role")]
    NotLpRole,

    #[error("Caller lacks the emergency role")]
    NotEmergencyRole,

    #[error("Caller lacks the admin role")]
    NotAdminRole,

    #[error("Caller lacks the contract role")]
    NotContractRole,

    // ========================================================================
    // Input Validation Errors
    // ========================================================================

    #[error("Amount insufficient")]
    AmountInsufficient,

    #[error("Allowance insufficient")]
    AllowanceInsufficient,

    #[error("Balance insufficient")]
    BalanceInsufficient,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Lengths must match: {0} != {1}")]
    LengthsMustMatch(usize, usize),

    #[error("Invalid stale period")]
    InvalidStalePeriod,

    #[error("Invalid source")]
    InvalidSource,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ========================================================================
    // Consistency Errors
    // ========================================================================

    #[error("Insufficient total supply")]
    InsufficientTotalSupply,

    #[error("Reserve insufficient: requested {requested}, available {available}")]
    ReserveInsufficient { requested: u128, available: u128 },

    #[error("Invalid zero TVL")]
    InvalidZeroTvl,

    #[error("Missing address: {0}")]
    MissingAddress(String),

    #[error("Unknown pool: {0}")]
    UnknownPool(Address),

    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("No active override to unset")]
    OverrideNotSet,

    // ========================================================================
    // Oracle Availability Errors
    // ========================================================================

    #[error("Oracle locked")]
    Locked,

    #[error("Stale data: {age_seconds}s old (max {max_age}s)")]
    StaleData { age_seconds: i64, max_age: i64 },

    #[error("Negative value")]
    NegativeValue,

    #[error("Missing asset value")]
    MissingAssetValue,

    #[error("Cannot shorten lock")]
    CannotShortenLock,

    // ========================================================================
    // Pool State Errors
    // ========================================================================

    #[error("Pool paused")]
    Paused,

    #[error("Add liquidity locked")]
    AddLiquidityLocked,

    #[error("Redeem locked")]
    RedeemLocked,

    // ========================================================================
    // External Call Errors
    // ========================================================================

    #[error("Transfer amount exceeds balance of {holder} in {token}")]
    TransferExceedsBalance { token: Address, holder: Address },

    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Conversion error")]
    ConversionError,
}

/// Result type using core errors
pub type MaptResult<T> = Result<T, MaptError>;

impl MaptError {
    /// Create a lengths-must-match error
    pub fn lengths_must_match(left: usize, right: usize) -> Self {
        Self::LengthsMustMatch(left, right)
    }

    /// Create a missing address error for a registry identifier
    pub fn missing_address(id: &str) -> Self {
        Self::MissingAddress(id.to_string())
    }
}
