//! Meta pool token (mAPT): shared claim ledger over deployed capital.

pub mod math;
pub mod token;

pub use math::{calculate_amounts_to_withdraw, calculate_delta, deployed_value, get_fund_amounts};
pub use token::MetaPoolToken;
