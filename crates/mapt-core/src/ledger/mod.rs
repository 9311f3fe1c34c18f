//! Balance ledgers: non-transferable share ledgers for APT/mAPT and the
//! ERC-20 style underlyer ledger.

pub mod shares;
pub mod tokens;

pub use shares::ShareLedger;
pub use tokens::{TokenInfo, TokenLedger};
