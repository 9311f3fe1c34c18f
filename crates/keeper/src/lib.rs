pub mod config;
pub mod error;
pub mod keeper;

pub use config::{create_example_config, DepositConfig, KeeperConfig};
pub use error::{KeeperError, KeeperResult};
pub use keeper::{CycleAction, CycleReport, Keeper, KeeperSummary};
