use std::fs;

use mapt_core::{ProtocolConfig, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Simulated seconds between blocks
    pub seconds_per_block: i64,

    /// Blocks mined between keeper cycles
    pub blocks_per_cycle: u64,

    /// Smallest reserve imbalance worth a rebalance, in basis points of the
    /// pool's total value
    pub rebalance_threshold_bps: u32,

    /// Protocol deployment
    pub protocol: ProtocolConfig,

    /// Deposits made before the first cycle
    #[serde(default)]
    pub deposits: Vec<DepositConfig>,
}

/// Initial deposit into a pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DepositConfig {
    pub depositor: String,

    /// Pool registry id
    pub pool: String,

    /// Whole underlyer tokens
    pub amount: u64,
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::Io(format!("Failed to read config file {}: {}", path, e)))?;

        let config: KeeperConfig = toml::from_str(&content)
            .map_err(|e| KeeperError::InvalidConfig(format!("Failed to parse config file {}: {}", path, e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| KeeperError::Io(format!("Failed to write config file {}: {}", path, e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        self.protocol
            .validate()
            .map_err(|e| KeeperError::InvalidConfig(format!("protocol: {}", e)))?;

        if self.protocol.pools.is_empty() {
            return Err(KeeperError::InvalidConfig("at least one pool is required".to_string()));
        }

        if self.seconds_per_block <= 0 {
            return Err(KeeperError::InvalidConfig(format!(
                "seconds_per_block must be greater than 0, got {}",
                self.seconds_per_block
            )));
        }

        if self.blocks_per_cycle == 0 {
            return Err(KeeperError::InvalidConfig("blocks_per_cycle must be greater than 0".to_string()));
        }

        if self.rebalance_threshold_bps > BPS_DENOMINATOR {
            return Err(KeeperError::InvalidConfig(format!(
                "rebalance_threshold_bps must be at most {}, got {}",
                BPS_DENOMINATOR, self.rebalance_threshold_bps
            )));
        }

        for deposit in &self.deposits {
            deposit.validate(&self.protocol)?;
        }

        Ok(())
    }

    /// Registry ids of every configured pool
    pub fn pool_ids(&self) -> Vec<String> {
        self.protocol.pools.iter().map(|pool| pool.id.clone()).collect()
    }
}

impl DepositConfig {
    fn validate(&self, protocol: &ProtocolConfig) -> KeeperResult<()> {
        if self.depositor.is_empty() {
            return Err(KeeperError::InvalidConfig("deposit without depositor".to_string()));
        }

        if !protocol.pools.iter().any(|pool| pool.id == self.pool) {
            return Err(KeeperError::InvalidConfig(format!("deposit into unknown pool {}", self.pool)));
        }

        if self.amount == 0 {
            return Err(KeeperError::InvalidConfig(format!(
                "deposit by {} into {} is zero",
                self.depositor, self.pool
            )));
        }

        Ok(())
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            seconds_per_block: 13,
            blocks_per_cycle: 45, // ~10 minutes
            rebalance_threshold_bps: 100, // 1%
            protocol: ProtocolConfig::default(),
            deposits: vec![],
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let example_config = KeeperConfig {
        deposits: vec![
            DepositConfig {
                depositor: "alice".to_string(),
                pool: "daiPool".to_string(),
                amount: 250_000,
            },
            DepositConfig {
                depositor: "bob".to_string(),
                pool: "usdcPool".to_string(),
                amount: 100_000,
            },
            DepositConfig {
                depositor: "carol".to_string(),
                pool: "usdtPool".to_string(),
                amount: 50_000,
            },
        ],
        ..KeeperConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}
