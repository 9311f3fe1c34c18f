use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mapt_keeper::{create_example_config, Keeper, KeeperConfig};

#[derive(Parser, Debug)]
#[command(name = "mapt-keeper")]
#[command(about = "Reserve rebalancing keeper for the meta pool token")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: String,

    /// Write an example configuration to the config path and exit
    #[arg(long)]
    init: bool,

    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Cycle interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    interval: u64,

    /// Dry run mode - plan rebalances but don't execute them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "mapt_keeper=debug,mapt_core=debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.init {
        create_example_config(&args.config)?;
        info!("Wrote example configuration to {}", args.config);
        return Ok(());
    }

    info!("Starting mAPT keeper");
    info!("Cycle interval: {}ms", args.interval);

    if args.dry_run {
        warn!("Running in DRY RUN mode - no rebalances will be executed");
    }

    let config = KeeperConfig::load(&args.config)?;
    info!(
        "Loaded configuration for {} pools and {} deposits",
        config.protocol.pools.len(),
        config.deposits.len()
    );

    let mut keeper = Keeper::new(config, args.dry_run)?;
    info!("Keeper initialized successfully");

    let rebalances = keeper
        .run(args.iterations, Duration::from_millis(args.interval.max(1)))
        .await?;

    info!("Finished {} cycles with {} rebalances", keeper.cycles(), rebalances);
    println!("{}", keeper.summary_json()?);
    Ok(())
}
