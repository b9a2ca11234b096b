//! HotLabel user profiling CLI entry point.

use anyhow::{anyhow, Result};
use clap::Parser;

use hotlabel_users::cli::context::{load_config, AppContext};
use hotlabel_users::cli::{commands, handle_error, Cli, Commands};
use hotlabel_users::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let log_config = LogConfig::try_from(&config.logging).map_err(|e| anyhow!(e))?;
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, config, cli.json).await,
        Commands::Area(args) => {
            let ctx = AppContext::open(config).await?;
            commands::area::execute(args, &ctx, cli.json).await
        }
        Commands::Session(args) => {
            let ctx = AppContext::open(config).await?;
            commands::session::execute(args, &ctx, cli.json).await
        }
        Commands::Profile(args) => {
            let ctx = AppContext::open(config).await?;
            commands::profile::execute(args, &ctx, cli.json).await
        }
        Commands::Stats(args) => {
            let ctx = AppContext::open(config).await?;
            commands::stats::execute(args, &ctx, cli.json).await
        }
        Commands::Compat(args) => {
            let ctx = AppContext::open(config).await?;
            commands::compat::execute(args, &ctx, cli.json).await
        }
    }
}
