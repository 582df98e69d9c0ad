use anyhow::{Context, Result};

use albert::{
    cli::{self, CliAction},
    config::Config,
    logging, server,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = match cli::action_from_env()? {
        CliAction::Run { config_path } => config_path,
        CliAction::ShowUsage => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard = logging::init_tracing(&config.logging)?;
    tracing::info!(
        target: "main",
        run_id = %logging_guard.run_id(),
        endpoint = %config.gateway.endpoint,
        "albert_starting"
    );

    server::run(config).await
}
