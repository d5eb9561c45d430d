use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookstore::cli::{self, Cli};
use bookstore::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so BOOKSTORE_* settings apply to cargo run as well
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.apply(AppConfig::from_env());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting bookstore in {:?} mode", config.environment);
    cli::run(cli, config).await
}
