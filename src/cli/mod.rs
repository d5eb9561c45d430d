pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "bookstore")]
#[command(about = "Bookstore API - users, authentication and book listings over HTTP")]
#[command(version)]
pub struct Cli {
    #[arg(short = 's', long, global = true, help = "SQLite database file")]
    pub sqlite_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Serve the HTTP API")]
    Serve {
        #[arg(short = 'l', long, help = "Address to listen on, e.g. 0.0.0.0:8080")]
        listen_address: Option<String>,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create an administrator account")]
    CreateAdmin {
        #[arg(long, help = "Username of the new administrator")]
        username: String,
        #[arg(long, env = "BOOKSTORE_ADMIN_PASSWORD", help = "Password of the new administrator")]
        password: String,
    },
}

impl Cli {
    /// Command line flags take precedence over the environment.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = &self.sqlite_file {
            config.database.sqlite_file = path.clone();
        }
        if let Commands::Serve {
            listen_address: Some(address),
        } = &self.command
        {
            config.server.listen_address = address.clone();
        }
        config
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => commands::serve::handle(config).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::CreateAdmin { username, password } => {
            commands::admin::handle(config, username, password).await
        }
    }
}
