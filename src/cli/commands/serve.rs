use tokio::net::TcpListener;

use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::database::{migrations, DatabaseManager, Storage};
use crate::routes::app;
use crate::state::AppState;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    if config.is_in_memory() {
        // Nothing persists between runs, so the schema is always created fresh
        migrations::migrate(&pool).await?;
    }
    migrations::ensure_current(&pool).await?;

    let tokens = TokenIssuer::from_config(&config.security);
    if tokens.uses_generated_key() {
        tracing::warn!("BOOKSTORE_JWT_SECRET not set; using a random signing key, tokens will not survive a restart");
    }

    let state = AppState::new(Storage::new(pool.clone()), tokens);
    let listener = TcpListener::bind(config.listen_addr()?).await?;
    tracing::info!("Bookstore API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
