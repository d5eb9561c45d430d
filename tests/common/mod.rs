#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use bookstore::auth::TokenIssuer;
use bookstore::config::AppConfig;
use bookstore::database::models::{User, UserCreationRequest};
use bookstore::database::{migrations, DatabaseManager, Storage};
use bookstore::{app, AppState};

/// Fresh in-memory store, migrated.
pub async fn storage() -> Result<Storage> {
    let config = AppConfig::for_tests();
    let pool = DatabaseManager::connect(&config.database).await?;
    migrations::migrate(&pool).await?;
    Ok(Storage::new(pool))
}

pub async fn seed_user(
    storage: &Storage,
    username: &str,
    password: &str,
    pseudonym: &str,
    is_admin: bool,
) -> Result<User> {
    let user = storage
        .create_user(&UserCreationRequest {
            username: username.to_string(),
            password: password.to_string(),
            pseudonym: pseudonym.to_string(),
            is_admin,
        })
        .await?;
    Ok(user)
}

/// The app served on a free local port, backed by its own in-memory database.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub storage: Storage,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let config = AppConfig::for_tests();
        let storage = storage().await?;
        let state = AppState::new(storage.clone(), TokenIssuer::from_config(&config.security));

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            storage,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn seed_user(
        &self,
        username: &str,
        password: &str,
        pseudonym: &str,
        is_admin: bool,
    ) -> Result<User> {
        seed_user(&self.storage, username, password, pseudonym, is_admin).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/authenticate"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("token missing from response")
    }

    /// Seeds an account and returns it together with a bearer token.
    pub async fn user_with_token(
        &self,
        username: &str,
        pseudonym: &str,
        is_admin: bool,
    ) -> Result<(User, String)> {
        let user = self.seed_user(username, "password1", pseudonym, is_admin).await?;
        let token = self.login(username, "password1").await?;
        Ok((user, token))
    }
}
