//! Roster broker.
//!
//! Serves the student, teacher and admin collections over WebSocket.
//!
//! Run with: cargo run -p roster-server -- --data-dir ./data

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_core::{AuthPolicy, BrokerConfig, RecordStore};
use roster_router::ActionRouter;
use roster_session::SessionRegistry;
use roster_store::{CollectionService, storage::FileStore};
use roster_transport::Listener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Roster broker
#[derive(Parser, Debug)]
#[command(name = "roster-server")]
#[command(about = "WebSocket broker for student, teacher and admin records")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (host:port)
    #[arg(short, long, env = "ROSTER_LISTEN")]
    listen: Option<SocketAddr>,

    /// Directory holding the collection files
    #[arg(short, long, env = "ROSTER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Accepted login username
    #[arg(long, env = "ROSTER_USERNAME")]
    username: Option<String>,

    /// Accepted login password
    #[arg(long, env = "ROSTER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Answer every action but login with `loginRequired` until the session logs in
    #[arg(
        long,
        env = "ROSTER_REQUIRE_LOGIN",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    require_login: bool,
}

impl Args {
    /// Defaults, then the config file, then flags and environment.
    fn resolve(self) -> anyhow::Result<BrokerConfig> {
        let mut config = match &self.config {
            Some(path) => BrokerConfig::load(path)?,
            None => BrokerConfig::default(),
        };

        if let Some(addr) = self.listen {
            config = config.with_listen_addr(addr);
        }
        if let Some(dir) = self.data_dir {
            config = config.with_data_dir(dir);
        }
        if self.username.is_some() || self.password.is_some() {
            let username = self
                .username
                .unwrap_or_else(|| config.credentials.username.clone());
            let password = self
                .password
                .unwrap_or_else(|| config.credentials.password.clone());
            config = config.with_credentials(username, password);
        }
        if self.require_login {
            config = config.with_auth_policy(AuthPolicy::RequireLogin);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Args::parse().resolve().context("Invalid configuration")?;
    tracing::debug!(?config, "Resolved configuration");

    let store: Arc<dyn RecordStore> = Arc::new(FileStore::new(&config.data_dir));
    let service = Arc::new(CollectionService::new(store));
    let router = Arc::new(ActionRouter::from_config(&service, &config)?);

    let listener = Listener::bind(config.listen_addr, router, SessionRegistry::new()).await?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        auth_policy = ?config.auth_policy,
        "WebSocket server running on ws://{}",
        listener.local_addr()
    );

    listener
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                return;
            }
            tracing::info!("Received Ctrl+C, shutting down");
        })
        .await?;

    Ok(())
}
