//! Shopfront terminal client
//!
//! Drives the cart store and the live notification channel against a
//! storefront backend.

mod commands;
mod config;
mod shutdown;

use clap::{Parser, Subcommand};
use commands::{CartCommand, NotificationCommand, run_cart, run_notifications};
use config::{ConfigLoader, LoadedConfig};
use shopfront_sdk::auth::{AuthSession, TokenSource};
use shopfront_sdk::client::ApiClient;
use shutdown::shutdown_signal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Shopfront - cart and notifications from the terminal
#[derive(Parser, Debug)]
#[command(name = "shopfront")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./shopfront.toml")]
    config: PathBuf,

    /// Override the backend base URL (e.g., http://localhost:8080)
    #[arg(long, env = "SHOPFRONT_BASE_URL")]
    base_url: Option<Url>,

    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cart operations
    #[command(subcommand)]
    Cart(CartCommand),
    /// Notification operations
    #[command(subcommand)]
    Notifications(NotificationCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.json);

    tracing::debug!("Starting shopfront v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigLoader::new(&args.config, args.base_url)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::debug!("Configuration loaded from {:?}", args.config);

    let session = AuthSession::new(config.token.clone());

    match args.command {
        Command::Cart(command) => {
            let api = build_api(&config, session.source(), true)?;
            run_cart(api, command).await
        }
        Command::Notifications(command) => {
            let api = build_api(&config, session.source(), true)?;
            let stream_api = build_api(&config, session.source(), false)?;
            run_notifications(
                api,
                stream_api,
                config.transport,
                config.notifications,
                command,
                shutdown_signal(),
            )
            .await
        }
    }
}

/// Build an API client. Long-lived streams only get a connect timeout.
fn build_api(
    config: &LoadedConfig,
    tokens: TokenSource,
    request_timeout: bool,
) -> anyhow::Result<ApiClient> {
    let mut builder = reqwest::Client::builder().connect_timeout(config.timeout);
    if request_timeout {
        builder = builder.timeout(config.timeout);
    }
    Ok(ApiClient::new(config.base_url.clone(), tokens).with_http_client(builder.build()?))
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopfront=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
