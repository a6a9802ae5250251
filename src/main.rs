//! stakeboard — per-user Kraken Futures balance board.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the exchange client and account directory into shared state,
//! and serves the report pages until ctrl-c.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use stakeboard::config::{self, AppConfig};
use stakeboard::directory::RemoteDirectory;
use stakeboard::exchange::kraken_futures::KrakenFuturesClient;
use stakeboard::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        initial_stake = cfg.report.initial_stake,
        "stakeboard starting up"
    );

    // Single-tenant credential slots from the fixed env names. Unset
    // slots surface as inline per-account errors at request time.
    let accounts = config::single_tenant_accounts();
    let unset = accounts.iter().filter(|a| a.api_key.is_empty()).count();
    if unset > 0 {
        warn!(
            unset,
            "Some sub-account env slots are empty; those accounts will render errors"
        );
    }

    let provider = Arc::new(KrakenFuturesClient::new()?);

    let token = AppConfig::resolve_env(&cfg.directory.token_env).unwrap_or_else(|e| {
        warn!(error = %e, "Directory read token not set; the per-user route will fail");
        String::new()
    });
    let directory = Arc::new(RemoteDirectory::new(&cfg.directory, token)?);

    let state = Arc::new(AppState {
        provider,
        directory,
        accounts,
        initial_stake: cfg.report.initial_stake,
    });

    web::serve(state, &cfg.server.host, cfg.server.port).await
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stakeboard=info"));

    let json_logging = std::env::var("STAKEBOARD_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
