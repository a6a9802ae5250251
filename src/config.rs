//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys, the directory token) are referenced by env-var
//! name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::AccountCredential;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub report: ReportConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Baseline USD amount the single-tenant page compares against.
    pub initial_stake: f64,
}

/// Remote key-value store holding the per-user account list.
#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    pub base_url: String,
    /// Env var holding the read token for the store.
    pub token_env: String,
    /// The item key the account list lives under.
    pub key: String,
}

/// The five fixed sub-account slots the single-tenant page reads from
/// the process environment: (display name, key var, secret var).
const ACCOUNT_ENV_SLOTS: [(&str, &str, &str); 5] = [
    ("Master", "KRAKEN_MASTER_API_KEY", "KRAKEN_MASTER_API_SECRET"),
    ("Subaccount 1", "KRAKEN_SUB1_API_KEY", "KRAKEN_SUB1_API_SECRET"),
    ("Subaccount 2", "KRAKEN_SUB2_API_KEY", "KRAKEN_SUB2_API_SECRET"),
    ("Subaccount 3", "KRAKEN_SUB3_API_KEY", "KRAKEN_SUB3_API_SECRET"),
    ("Subaccount 4", "KRAKEN_SUB4_API_KEY", "KRAKEN_SUB4_API_SECRET"),
];

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

/// Build the single-tenant credential list from the fixed env slots.
///
/// A missing variable resolves to an empty string rather than an error:
/// the fetch for that account then fails with an auth error that is
/// rendered inline, instead of the whole page going down.
pub fn single_tenant_accounts() -> Vec<AccountCredential> {
    ACCOUNT_ENV_SLOTS
        .iter()
        .map(|(name, key_var, secret_var)| {
            AccountCredential::new(
                *name,
                std::env::var(key_var).unwrap_or_default(),
                std::env::var(secret_var).unwrap_or_default(),
            )
        })
        .collect()
}
