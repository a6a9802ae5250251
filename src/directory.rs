//! Remote account directory.
//!
//! The multi-tenant page looks its users up in a remote key-value
//! configuration store: a single fixed key holds a JSON array of user
//! records, each carrying a username, an initial stake and the five
//! sub-account credential pairs. The store is read-only from here and
//! re-fetched on every request; there is no caching layer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::types::AccountCredential;

// ---------------------------------------------------------------------------
// User records
// ---------------------------------------------------------------------------

/// One user's entry in the directory, with the store's flat field
/// layout preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccountRecord {
    pub username: String,
    #[serde(rename = "initialStake")]
    pub initial_stake: f64,
    #[serde(rename = "KRAKEN_MASTER_API_KEY")]
    master_api_key: String,
    #[serde(rename = "KRAKEN_MASTER_API_SECRET")]
    master_api_secret: String,
    #[serde(rename = "KRAKEN_SUB1_API_KEY")]
    sub1_api_key: String,
    #[serde(rename = "KRAKEN_SUB1_API_SECRET")]
    sub1_api_secret: String,
    #[serde(rename = "KRAKEN_SUB2_API_KEY")]
    sub2_api_key: String,
    #[serde(rename = "KRAKEN_SUB2_API_SECRET")]
    sub2_api_secret: String,
    #[serde(rename = "KRAKEN_SUB3_API_KEY")]
    sub3_api_key: String,
    #[serde(rename = "KRAKEN_SUB3_API_SECRET")]
    sub3_api_secret: String,
    #[serde(rename = "KRAKEN_SUB4_API_KEY")]
    sub4_api_key: String,
    #[serde(rename = "KRAKEN_SUB4_API_SECRET")]
    sub4_api_secret: String,
}

impl UserAccountRecord {
    /// Expand the flat credential pairs into the ordered account list.
    pub fn credentials(&self) -> Vec<AccountCredential> {
        vec![
            AccountCredential::new("Master", self.master_api_key.as_str(), self.master_api_secret.as_str()),
            AccountCredential::new("Subaccount 1", self.sub1_api_key.as_str(), self.sub1_api_secret.as_str()),
            AccountCredential::new("Subaccount 2", self.sub2_api_key.as_str(), self.sub2_api_secret.as_str()),
            AccountCredential::new("Subaccount 3", self.sub3_api_key.as_str(), self.sub3_api_secret.as_str()),
            AccountCredential::new("Subaccount 4", self.sub4_api_key.as_str(), self.sub4_api_secret.as_str()),
        ]
    }
}

/// Find the first record matching `username`, if any.
///
/// Callers must render the not-found view on `None` instead of
/// attempting any balance fetch.
pub fn resolve<'a>(
    records: &'a [UserAccountRecord],
    username: &str,
) -> Option<&'a UserAccountRecord> {
    records.iter().find(|r| r.username == username)
}

// ---------------------------------------------------------------------------
// Directory sources
// ---------------------------------------------------------------------------

/// Abstraction over the directory source, so the username route can be
/// driven by a scripted list in tests.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Fetch the full user list. A failure here is a whole-request
    /// failure; there is no per-user fallback.
    async fn fetch_accounts(&self) -> Result<Vec<UserAccountRecord>>;
}

/// Live directory client against the remote key-value store's REST
/// read API: `GET {base_url}/item/{key}` with a bearer read token.
pub struct RemoteDirectory {
    http: Client,
    base_url: String,
    key: String,
    token: String,
}

impl RemoteDirectory {
    pub fn new(config: &DirectoryConfig, token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("stakeboard/0.1.0 (balance-board)")
            .build()
            .context("Failed to build HTTP client for the account directory")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            token,
        })
    }
}

#[async_trait]
impl AccountDirectory for RemoteDirectory {
    async fn fetch_accounts(&self) -> Result<Vec<UserAccountRecord>> {
        let url = format!("{}/item/{}", self.base_url, self.key);
        debug!(url = %url, "Fetching account directory");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Account directory request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Account directory error {status}: {body}");
        }

        let records: Vec<UserAccountRecord> = resp
            .json()
            .await
            .context("Failed to parse account directory response")?;

        debug!(count = records.len(), "Account directory fetched");
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
