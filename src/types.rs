//! Shared types for the stakeboard service.
//!
//! These types form the data model used across all modules: the
//! credential handed to the exchange connector, the unified balance
//! snapshot it returns, and the per-account result row the report is
//! built from. Everything here lives for a single HTTP request.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// One sub-account's API credentials, paired with its display name.
///
/// The secret is wrapped in [`SecretString`] so it is redacted from
/// `Debug` output and never serialized.
#[derive(Debug, Clone)]
pub struct AccountCredential {
    /// Display name, e.g. "Master" or "Subaccount 2".
    pub name: String,
    pub api_key: String,
    pub secret: SecretString,
}

impl AccountCredential {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            secret: SecretString::new(secret.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Balance snapshot
// ---------------------------------------------------------------------------

/// Unified balance snapshot returned by a balance provider.
///
/// `total` / `free` / `used` map upper-cased currency codes to amounts.
/// `info` carries the raw exchange payload untouched, so callers can
/// reach venue-specific fields the unified maps don't cover.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub total: HashMap<String, f64>,
    pub free: HashMap<String, f64>,
    pub used: HashMap<String, f64>,
    pub info: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// An empty snapshot stamped with the current time.
    pub fn empty() -> Self {
        Self {
            total: HashMap::new(),
            free: HashMap::new(),
            used: HashMap::new(),
            info: serde_json::Value::Null,
            fetched_at: Utc::now(),
        }
    }
}

/// The filtered copies of a snapshot's maps retained per account:
/// only entries whose value is a finite number survive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceTables {
    pub total: HashMap<String, f64>,
    pub free: HashMap<String, f64>,
    pub used: HashMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Per-account result
// ---------------------------------------------------------------------------

/// The outcome of one account's balance fetch.
///
/// Exactly one of `balance` / `error` is populated. On failure the USD
/// fields are zero so a failed row contributes nothing to the total.
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub account: String,
    pub balance: Option<BalanceTables>,
    pub error: Option<String>,
    /// The "USD" entry of the unified `total` map (0 when absent).
    pub total_usd: f64,
    /// The venue's cash-account USD holding (0 when absent).
    pub info_usd: f64,
    /// `total_usd + info_usd`.
    pub sum_usd: f64,
}

impl AccountBalance {
    /// A failed row: no balance tables, a non-empty error message,
    /// zero USD contribution.
    pub fn failed(account: impl Into<String>, error: impl Into<String>) -> Self {
        let mut message = error.into();
        if message.is_empty() {
            message = "Unknown error".to_string();
        }
        Self {
            account: account.into(),
            balance: None,
            error: Some(message),
            total_usd: 0.0,
            info_usd: 0.0,
            sum_usd: 0.0,
        }
    }
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(e) => write!(f, "{}: error ({e})", self.account),
            None => write!(
                f,
                "{}: ${:.2} futures + ${:.2} holding = ${:.2}",
                self.account, self.total_usd, self.info_usd, self.sum_usd
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by a balance provider. The `Display` text of these is
/// what ends up inline next to the account name on the rendered page.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Exchange returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        ExchangeError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_credential_debug_redacts_secret() {
        let cred = AccountCredential::new("Master", "key-123", "hunter2");
        let debug = format!("{cred:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(cred.secret.expose_secret(), "hunter2");
    }

    #[test]
    fn test_failed_row_defaults_message() {
        let row = AccountBalance::failed("Subaccount 1", "");
        assert_eq!(row.error.as_deref(), Some("Unknown error"));
        assert!(row.balance.is_none());
        assert_eq!(row.sum_usd, 0.0);
    }

    #[test]
    fn test_failed_row_keeps_message() {
        let row = AccountBalance::failed("Master", "nonce window exceeded");
        assert_eq!(row.error.as_deref(), Some("nonce window exceeded"));
    }

    #[test]
    fn test_account_balance_display() {
        let row = AccountBalance {
            account: "Master".into(),
            balance: Some(BalanceTables::default()),
            error: None,
            total_usd: 100.0,
            info_usd: 50.5,
            sum_usd: 150.5,
        };
        let text = format!("{row}");
        assert!(text.contains("$150.50"));
    }

    #[test]
    fn test_exchange_error_display() {
        let e = ExchangeError::Api {
            status: 401,
            body: "invalid key".into(),
        };
        assert_eq!(format!("{e}"), "Exchange returned 401: invalid key");
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = BalanceSnapshot::empty();
        assert!(snap.total.is_empty());
        assert!(snap.info.is_null());
    }
}
