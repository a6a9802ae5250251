//! Kraken Futures balance connector.
//!
//! Implements the one operation this service needs against the Kraken
//! Futures REST API: an authenticated account-balance fetch, normalised
//! into the unified snapshot shape.
//!
//! API docs: https://docs.kraken.com/api/docs/futures-api/trading/get-accounts
//! Base URL: https://futures.kraken.com/derivatives
//! Auth: `APIKey`, `Nonce` and `Authent` headers, where
//!   Authent = base64(HMAC-SHA512(base64-decode(secret),
//!                                SHA-256(post_data + nonce + path)))

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::BalanceProvider;
use crate::types::{AccountCredential, BalanceSnapshot, ExchangeError};

type HmacSha512 = Hmac<Sha512>;

const BASE_URL: &str = "https://futures.kraken.com/derivatives";
const ACCOUNTS_PATH: &str = "/api/v3/accounts";
const PROVIDER_NAME: &str = "krakenfutures";

/// Kraken Futures REST client.
///
/// Holds no credentials of its own (they arrive per call), so one
/// instance is shared across all sub-accounts and requests.
pub struct KrakenFuturesClient {
    http: Client,
    base_url: String,
}

impl KrakenFuturesClient {
    pub fn new() -> Result<Self, ExchangeError> {
        Self::with_base_url(BASE_URL)
    }

    /// Create a client against a non-default base URL (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("stakeboard/0.1.0 (balance-board)")
            .build()
            .map_err(|e| ExchangeError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    // -- Internal helpers ------------------------------------------------

    /// Compute the `Authent` header for a request.
    ///
    /// The secret is base64 as issued by Kraken; a secret that doesn't
    /// decode is reported as an auth failure before any request is made.
    fn sign(
        secret_b64: &str,
        post_data: &str,
        nonce: &str,
        path: &str,
    ) -> Result<String, ExchangeError> {
        let secret = BASE64
            .decode(secret_b64)
            .map_err(|e| ExchangeError::Auth(format!("API secret is not valid base64: {e}")))?;

        let mut hasher = Sha256::new();
        hasher.update(post_data.as_bytes());
        hasher.update(nonce.as_bytes());
        hasher.update(path.as_bytes());
        let digest = hasher.finalize();

        let mut mac = HmacSha512::new_from_slice(&secret)
            .map_err(|e| ExchangeError::Auth(format!("Invalid HMAC key: {e}")))?;
        mac.update(&digest);

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// A JSON number, or a string holding one. Non-finite values are
    /// treated as absent.
    fn numeric(value: &serde_json::Value) -> Option<f64> {
        let n = match value {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Normalise the raw `/accounts` payload into unified maps.
    ///
    /// Every sub-account's `balances` entries are summed into `total`
    /// keyed by upper-cased currency code. The flex (multi-collateral)
    /// account reports USD-denominated available funds (`af`) and
    /// portfolio value (`pv`) in its auxiliary block; those feed the
    /// `free` / `used` USD entries.
    fn unify(payload: &serde_json::Value) -> BalanceSnapshot {
        let mut total: HashMap<String, f64> = HashMap::new();
        let mut free: HashMap<String, f64> = HashMap::new();
        let mut used: HashMap<String, f64> = HashMap::new();

        if let Some(accounts) = payload.get("accounts").and_then(|a| a.as_object()) {
            for account in accounts.values() {
                if let Some(balances) = account.get("balances").and_then(|b| b.as_object()) {
                    for (currency, value) in balances {
                        if let Some(amount) = Self::numeric(value) {
                            *total.entry(currency.to_uppercase()).or_insert(0.0) += amount;
                        }
                    }
                }
            }

            if let Some(aux) = accounts
                .get("flex")
                .and_then(|a| a.get("auxiliary"))
                .and_then(|a| a.as_object())
            {
                let af = aux.get("af").and_then(Self::numeric);
                let pv = aux.get("pv").and_then(Self::numeric);
                if let Some(af) = af {
                    free.insert("USD".to_string(), af);
                }
                if let (Some(af), Some(pv)) = (af, pv) {
                    used.insert("USD".to_string(), pv - af);
                }
            }
        }

        BalanceSnapshot {
            total,
            free,
            used,
            info: payload.clone(),
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl BalanceProvider for KrakenFuturesClient {
    async fn fetch_balance(
        &self,
        credential: &AccountCredential,
    ) -> Result<BalanceSnapshot, ExchangeError> {
        if credential.api_key.is_empty() {
            return Err(ExchangeError::Auth("API key is not configured".into()));
        }

        let nonce = Utc::now().timestamp_millis().to_string();
        let authent = Self::sign(
            credential.secret.expose_secret(),
            "",
            &nonce,
            ACCOUNTS_PATH,
        )?;
        let url = format!("{}{}", self.base_url, ACCOUNTS_PATH);

        debug!(account = %credential.name, url = %url, "Fetching Kraken Futures accounts");

        let resp = self
            .http
            .get(&url)
            .header("APIKey", &credential.api_key)
            .header("Nonce", &nonce)
            .header("Authent", authent)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::InvalidResponse(format!("Bad JSON: {e}")))?;

        // The API reports request-level failures in-band with HTTP 200.
        if payload.get("result").and_then(|r| r.as_str()) == Some("error") {
            let errors = payload
                .get("errors")
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unspecified".to_string());
            warn!(account = %credential.name, errors = %errors, "Kraken Futures returned an error result");
            return Err(ExchangeError::InvalidResponse(format!(
                "Error result: {errors}"
            )));
        }

        Ok(Self::unify(&payload))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accounts_payload() -> serde_json::Value {
        json!({
            "result": "success",
            "serverTime": "2026-08-08T10:00:00.000Z",
            "accounts": {
                "cash": {
                    "type": "cashAccount",
                    "balances": { "usd": "50.5", "xbt": 0.015 }
                },
                "flex": {
                    "type": "multiCollateralMarginAccount",
                    "balances": { "usd": 100.0 },
                    "auxiliary": { "af": 80.0, "pv": 100.0, "usd": 100.0 }
                },
                "fi_xbtusd": {
                    "type": "marginAccount",
                    "balances": { "xbt": "not-a-number" }
                }
            }
        })
    }

    #[test]
    fn test_unify_sums_per_currency_uppercased() {
        let snap = KrakenFuturesClient::unify(&accounts_payload());
        assert_eq!(snap.total.get("USD"), Some(&150.5));
        assert_eq!(snap.total.get("XBT"), Some(&0.015));
        assert!(snap.total.get("usd").is_none());
    }

    #[test]
    fn test_unify_drops_non_numeric_entries() {
        let snap = KrakenFuturesClient::unify(&accounts_payload());
        // fi_xbtusd's garbage balance must not create or poison XBT.
        assert_eq!(snap.total.get("XBT"), Some(&0.015));
    }

    #[test]
    fn test_unify_flex_auxiliary_feeds_free_and_used() {
        let snap = KrakenFuturesClient::unify(&accounts_payload());
        assert_eq!(snap.free.get("USD"), Some(&80.0));
        assert_eq!(snap.used.get("USD"), Some(&20.0));
    }

    #[test]
    fn test_unify_keeps_raw_payload_as_info() {
        let snap = KrakenFuturesClient::unify(&accounts_payload());
        let holding = snap
            .info
            .pointer("/accounts/cash/balances/usd")
            .and_then(|v| v.as_str());
        assert_eq!(holding, Some("50.5"));
    }

    #[test]
    fn test_unify_empty_payload() {
        let snap = KrakenFuturesClient::unify(&json!({ "result": "success" }));
        assert!(snap.total.is_empty());
        assert!(snap.free.is_empty());
    }

    #[test]
    fn test_numeric_parses_numbers_and_strings() {
        assert_eq!(KrakenFuturesClient::numeric(&json!(1.5)), Some(1.5));
        assert_eq!(KrakenFuturesClient::numeric(&json!("2.25")), Some(2.25));
        assert_eq!(KrakenFuturesClient::numeric(&json!(" 3 ")), Some(3.0));
        assert_eq!(KrakenFuturesClient::numeric(&json!("abc")), None);
        assert_eq!(KrakenFuturesClient::numeric(&json!(null)), None);
        assert_eq!(KrakenFuturesClient::numeric(&json!({"x": 1})), None);
    }

    #[test]
    fn test_sign_is_deterministic() {
        // "c2VjcmV0" is base64 for "secret".
        let a = KrakenFuturesClient::sign("c2VjcmV0", "", "1700000000000", ACCOUNTS_PATH).unwrap();
        let b = KrakenFuturesClient::sign("c2VjcmV0", "", "1700000000000", ACCOUNTS_PATH).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_sign_varies_with_nonce() {
        let a = KrakenFuturesClient::sign("c2VjcmV0", "", "1700000000000", ACCOUNTS_PATH).unwrap();
        let b = KrakenFuturesClient::sign("c2VjcmV0", "", "1700000000001", ACCOUNTS_PATH).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sign_rejects_bad_secret() {
        let err = KrakenFuturesClient::sign("!!!not-base64!!!", "", "1", ACCOUNTS_PATH);
        assert!(matches!(err, Err(ExchangeError::Auth(_))));
    }

    #[tokio::test]
    async fn test_fetch_with_empty_key_fails_before_any_request() {
        let client = KrakenFuturesClient::new().unwrap();
        let cred = AccountCredential::new("Master", "", "");
        let err = client.fetch_balance(&cred).await;
        assert!(matches!(err, Err(ExchangeError::Auth(_))));
    }

    #[test]
    fn test_client_name() {
        let client = KrakenFuturesClient::new().unwrap();
        assert_eq!(client.name(), "krakenfutures");
    }
}
