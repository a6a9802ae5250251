//! Sequential balance fetching and USD extraction.
//!
//! One row comes back per credential, in input order. A failed account
//! is caught, logged and rendered inline; it never aborts the rest of
//! the list.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::exchange::BalanceProvider;
use crate::types::{AccountBalance, AccountCredential, BalanceSnapshot, BalanceTables};

/// JSON pointer to the venue's cash-account USD holding inside the raw
/// payload.
const INFO_USD_POINTER: &str = "/accounts/cash/balances/usd";

/// Fetch balances for an ordered credential list.
///
/// Accounts are awaited one at a time; total latency is linear in the
/// account count. The output has the same length and order as the
/// input.
pub async fn fetch_account_balances(
    provider: &dyn BalanceProvider,
    accounts: &[AccountCredential],
) -> Vec<AccountBalance> {
    let mut results = Vec::with_capacity(accounts.len());

    for credential in accounts {
        match provider.fetch_balance(credential).await {
            Ok(snapshot) => {
                let row = into_row(&credential.name, &snapshot);
                debug!(account = %credential.name, sum_usd = row.sum_usd, "Balance fetched");
                results.push(row);
            }
            Err(e) => {
                warn!(
                    account = %credential.name,
                    provider = provider.name(),
                    error = %e,
                    "Balance fetch failed, continuing with remaining accounts"
                );
                results.push(AccountBalance::failed(&credential.name, e.to_string()));
            }
        }
    }

    results
}

/// Extract the USD figures and filtered tables from one snapshot.
fn into_row(account: &str, snapshot: &BalanceSnapshot) -> AccountBalance {
    let total_usd = usd_from_total(&snapshot.total);
    let info_usd = usd_from_info(account, &snapshot.info);

    AccountBalance {
        account: account.to_string(),
        balance: Some(BalanceTables {
            total: filter_finite(&snapshot.total),
            free: filter_finite(&snapshot.free),
            used: filter_finite(&snapshot.used),
        }),
        error: None,
        total_usd,
        info_usd,
        sum_usd: total_usd + info_usd,
    }
}

/// The "USD" entry of the unified `total` map, or 0 when absent or
/// non-finite.
fn usd_from_total(total: &HashMap<String, f64>) -> f64 {
    total
        .get("USD")
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// The nested cash-account USD holding, parsed from a JSON number or
/// string. A missing path at any level yields 0 silently. A value that
/// is present but unparseable also yields 0, with a warning, since it
/// usually means the venue changed its payload.
fn usd_from_info(account: &str, info: &serde_json::Value) -> f64 {
    let Some(value) = info.pointer(INFO_USD_POINTER) else {
        return 0.0;
    };

    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed.filter(|v| v.is_finite()) {
        Some(v) => v,
        None => {
            warn!(account, value = %value, "Cash USD holding present but unparseable, treating as 0");
            0.0
        }
    }
}

/// Keep only entries whose value is a finite number.
fn filter_finite(map: &HashMap<String, f64>) -> HashMap<String, f64> {
    map.iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
