//! Exchange connectivity.
//!
//! Defines the `BalanceProvider` trait and provides the live
//! Kraken Futures implementation. The trait is the seam that keeps
//! report building testable without credentials or network access:
//! given a credential, an implementor returns a unified balance
//! snapshot, nothing more.

pub mod kraken_futures;

use async_trait::async_trait;

use crate::types::{AccountCredential, BalanceSnapshot, ExchangeError};

/// Abstraction over exchange balance sources.
///
/// One instance serves any number of credentials; the credential is
/// passed per call so five sub-accounts share a single HTTP client.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Fetch the balance snapshot for one credentialed sub-account.
    async fn fetch_balance(
        &self,
        credential: &AccountCredential,
    ) -> Result<BalanceSnapshot, ExchangeError>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
