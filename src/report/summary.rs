//! Report aggregation: totals and profit/loss against the stake.

use serde::Serialize;

use crate::types::AccountBalance;

/// The headline figures rendered under the per-account list.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Sum of every account's `sum_usd`.
    pub total_usd: f64,
    pub initial_stake: f64,
    pub profit: f64,
    /// Profit as a percentage of the stake; 0 when the stake is 0.
    pub profit_pct: f64,
}

impl ReportSummary {
    /// Fold per-account rows into the headline figures.
    ///
    /// Failed rows carry `sum_usd == 0.0`, so they contribute nothing.
    /// A zero stake yields a zero percentage rather than dividing.
    pub fn build(results: &[AccountBalance], initial_stake: f64) -> Self {
        let total_usd: f64 = results.iter().map(|r| r.sum_usd).sum();
        let profit = total_usd - initial_stake;
        let profit_pct = if initial_stake != 0.0 {
            profit / initial_stake * 100.0
        } else {
            0.0
        };

        Self {
            total_usd,
            initial_stake,
            profit,
            profit_pct,
        }
    }

    /// Whether the report is at or above the stake.
    pub fn in_profit(&self) -> bool {
        self.profit >= 0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountBalance, BalanceTables};

    fn row(name: &str, sum_usd: f64) -> AccountBalance {
        AccountBalance {
            account: name.into(),
            balance: Some(BalanceTables::default()),
            error: None,
            total_usd: sum_usd,
            info_usd: 0.0,
            sum_usd,
        }
    }

    #[test]
    fn test_total_is_sum_of_rows() {
        let rows = vec![row("a", 1000.0), row("b", 2000.0), row("c", 2200.0)];
        let summary = ReportSummary::build(&rows, 5000.0);
        assert!((summary.total_usd - 5200.0).abs() < 1e-10);
    }

    #[test]
    fn test_profit_and_percent() {
        let rows = vec![row("a", 5200.0)];
        let summary = ReportSummary::build(&rows, 5000.0);
        assert!((summary.profit - 200.0).abs() < 1e-10);
        assert!((summary.profit_pct - 4.0).abs() < 1e-10);
        assert!(summary.in_profit());
    }

    #[test]
    fn test_loss_is_negative() {
        let rows = vec![row("a", 4500.0)];
        let summary = ReportSummary::build(&rows, 5000.0);
        assert!((summary.profit - -500.0).abs() < 1e-10);
        assert!(!summary.in_profit());
    }

    #[test]
    fn test_zero_stake_yields_zero_percent() {
        let rows = vec![row("a", 5200.0)];
        let summary = ReportSummary::build(&rows, 0.0);
        assert_eq!(summary.profit_pct, 0.0);
        assert!((summary.profit - 5200.0).abs() < 1e-10);
    }

    #[test]
    fn test_failed_rows_contribute_zero() {
        let rows = vec![
            row("a", 1500.0),
            AccountBalance::failed("b", "request timed out"),
        ];
        let summary = ReportSummary::build(&rows, 1000.0);
        assert!((summary.total_usd - 1500.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_report() {
        let summary = ReportSummary::build(&[], 5000.0);
        assert_eq!(summary.total_usd, 0.0);
        assert!((summary.profit - -5000.0).abs() < 1e-10);
    }
}
