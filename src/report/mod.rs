//! Balance report pipeline.
//!
//! `fetcher` walks an ordered credential list through a balance
//! provider and normalises each result into a per-account row;
//! `summary` folds the rows into the totals and P/L figures the page
//! displays.

pub mod fetcher;
pub mod summary;

pub use fetcher::fetch_account_balances;
pub use summary::ReportSummary;
