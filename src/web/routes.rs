//! Route handlers.
//!
//! Two report routes share one pipeline: build the credential list,
//! fetch balances sequentially, aggregate, render. The single-tenant
//! route gets its credentials and stake from state; the multi-tenant
//! route resolves them from the remote directory per request.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use super::{render, AppError, SharedState};
use crate::directory::resolve;
use crate::report::{fetch_account_balances, ReportSummary};
use crate::types::AccountCredential;

/// GET / renders the report for the fixed env-configured accounts.
pub async fn single_tenant_report(
    State(state): State<SharedState>,
) -> Result<Html<String>, AppError> {
    let page = build_report(&state, None, &state.accounts, state.initial_stake).await;
    Ok(Html(page))
}

/// GET /:username renders the report for a directory-configured user.
///
/// A directory failure propagates as 500; an unknown username renders
/// the not-found page without fetching any balances.
pub async fn user_report(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let records = state.directory.fetch_accounts().await?;

    let Some(record) = resolve(&records, &username) else {
        info!(username = %username, "User not found in account directory");
        return Ok((
            StatusCode::NOT_FOUND,
            Html(render::user_not_found_page(&username)),
        )
            .into_response());
    };

    let accounts = record.credentials();
    let page = build_report(&state, Some(&username), &accounts, record.initial_stake).await;
    Ok(Html(page).into_response())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The shared fetch → aggregate → render sequence.
async fn build_report(
    state: &SharedState,
    username: Option<&str>,
    accounts: &[AccountCredential],
    initial_stake: f64,
) -> String {
    let rows = fetch_account_balances(state.provider.as_ref(), accounts).await;
    let summary = ReportSummary::build(&rows, initial_stake);

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    info!(
        user = username.unwrap_or("-"),
        accounts = rows.len(),
        failed,
        total_usd = summary.total_usd,
        profit = summary.profit,
        "Report rendered"
    );

    render::report_page(username, &rows, &summary)
}
