//! Server-side HTML rendering.
//!
//! The pages are deliberately plain: one self-contained document per
//! request, no client-side code, a few inline styles. Anything that
//! originates outside this process (usernames, error messages,
//! currency codes) is escaped before interpolation.

use std::fmt::Write as _;

use crate::report::ReportSummary;
use crate::types::AccountBalance;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0}\
main{display:flex;min-height:100vh;flex-direction:column;align-items:center;padding:6rem}\
li{margin-bottom:2rem;list-style:none}\
.error{color:#c00}\
.profit{color:#080;font-weight:bold}\
.loss{color:#c00;font-weight:bold}\
.total{margin-top:2rem;font-weight:bold;font-size:1.1rem}\
.stake{margin-top:1rem;font-weight:bold}";

/// Render the balance report page.
///
/// `username` is present on the multi-tenant route and becomes the
/// page heading.
pub fn report_page(
    username: Option<&str>,
    rows: &[AccountBalance],
    summary: &ReportSummary,
) -> String {
    let mut page = String::with_capacity(2048);
    page.push_str("<!doctype html><html><head><meta charset=\"utf-8\">");
    page.push_str("<title>stakeboard</title>");
    let _ = write!(page, "<style>{STYLE}</style>");
    page.push_str("</head><body><main>");

    if let Some(name) = username {
        let _ = write!(page, "<h1>Account: {}</h1>", escape_html(name));
    }

    page.push_str("<ul>");
    for row in rows {
        let _ = write!(page, "<li><strong>{}:</strong>", escape_html(&row.account));
        match (&row.error, &row.balance) {
            (Some(error), _) => {
                let _ = write!(page, " <span class=\"error\">Error: {}</span>", escape_html(error));
            }
            (None, Some(_)) => {
                let _ = write!(
                    page,
                    "<div><strong>Futures USD (total.USD):</strong> {}</div>\
                     <div><strong>Holding USD (accounts.cash.balances.usd):</strong> {}</div>\
                     <div><strong>SUM USD:</strong> {}</div>",
                    row.total_usd, row.info_usd, row.sum_usd
                );
            }
            (None, None) => {}
        }
        page.push_str("</li>");
    }
    page.push_str("</ul>");

    let _ = write!(
        page,
        "<div class=\"total\">TOTAL USD from all accounts: {}</div>\
         <div class=\"stake\">Initial stake: {} USD</div>",
        summary.total_usd, summary.initial_stake
    );

    let (class, label) = if summary.in_profit() {
        ("profit", "PROFIT")
    } else {
        ("loss", "LOSS")
    };
    let _ = write!(
        page,
        "<div class=\"{class}\">{label}: {:.2} USD ({:.2}%)</div>",
        summary.profit, summary.profit_pct
    );

    page.push_str("</main></body></html>");
    page
}

/// Render the full-page "user not found" view.
pub fn user_not_found_page(username: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>stakeboard</title><style>{STYLE}</style></head>\
         <body><main><div class=\"error\">User \"{}\" not found</div></main></body></html>",
        escape_html(username)
    )
}

/// Minimal HTML escaping for text interpolated into markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BalanceTables;

    fn ok_row(name: &str, total: f64, info: f64) -> AccountBalance {
        AccountBalance {
            account: name.into(),
            balance: Some(BalanceTables::default()),
            error: None,
            total_usd: total,
            info_usd: info,
            sum_usd: total + info,
        }
    }

    #[test]
    fn test_report_page_shows_profit_line() {
        let rows = vec![ok_row("Master", 5200.0, 0.0)];
        let summary = ReportSummary::build(&rows, 5000.0);
        let html = report_page(None, &rows, &summary);

        assert!(html.contains("PROFIT: 200.00 USD (4.00%)"));
        assert!(html.contains("TOTAL USD from all accounts: 5200"));
        assert!(html.contains("Initial stake: 5000 USD"));
        assert!(html.contains("class=\"profit\""));
    }

    #[test]
    fn test_report_page_shows_loss_line() {
        let rows = vec![ok_row("Master", 4000.0, 0.0)];
        let summary = ReportSummary::build(&rows, 5000.0);
        let html = report_page(None, &rows, &summary);

        assert!(html.contains("LOSS: -1000.00 USD (-20.00%)"));
        assert!(html.contains("class=\"loss\""));
    }

    #[test]
    fn test_report_page_per_account_figures() {
        let rows = vec![ok_row("Subaccount 2", 100.0, 50.5)];
        let summary = ReportSummary::build(&rows, 0.0);
        let html = report_page(None, &rows, &summary);

        assert!(html.contains("<strong>Subaccount 2:</strong>"));
        assert!(html.contains("Futures USD (total.USD):</strong> 100"));
        assert!(html.contains("Holding USD (accounts.cash.balances.usd):</strong> 50.5"));
        assert!(html.contains("SUM USD:</strong> 150.5"));
    }

    #[test]
    fn test_report_page_inline_error_row() {
        let rows = vec![
            ok_row("Master", 10.0, 0.0),
            AccountBalance::failed("Subaccount 1", "request timed out"),
        ];
        let summary = ReportSummary::build(&rows, 0.0);
        let html = report_page(None, &rows, &summary);

        assert!(html.contains("Error: request timed out"));
        // The failing row must not render balance figures.
        assert_eq!(html.matches("SUM USD").count(), 1);
    }

    #[test]
    fn test_report_page_heading_for_user() {
        let rows = vec![ok_row("Master", 1.0, 0.0)];
        let summary = ReportSummary::build(&rows, 0.0);
        let html = report_page(Some("alice"), &rows, &summary);
        assert!(html.contains("<h1>Account: alice</h1>"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let rows = vec![AccountBalance::failed("Master", "<script>alert(1)</script>")];
        let summary = ReportSummary::build(&rows, 0.0);
        let html = report_page(None, &rows, &summary);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_not_found_page_escapes_username() {
        let html = user_not_found_page("<img src=x>");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x&gt;"));
        assert!(html.contains("not found"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
