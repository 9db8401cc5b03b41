//! Payment terms and due-date derivation.

use chrono::{Days, NaiveDate};

const DEFAULT_NET_DAYS: u64 = 30;

/// Number of days a term grants before payment falls due.
///
/// Accepts the spellings seen in the wild: "net 30", "net30", "net_30",
/// "immediate", "advance", "cash on delivery", "cod", "due on receipt".
/// Unknown terms default to net-30.
pub fn net_days(terms: &str) -> u64 {
    let normalized = terms.trim().to_lowercase().replace(['-', '_'], " ");
    match normalized.as_str() {
        "immediate" | "advance" | "cash on delivery" | "cod" | "due on receipt" => 0,
        other => other
            .strip_prefix("net")
            .and_then(|rest| rest.trim().parse().ok())
            .unwrap_or(DEFAULT_NET_DAYS),
    }
}

/// Derive a due date from optional payment terms and the issue date.
pub fn due_date_for_terms(terms: Option<&str>, issue_date: NaiveDate) -> NaiveDate {
    let days = terms.map(net_days).unwrap_or(DEFAULT_NET_DAYS);
    issue_date
        .checked_add_days(Days::new(days))
        .unwrap_or(issue_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn net_terms_add_their_days() {
        let issue = date("2026-01-10");
        assert_eq!(due_date_for_terms(Some("net 15"), issue), date("2026-01-25"));
        assert_eq!(due_date_for_terms(Some("Net30"), issue), date("2026-02-09"));
        assert_eq!(due_date_for_terms(Some("net_45"), issue), date("2026-02-24"));
    }

    #[test]
    fn immediate_terms_fall_due_on_issue() {
        let issue = date("2026-03-01");
        for terms in ["immediate", "advance", "cash on delivery", "cod", "COD"] {
            assert_eq!(due_date_for_terms(Some(terms), issue), issue);
        }
    }

    #[test]
    fn missing_or_unknown_terms_default_to_net_30() {
        let issue = date("2026-01-01");
        assert_eq!(due_date_for_terms(None, issue), date("2026-01-31"));
        assert_eq!(
            due_date_for_terms(Some("handshake deal"), issue),
            date("2026-01-31")
        );
    }

    #[test]
    fn net_with_garbage_days_defaults() {
        assert_eq!(net_days("net soon"), 30);
        assert_eq!(net_days("net 0"), 0);
    }
}
