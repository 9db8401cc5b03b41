//! Human-readable document id allocation (SO001, PO002, ...).
//!
//! The allocator is a pure function over the ids a tenant already holds for
//! a document type. The enclosing creation transaction pairs it with the
//! unique index on (tenant_id, human_id) and retries on a uniqueness
//! violation, which makes the scan-then-increment safe under concurrency.

use chrono::{DateTime, Utc};

/// Allocate the next id for a prefix given the tenant's existing ids.
///
/// Numeric suffixes are zero-padded to three digits and grow past 999
/// naturally. When prior ids exist but none carries a parseable suffix, a
/// time-derived suffix keeps creation moving instead of failing.
pub fn next_human_id(prefix: &str, existing: &[String], now: DateTime<Utc>) -> String {
    let suffixes: Vec<u64> = existing
        .iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .collect();

    if suffixes.is_empty() && !existing.is_empty() {
        return format!("{}{}", prefix, now.timestamp() % 1_000_000);
    }

    let next = suffixes.into_iter().max().unwrap_or(0) + 1;
    format!("{}{:03}", prefix, next)
}
