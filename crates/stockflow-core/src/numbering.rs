//! # Transaction Numbering
//!
//! Human-readable numbers of the form `PPP-YYYY-NNNN`:
//!
//! ```text
//!   STG-2026-0042
//!   ─┬─ ─┬── ─┬──
//!    │   │    └── sequence, zero-padded to 4, grows past 9999 unpadded
//!    │   └─────── year of creation
//!    └─────────── type code: STG receipt, STC issue, STT transfer, STS count
//! ```
//!
//! The store lookup of the latest existing number belongs to the engine;
//! everything here is string work.

use crate::types::TransactionType;
use crate::NUMBER_SUFFIX_WIDTH;

/// Fixed three-letter code of a transaction type.
pub const fn type_code(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Receipt => "STG",
        TransactionType::Issue => "STC",
        TransactionType::Transfer => "STT",
        TransactionType::Count => "STS",
    }
}

/// Prefix shared by all numbers of one type and year, including the
/// trailing dash: `STG-2026-`.
pub fn number_prefix(transaction_type: TransactionType, year: i32) -> String {
    format!("{}-{}-", type_code(transaction_type), year)
}

/// Formats a full number from a prefix and a sequence value.
pub fn format_number(prefix: &str, sequence: u32) -> String {
    format!("{}{:0width$}", prefix, sequence, width = NUMBER_SUFFIX_WIDTH)
}

/// Sequence value of `number` if it carries `prefix` and a numeric suffix.
pub fn parse_sequence(number: &str, prefix: &str) -> Option<u32> {
    number.strip_prefix(prefix)?.parse::<u32>().ok()
}

/// Number that follows `latest` under `prefix`.
///
/// An absent or unparseable `latest` restarts the sequence at 1 rather than
/// blocking creation.
///
/// ## Example
/// ```rust
/// use stockflow_core::numbering::next_number;
///
/// assert_eq!(next_number("STG-2026-", Some("STG-2026-0041")), "STG-2026-0042");
/// assert_eq!(next_number("STG-2026-", None), "STG-2026-0001");
/// ```
pub fn next_number(prefix: &str, latest: Option<&str>) -> String {
    let next = latest
        .and_then(|n| parse_sequence(n, prefix))
        .map(|seq| seq.saturating_add(1))
        .unwrap_or(1);
    format_number(prefix, next)
}
