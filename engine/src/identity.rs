//! Identity keys for matching contacts across origins.
//!
//! Two records match iff their normalized phone numbers are equal. There is
//! no fuzzy matching and no country-code inference: `+15551234567` and
//! `5551234567` are different keys.

use crate::{ContactRecord, NormalizedPhone};

/// Normalize a phone number to digits with an optional leading `+`.
///
/// The `+` survives only when it appears before the first digit. Returns
/// `None` when no digits remain.
pub fn normalize_phone(raw: &str) -> Option<NormalizedPhone> {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && out.is_empty() {
            out.push('+');
        }
    }

    if out.chars().any(|c| c.is_ascii_digit()) {
        Some(out)
    } else {
        None
    }
}

/// Derive the matching key of a record.
pub fn key(record: &ContactRecord) -> Option<NormalizedPhone> {
    normalize_phone(&record.phone)
}
