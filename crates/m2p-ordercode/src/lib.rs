//! m2p-ordercode
//!
//! Canonical order-code extraction from free-form MES order strings.
//!
//! MES stores the sales order reference as free text. Split shipments and
//! line items are encoded as a `-<digit>-<digit>` suffix on the order code
//! (`ABC-123-1-2` is line 1, split 2 of order `ABC-123`), and operators
//! occasionally append notes after the code. PLUS keys its serial registries
//! by the *order-level* code, so the suffix must be stripped before the two
//! sides can be joined.

use once_cell::sync::Lazy;
use regex::Regex;

/// Order code carrying a `-<digit>-<digit>` line/split suffix. The capture
/// group is the order-level code; the suffix is matched but not captured.
static SUFFIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Z0-9-]*)-[0-9]-[0-9]").expect("suffixed pattern"));

/// Plain order code: leftmost run of uppercase letters, digits and hyphens
/// starting with a letter.
static PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][A-Z0-9-]*").expect("plain pattern"));

/// Extract the canonical order code from a raw order string.
///
/// Total: when neither pattern matches, the input is returned verbatim so a
/// malformed order string still produces a usable (if unmatchable) key.
pub fn extract(raw: &str) -> String {
    if let Some(caps) = SUFFIXED.captures(raw) {
        return caps[1].to_string();
    }
    if let Some(m) = PLAIN.find(raw) {
        return m.as_str().to_string();
    }
    raw.to_string()
}
