//! Currency code/symbol metadata used by the parser and formatter.
//!
//! Grounded on the same `phf_map!` static-table pattern as
//! `notecalc_units::registry` (and, upstream, `ferrum-fhirpath`'s function
//! table) — a small perfect hash keeping the ISO-code ↔ glyph mapping O(1)
//! and allocation-free.

use phf::phf_map;

/// ISO 4217 code → the glyph a compact literal like `$4` lexes to, when one
/// exists (spec.md 4.13: "prefer compact prefix when symbol is a glyph").
pub static GLYPHS: phf::Map<&'static str, &'static str> = phf_map! {
    "USD" => "$",
    "EUR" => "\u{20ac}",
    "GBP" => "\u{a3}",
    "JPY" => "\u{a5}",
};

pub fn glyph_for(code: &str) -> Option<&'static str> {
    GLYPHS.get(code).copied()
}

pub fn is_known_code(code: &str) -> bool {
    GLYPHS.contains_key(code)
        || matches!(
            code,
            "CNY" | "CAD" | "AUD" | "CHF" | "INR" | "MXN"
        )
}

/// A cached FX snapshot the host supplies through [`crate::context::EngineOptions`]
/// (spec.md 5: "any operation blocks ... currency conversion is read from a
/// cached snapshot passed into the context").
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FxSnapshot {
    pub base: String,
    pub rates: std::collections::HashMap<String, f64>,
    /// Unix seconds; display-only metadata, not used for staleness checks.
    pub fetched_at: i64,
}

impl FxSnapshot {
    /// Converts an `amount` in `from` to `to` via the snapshot's base
    /// currency. Returns `None` (→ `Error::RateUnavailable`) if either side
    /// is missing from the snapshot and isn't the base itself.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        if from == to {
            return Some(amount);
        }
        let from_rate = if from == self.base { 1.0 } else { *self.rates.get(from)? };
        let to_rate = if to == self.base { 1.0 } else { *self.rates.get(to)? };
        Some(amount / from_rate * to_rate)
    }
}
