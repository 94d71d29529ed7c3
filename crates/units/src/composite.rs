//! Composite units: multisets of `(unit token, integer power)`.
//!
//! Spec.md 3.2/3.3: "Composite units are multisets of (unit, integer
//! power)" and a `Quantity`'s composite unit is "always in simplified
//! canonical form (like-components combined, zero powers dropped)".

use std::collections::BTreeMap;
use std::fmt;

/// A simplified product of unit tokens raised to integer powers, e.g.
/// `{"m": 1, "s": -1}` for `m/s`, or `{}` for a dimensionless quantity.
///
/// Tokens are kept as typed (post-prefix, post-alias-resolution) strings
/// rather than re-resolved `UnitDef`s, so the same `CompositeUnit` can carry
/// either a built-in symbol or a user alias name — resolution against the
/// registry happens only when dimension/conversion math is needed.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeUnit {
    parts: BTreeMap<String, i32>,
}

impl CompositeUnit {
    pub fn dimensionless() -> Self {
        Self {
            parts: BTreeMap::new(),
        }
    }

    pub fn single(token: impl Into<String>) -> Self {
        let mut parts = BTreeMap::new();
        parts.insert(token.into(), 1);
        Self { parts }
    }

    pub fn single_pow(token: impl Into<String>, power: i32) -> Self {
        if power == 0 {
            return Self::dimensionless();
        }
        let mut parts = BTreeMap::new();
        parts.insert(token.into(), power);
        Self { parts }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, i32)> {
        self.parts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Single-component composite units (power 1) report their bare token;
    /// used by evaluators that need to know "is this exactly one unit".
    pub fn as_single(&self) -> Option<&str> {
        if self.parts.len() == 1 {
            let (tok, pow) = self.parts.iter().next().unwrap();
            if *pow == 1 {
                return Some(tok.as_str());
            }
        }
        None
    }

    pub fn mul(&self, other: &CompositeUnit) -> CompositeUnit {
        let mut parts = self.parts.clone();
        for (tok, pow) in &other.parts {
            let entry = parts.entry(tok.clone()).or_insert(0);
            *entry += pow;
        }
        parts.retain(|_, p| *p != 0);
        CompositeUnit { parts }
    }

    pub fn div(&self, other: &CompositeUnit) -> CompositeUnit {
        let mut parts = self.parts.clone();
        for (tok, pow) in &other.parts {
            let entry = parts.entry(tok.clone()).or_insert(0);
            *entry -= pow;
        }
        parts.retain(|_, p| *p != 0);
        CompositeUnit { parts }
    }

    pub fn pow(&self, exponent: i32) -> CompositeUnit {
        if exponent == 0 {
            return CompositeUnit::dimensionless();
        }
        let parts = self
            .parts
            .iter()
            .map(|(tok, pow)| (tok.clone(), pow * exponent))
            .collect();
        CompositeUnit { parts }
    }
}

impl fmt::Display for CompositeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return Ok(());
        }
        let mut numerator: Vec<(&String, i32)> = Vec::new();
        let mut denominator: Vec<(&String, i32)> = Vec::new();
        for (tok, pow) in &self.parts {
            if *pow > 0 {
                numerator.push((tok, *pow));
            } else {
                denominator.push((tok, -*pow));
            }
        }
        let render = |items: &[(&String, i32)]| -> String {
            items
                .iter()
                .map(|(tok, pow)| {
                    if *pow == 1 {
                        tok.to_string()
                    } else {
                        format!("{tok}^{pow}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\u{b7}")
        };
        if numerator.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", render(&numerator))?;
        }
        if !denominator.is_empty() {
            write!(f, "/{}", render(&denominator))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_combines_like_components() {
        let m = CompositeUnit::single("m");
        let s_inv = CompositeUnit::single_pow("s", -1);
        let v = m.mul(&s_inv);
        assert_eq!(v.to_string(), "m/s");
    }

    #[test]
    fn div_cancels_to_dimensionless() {
        let m = CompositeUnit::single("m");
        let also_m = CompositeUnit::single("m");
        assert!(m.div(&also_m).is_dimensionless());
    }

    #[test]
    fn pow_scales_every_component() {
        let m_per_s = CompositeUnit::single("m").mul(&CompositeUnit::single_pow("s", -1));
        let squared = m_per_s.pow(2);
        assert_eq!(squared.to_string(), "m^2/s^2");
    }
}
