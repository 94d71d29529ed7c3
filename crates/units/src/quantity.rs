//! Quantity arithmetic: value + composite-unit pairs.
//!
//! Grounded on `ferrum-ucum/src/quantity.rs`'s `normalize`/`normalize_to`
//! shape (resolve a unit, move a value to/from its SI base, apply a target
//! unit) but generalized to the full add/sub/mul/div/pow surface spec.md
//! 4.5 asks for, since UCUM's `Quantity` is read-only display data and this
//! one is a first-class arithmetic value.

use crate::composite::CompositeUnit;
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::registry::Category;
use crate::resolver::{Resolver, ResolvedComposite};

#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: CompositeUnit,
}

/// Imperial-family tokens that lose to a plain SI unit when spec.md 4.5's
/// "across systems, SI wins" rule applies to `+`/`-`.
const IMPERIAL_TOKENS: &[&str] = &["mi", "ft", "yd", "in", "lb", "oz", "gal", "psi", "hp"];

fn is_imperial(token: &str) -> bool {
    IMPERIAL_TOKENS.contains(&token)
}

impl Quantity {
    pub fn new(value: f64, unit: CompositeUnit) -> Self {
        Self { value, unit }
    }

    fn to_base(resolved: &ResolvedComposite, value: f64) -> f64 {
        value * resolved.to_base_factor + resolved.to_base_offset
    }

    fn from_base(resolved: &ResolvedComposite, base_value: f64) -> f64 {
        (base_value - resolved.to_base_offset) / resolved.to_base_factor
    }

    pub fn convert_to(&self, target: &CompositeUnit, resolver: &Resolver) -> Result<Quantity> {
        let from = resolver.resolve_composite(&self.unit)?;
        let to = resolver.resolve_composite(target)?;
        if from.dimension != to.dimension {
            return Err(Error::IncompatibleUnits {
                left: self.unit.to_string(),
                right: target.to_string(),
            });
        }
        let base = Self::to_base(&from, self.value);
        Ok(Quantity::new(Self::from_base(&to, base), target.clone()))
    }

    pub fn add(&self, other: &Quantity, resolver: &Resolver) -> Result<Quantity> {
        let from = resolver.resolve_composite(&self.unit)?;
        let to = resolver.resolve_composite(&other.unit)?;

        if let Some(result) = Self::temperature_combine(self, other, &from, &to, true)? {
            return Ok(result);
        }

        if from.dimension != to.dimension {
            return Err(Error::IncompatibleUnits {
                left: self.unit.to_string(),
                right: other.unit.to_string(),
            });
        }

        let target_unit = Self::preferred_unit(&self.unit, &other.unit);
        let converted_self = self.convert_to(&target_unit, resolver)?;
        let converted_other = other.convert_to(&target_unit, resolver)?;
        Ok(Quantity::new(
            converted_self.value + converted_other.value,
            target_unit,
        ))
    }

    pub fn sub(&self, other: &Quantity, resolver: &Resolver) -> Result<Quantity> {
        let from = resolver.resolve_composite(&self.unit)?;
        let to = resolver.resolve_composite(&other.unit)?;

        if let Some(result) = Self::temperature_combine(self, other, &from, &to, false)? {
            return Ok(result);
        }

        if from.dimension != to.dimension {
            return Err(Error::IncompatibleUnits {
                left: self.unit.to_string(),
                right: other.unit.to_string(),
            });
        }

        let target_unit = Self::preferred_unit(&self.unit, &other.unit);
        let converted_self = self.convert_to(&target_unit, resolver)?;
        let converted_other = other.convert_to(&target_unit, resolver)?;
        Ok(Quantity::new(
            converted_self.value - converted_other.value,
            target_unit,
        ))
    }

    /// Implements spec.md 4.5's temperature quirks. Returns `Ok(None)` when
    /// neither side is an affine temperature unit, so the caller falls
    /// through to ordinary dimension-checked arithmetic.
    fn temperature_combine(
        left: &Quantity,
        right: &Quantity,
        left_resolved: &ResolvedComposite,
        right_resolved: &ResolvedComposite,
        is_add: bool,
    ) -> Result<Option<Quantity>> {
        let left_affine = left_resolved.category == Some(Category::Temperature)
            && left_resolved.to_base_offset != 0.0;
        let right_affine = right_resolved.category == Some(Category::Temperature)
            && right_resolved.to_base_offset != 0.0;

        if !left_affine && !right_affine {
            return Ok(None);
        }

        if left_affine && right_affine {
            if is_add {
                return Err(Error::IncompatibleUnits {
                    left: left.unit.to_string(),
                    right: right.unit.to_string(),
                });
            }
            // °C − °C (or °F − °F, or mixed): documented quirk — the raw
            // numeric difference is kept and displayed in the left unit
            // rather than re-expressed as a pure Kelvin delta.
            return Ok(Some(Quantity::new(left.value - right.value, left.unit.clone())));
        }

        // Exactly one side is an affine absolute temperature; the other is
        // a relative (delta) reading in a non-offset unit of the same
        // dimension (e.g. `K` used as a delta against `°C`).
        if !is_add {
            return Err(Error::IncompatibleUnits {
                left: left.unit.to_string(),
                right: right.unit.to_string(),
            });
        }
        let (absolute, absolute_resolved, delta, delta_resolved, unit) = if left_affine {
            (left, left_resolved, right, right_resolved, left.unit.clone())
        } else {
            (right, right_resolved, left, left_resolved, right.unit.clone())
        };
        if absolute_resolved.dimension != delta_resolved.dimension {
            return Err(Error::IncompatibleUnits {
                left: left.unit.to_string(),
                right: right.unit.to_string(),
            });
        }
        let delta_in_absolute_unit = delta.value / absolute_resolved.to_base_factor
            * delta_resolved.to_base_factor;
        Ok(Some(Quantity::new(absolute.value + delta_in_absolute_unit, unit)))
    }

    fn preferred_unit(left: &CompositeUnit, right: &CompositeUnit) -> CompositeUnit {
        if let (Some(l), Some(r)) = (left.as_single(), right.as_single()) {
            if is_imperial(l) && !is_imperial(r) {
                return right.clone();
            }
        }
        left.clone()
    }

    pub fn mul_scalar(&self, scalar: f64) -> Quantity {
        Quantity::new(self.value * scalar, self.unit.clone())
    }

    pub fn div_scalar(&self, scalar: f64) -> Result<Quantity> {
        if scalar == 0.0 {
            return Err(Error::DivisionByZero);
        }
        Ok(Quantity::new(self.value / scalar, self.unit.clone()))
    }

    pub fn mul(&self, other: &Quantity) -> Quantity {
        Quantity::new(self.value * other.value, self.unit.mul(&other.unit))
    }

    pub fn div(&self, other: &Quantity) -> Result<Quantity> {
        if other.value == 0.0 {
            return Err(Error::DivisionByZero);
        }
        Ok(Quantity::new(self.value / other.value, self.unit.div(&other.unit)))
    }

    /// Raises to a rational exponent `numerator/denominator`. Every
    /// component power of the composite unit must be evenly divisible by
    /// `denominator`, matching spec.md 4.5: "fractional exponents allowed
    /// only when every component power is divisible."
    pub fn pow_rational(&self, numerator: i32, denominator: i32) -> Result<Quantity> {
        if denominator == 0 {
            return Err(Error::DivisionByZero);
        }
        for (_, power) in self.unit.parts() {
            if (power * numerator) % denominator != 0 {
                return Err(Error::NonNumericExponent(numerator as f64 / denominator as f64));
            }
        }
        let new_unit_parts: Vec<(String, i32)> = self
            .unit
            .parts()
            .map(|(tok, pow)| (tok.to_string(), (pow * numerator) / denominator))
            .collect();
        let mut unit = CompositeUnit::dimensionless();
        for (tok, pow) in new_unit_parts {
            unit = unit.mul(&CompositeUnit::single_pow(tok, pow));
        }
        let value = self.value.powf(numerator as f64 / denominator as f64);
        if value.is_nan() || value.is_infinite() {
            return Err(Error::Overflow);
        }
        Ok(Quantity::new(value, unit))
    }

    pub fn dimension(&self, resolver: &Resolver) -> Result<Dimension> {
        Ok(resolver.resolve_composite(&self.unit)?.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;

    fn resolver(aliases: &AliasTable) -> Resolver<'_> {
        Resolver::new(aliases)
    }

    #[test]
    fn feet_to_meters_matches_scenario() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let q = Quantity::new(100.0, CompositeUnit::single("ft"));
        let converted = q.convert_to(&CompositeUnit::single("m"), &r).unwrap();
        assert!((converted.value - 30.48).abs() < 1e-9);
    }

    #[test]
    fn km_plus_m_prefers_left_si_unit() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let km = Quantity::new(1.0, CompositeUnit::single("km"));
        let m = Quantity::new(500.0, CompositeUnit::single("m"));
        let sum = km.add(&m, &r).unwrap();
        assert_eq!(sum.unit.to_string(), "km");
        assert!((sum.value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn imperial_plus_si_prefers_si() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let one_ft = Quantity::new(1.0, CompositeUnit::single("ft"));
        let one_m = Quantity::new(1.0, CompositeUnit::single("m"));
        let sum = one_ft.add(&one_m, &r).unwrap();
        assert_eq!(sum.unit.to_string(), "m");
    }

    #[test]
    fn celsius_plus_kelvin_delta_stays_celsius() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let c = Quantity::new(20.0, CompositeUnit::single("C"));
        let k_delta = Quantity::new(5.0, CompositeUnit::single("K"));
        let sum = c.add(&k_delta, &r).unwrap();
        assert_eq!(sum.unit.to_string(), "C");
        assert!((sum.value - 25.0).abs() < 1e-9);
    }

    #[test]
    fn celsius_plus_celsius_errors() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let a = Quantity::new(20.0, CompositeUnit::single("C"));
        let b = Quantity::new(5.0, CompositeUnit::single("C"));
        assert!(a.add(&b, &r).is_err());
    }

    #[test]
    fn celsius_minus_celsius_keeps_left_unit_quirk() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let a = Quantity::new(30.0, CompositeUnit::single("C"));
        let b = Quantity::new(10.0, CompositeUnit::single("C"));
        let diff = a.sub(&b, &r).unwrap();
        assert_eq!(diff.unit.to_string(), "C");
        assert!((diff.value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn pow_rational_requires_divisible_powers() {
        let q = Quantity::new(9.0, CompositeUnit::single("m"));
        let root = q.pow_rational(1, 2).unwrap();
        assert!((root.value - 3.0).abs() < 1e-9);

        let per_second = Quantity::new(4.0, CompositeUnit::single_pow("s", -1));
        assert!(per_second.pow_rational(1, 2).is_err());
    }

    #[test]
    fn convert_roundtrip_within_tolerance() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let q = Quantity::new(42.0, CompositeUnit::single("mi"));
        let back = q
            .convert_to(&CompositeUnit::single("km"), &r)
            .unwrap()
            .convert_to(&CompositeUnit::single("mi"), &r)
            .unwrap();
        assert!((back.value - 42.0).abs() < 1e-9);
    }
}
