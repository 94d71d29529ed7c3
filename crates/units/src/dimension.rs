//! Seven-base-SI dimension vectors.
//!
//! Mirrors the `DimensionVector` idea from UCUM (`ferrum-ucum/src/quantity.rs`
//! builds a canonical-unit map keyed by a similar fixed-width vector), but the
//! seven axes follow spec.md 3.1 (`length, mass, time, current, temperature,
//! amount, luminosity`) exactly rather than UCUM's `[m, g, s, rad, K, C, cd,
//! mol]` ordering.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A seven-base-SI dimension vector. Each component is the exponent of the
/// corresponding SI base dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension {
        length: 0,
        mass: 0,
        time: 0,
        current: 0,
        temperature: 0,
        amount: 0,
        luminosity: 0,
    };

    pub const LENGTH: Dimension = Dimension {
        length: 1,
        ..Self::DIMENSIONLESS
    };
    pub const MASS: Dimension = Dimension {
        mass: 1,
        ..Self::DIMENSIONLESS
    };
    pub const TIME: Dimension = Dimension {
        time: 1,
        ..Self::DIMENSIONLESS
    };
    pub const CURRENT: Dimension = Dimension {
        current: 1,
        ..Self::DIMENSIONLESS
    };
    pub const TEMPERATURE: Dimension = Dimension {
        temperature: 1,
        ..Self::DIMENSIONLESS
    };
    pub const AMOUNT: Dimension = Dimension {
        amount: 1,
        ..Self::DIMENSIONLESS
    };
    pub const LUMINOSITY: Dimension = Dimension {
        luminosity: 1,
        ..Self::DIMENSIONLESS
    };

    pub const AREA: Dimension = Dimension {
        length: 2,
        ..Self::DIMENSIONLESS
    };
    pub const VOLUME: Dimension = Dimension {
        length: 3,
        ..Self::DIMENSIONLESS
    };
    pub const VELOCITY: Dimension = Dimension {
        length: 1,
        time: -1,
        ..Self::DIMENSIONLESS
    };
    pub const ACCELERATION: Dimension = Dimension {
        length: 1,
        time: -2,
        ..Self::DIMENSIONLESS
    };
    pub const FORCE: Dimension = Dimension {
        length: 1,
        mass: 1,
        time: -2,
        ..Self::DIMENSIONLESS
    };
    pub const PRESSURE: Dimension = Dimension {
        length: -1,
        mass: 1,
        time: -2,
        ..Self::DIMENSIONLESS
    };
    pub const ENERGY: Dimension = Dimension {
        length: 2,
        mass: 1,
        time: -2,
        ..Self::DIMENSIONLESS
    };
    pub const POWER: Dimension = Dimension {
        length: 2,
        mass: 1,
        time: -3,
        ..Self::DIMENSIONLESS
    };
    pub const FREQUENCY: Dimension = Dimension {
        time: -1,
        ..Self::DIMENSIONLESS
    };
    /// Bits/bytes have no SI dimension of their own; represented as
    /// dimensionless with a distinct `Category::Information` on the `Unit`
    /// that carries them so conversions stay within the information family.
    pub const INFORMATION: Dimension = Self::DIMENSIONLESS;

    pub fn is_dimensionless(self) -> bool {
        self == Self::DIMENSIONLESS
    }

    /// Scale every exponent by `factor` (used for `pow`). Returns `None` if
    /// any resulting exponent would not fit an `i8` or isn't integral.
    pub fn scaled(self, factor: f64) -> Option<Dimension> {
        let scale = |e: i8| -> Option<i8> {
            let v = f64::from(e) * factor;
            if (v - v.round()).abs() > 1e-9 {
                return None;
            }
            let rounded = v.round();
            if rounded < i8::MIN as f64 || rounded > i8::MAX as f64 {
                return None;
            }
            Some(rounded as i8)
        };
        Some(Dimension {
            length: scale(self.length)?,
            mass: scale(self.mass)?,
            time: scale(self.time)?,
            current: scale(self.current)?,
            temperature: scale(self.temperature)?,
            amount: scale(self.amount)?,
            luminosity: scale(self.luminosity)?,
        })
    }
}

impl Add for Dimension {
    type Output = Dimension;
    fn add(self, rhs: Dimension) -> Dimension {
        Dimension {
            length: self.length + rhs.length,
            mass: self.mass + rhs.mass,
            time: self.time + rhs.time,
            current: self.current + rhs.current,
            temperature: self.temperature + rhs.temperature,
            amount: self.amount + rhs.amount,
            luminosity: self.luminosity + rhs.luminosity,
        }
    }
}

impl Sub for Dimension {
    type Output = Dimension;
    fn sub(self, rhs: Dimension) -> Dimension {
        self + (-rhs)
    }
}

impl Neg for Dimension {
    type Output = Dimension;
    fn neg(self) -> Dimension {
        Dimension {
            length: -self.length,
            mass: -self.mass,
            time: -self.time,
            current: -self.current,
            temperature: -self.temperature,
            amount: -self.amount,
            luminosity: -self.luminosity,
        }
    }
}

impl Mul<i8> for Dimension {
    type Output = Dimension;
    fn mul(self, rhs: i8) -> Dimension {
        Dimension {
            length: self.length * rhs,
            mass: self.mass * rhs,
            time: self.time * rhs,
            current: self.current * rhs,
            temperature: self.temperature * rhs,
            amount: self.amount * rhs,
            luminosity: self.luminosity * rhs,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
            ("I", self.current),
            ("Θ", self.temperature),
            ("N", self.amount),
            ("J", self.luminosity),
        ];
        let mut wrote = false;
        for (sym, exp) in parts {
            if exp == 0 {
                continue;
            }
            if wrote {
                write!(f, "·")?;
            }
            write!(f, "{sym}")?;
            if exp != 1 {
                write!(f, "^{exp}")?;
            }
            wrote = true;
        }
        if !wrote {
            write!(f, "1")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_is_mass_length_over_time_squared() {
        assert_eq!(Dimension::FORCE, Dimension::MASS + Dimension::ACCELERATION);
    }

    #[test]
    fn energy_is_force_times_length() {
        assert_eq!(Dimension::ENERGY, Dimension::FORCE + Dimension::LENGTH);
    }

    #[test]
    fn pressure_times_volume_is_energy() {
        assert_eq!(Dimension::ENERGY, Dimension::PRESSURE + Dimension::VOLUME);
    }

    #[test]
    fn scaled_rejects_non_integral_result() {
        assert_eq!(Dimension::AREA.scaled(0.5), Some(Dimension::LENGTH));
        assert!(Dimension::LENGTH.scaled(0.5).is_none());
    }
}
