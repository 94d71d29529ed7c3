//! The semantic value taxonomy (spec.md 3.4) and its arithmetic laws.
//!
//! Modeled as one tagged enum with arithmetic implemented by explicit
//! dispatch over variant pairs (spec.md 9: "centralize the law tables to
//! keep arithmetic invariants auditable") rather than per-variant virtual
//! methods — the same flat-enum-plus-free-function shape
//! `ferrum-fhirpath/src/types.rs`'s `Value` uses for its own coercion
//! rules, generalized here to currency/unit/percentage/date laws instead
//! of FHIR primitive coercions.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use notecalc_units::{CompositeUnit, Quantity, Resolver};
use std::fmt;

pub const EQUALITY_TOLERANCE: f64 = 1e-9;

/// A civil zone tag carried alongside a [`Value::Date`]/[`Value::Time`]:
/// `None` for a date with no time-of-day, `Some("UTC")` or `Some("+05:30")`
/// for an explicit offset (spec.md 6.3).
pub type Zone = Option<String>;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    /// The percent value itself (e.g. `15.0` for `15%`), not the fraction.
    Percentage(f64),
    Currency {
        code: String,
        amount: f64,
    },
    Unit(Quantity),
    /// A currency rate per unit denominator, e.g. `$8/ft`.
    CurrencyUnit {
        code: String,
        amount: f64,
        per_unit: CompositeUnit,
        is_rate: bool,
    },
    /// Signed duration in seconds.
    Duration(f64),
    Date {
        date: NaiveDate,
        time: Option<NaiveTime>,
        zone: Zone,
    },
    Time {
        time: NaiveTime,
        /// Day carry accumulated by rollover arithmetic (spec.md 4.7).
        day_carry: i64,
    },
    List(Vec<Value>),
    Symbolic {
        expression: String,
        free_variables: Vec<String>,
    },
    Error(Error),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Percentage(_) => "Percentage",
            Value::Currency { .. } => "Currency",
            Value::Unit(_) => "Unit",
            Value::CurrencyUnit { .. } => "CurrencyUnit",
            Value::Duration(_) => "Duration",
            Value::Date { .. } => "Date",
            Value::Time { .. } => "Time",
            Value::List(_) => "List",
            Value::Symbolic { .. } => "Symbolic",
            Value::Error(_) => "Error",
        }
    }

    /// Best-effort scalar magnitude, used for sorting/comparators/tolerant
    /// equality; `None` for values with no single numeric reading (List,
    /// Symbolic, Error, Time — Time compares via its own rule below).
    pub fn numeric_magnitude(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Percentage(p) => Some(*p),
            Value::Currency { amount, .. } => Some(*amount),
            Value::Unit(q) => Some(q.value),
            Value::CurrencyUnit { amount, .. } => Some(*amount),
            Value::Duration(s) => Some(*s),
            _ => None,
        }
    }

    /// Relative-tolerance equality (spec.md 4.8 / 8: `1e-9`, e.g.
    /// `0.1 + 0.2 == 0.3`).
    pub fn approx_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.approx_eq(y))
            }
            (Value::Date { date: a, time: at, .. }, Value::Date { date: b, time: bt, .. }) => {
                a == b && at == bt
            }
            (Value::Time { time: a, .. }, Value::Time { time: b, .. }) => a == b,
            _ => match (self.numeric_magnitude(), other.numeric_magnitude()) {
                (Some(a), Some(b)) => {
                    let scale = a.abs().max(b.abs()).max(1.0);
                    (a - b).abs() <= EQUALITY_TOLERANCE * scale
                }
                _ => false,
            },
        }
    }

    fn compatible_currency(a: &str, b: &str) -> Result<()> {
        if a != b {
            return Err(Error::IncompatibleCurrency {
                left: a.to_string(),
                right: b.to_string(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Value, resolver: &Resolver) -> Result<Value> {
        use Value::*;
        match (self, other) {
            (Error(e), _) | (_, Error(e)) => Ok(Error(e.clone())),
            (List(a), List(b)) => Self::zip_list(a, b, |x, y| x.add(y, resolver)),
            (List(a), b) | (b, List(a)) => {
                Ok(List(a.iter().map(|x| x.add(b, resolver)).collect::<Result<_>>()?))
            }
            (Number(a), Number(b)) => Ok(Number(a + b)),
            (Percentage(a), Percentage(b)) => Ok(Percentage(a + b)),
            // Percentage adjacent to a base in `+` context is an implicit `on` (spec.md 3.4/4.6).
            (Percentage(p), base) => base.scale_by_percent(*p, true),
            (base, Percentage(p)) => base.scale_by_percent(*p, true),
            (Currency { code: ca, amount: aa }, Currency { code: cb, amount: ab }) => {
                Self::compatible_currency(ca, cb)?;
                Ok(Currency {
                    code: ca.clone(),
                    amount: aa + ab,
                })
            }
            (Currency { code, amount }, Number(n)) | (Number(n), Currency { code, amount }) => {
                Ok(Currency {
                    code: code.clone(),
                    amount: amount + n,
                })
            }
            (Unit(a), Unit(b)) => Ok(Unit(a.add(b, resolver)?)),
            (Unit(q), Number(n)) | (Number(n), Unit(q)) if q.unit.is_dimensionless() => {
                Ok(Unit(Quantity::new(q.value + n, q.unit.clone())))
            }
            (Unit(q), Number(_)) | (Number(_), Unit(q)) => Err(Error::IncompatibleUnits(format!(
                "cannot add a dimensionless number to '{}'",
                q.unit
            ))),
            (Duration(a), Duration(b)) => Ok(Duration(a + b)),
            (Date { date, time, zone }, Duration(secs)) | (Duration(secs), Date { date, time, zone }) => {
                Ok(add_duration_to_date(*date, *time, zone.clone(), *secs))
            }
            (Time { time, day_carry }, Duration(secs)) | (Duration(secs), Time { time, day_carry }) => {
                Ok(add_duration_to_time(*time, *day_carry, *secs))
            }
            (Time { .. }, Time { .. }) => Err(Error::Syntax(
                "cannot add a Time to a Time".to_string(),
            )),
            (a, b) => Err(Error::Syntax(format!(
                "cannot add {} and {}",
                a.variant_name(),
                b.variant_name()
            ))),
        }
    }

    pub fn sub(&self, other: &Value, resolver: &Resolver) -> Result<Value> {
        use Value::*;
        match (self, other) {
            (Error(e), _) | (_, Error(e)) => Ok(Error(e.clone())),
            (List(a), List(b)) => Self::zip_list(a, b, |x, y| x.sub(y, resolver)),
            (List(a), b) => Ok(List(a.iter().map(|x| x.sub(b, resolver)).collect::<Result<_>>()?)),
            (Number(a), Number(b)) => Ok(Number(a - b)),
            (Percentage(a), Percentage(b)) => Ok(Percentage(a - b)),
            (base, Percentage(p)) => base.scale_by_percent(*p, false),
            (Currency { code: ca, amount: aa }, Currency { code: cb, amount: ab }) => {
                Self::compatible_currency(ca, cb)?;
                Ok(Currency {
                    code: ca.clone(),
                    amount: aa - ab,
                })
            }
            (Currency { code, amount }, Number(n)) => Ok(Currency {
                code: code.clone(),
                amount: amount - n,
            }),
            (Unit(a), Unit(b)) => Ok(Unit(a.sub(b, resolver)?)),
            (Unit(q), Number(n)) if q.unit.is_dimensionless() => {
                Ok(Unit(Quantity::new(q.value - n, q.unit.clone())))
            }
            (Duration(a), Duration(b)) => Ok(Duration(a - b)),
            (Date { date: da, time: ta, zone: za }, Date { date: db, time: tb, .. }) => {
                let a_secs = da.and_time(ta.unwrap_or_default()).and_utc().timestamp();
                let b_secs = db.and_time(tb.unwrap_or_default()).and_utc().timestamp();
                let _ = za;
                Ok(Duration((a_secs - b_secs) as f64))
            }
            (Date { date, time, zone }, Duration(secs)) => {
                Ok(add_duration_to_date(*date, *time, zone.clone(), -secs))
            }
            (Time { time: a, .. }, Time { time: b, .. }) => {
                Ok(Duration((a.num_seconds_from_midnight() as i64 - b.num_seconds_from_midnight() as i64) as f64))
            }
            (Time { time, day_carry }, Duration(secs)) => {
                Ok(add_duration_to_time(*time, *day_carry, -secs))
            }
            (a, b) => Err(Error::Syntax(format!(
                "cannot subtract {} from {}",
                b.variant_name(),
                a.variant_name()
            ))),
        }
    }

    pub fn mul(&self, other: &Value, resolver: &Resolver) -> Result<Value> {
        use Value::*;
        match (self, other) {
            (Error(e), _) | (_, Error(e)) => Ok(Error(e.clone())),
            (List(a), List(b)) => Self::zip_list(a, b, |x, y| x.mul(y, resolver)),
            (List(a), b) | (b, List(a)) => {
                Ok(List(a.iter().map(|x| x.mul(b, resolver)).collect::<Result<_>>()?))
            }
            (Number(a), Number(b)) => Ok(Number(a * b)),
            (Percentage(p), base) | (base, Percentage(p)) => base.scale_fraction(p / 100.0),
            (Currency { code, amount }, Number(n)) | (Number(n), Currency { code, amount }) => {
                Ok(Currency {
                    code: code.clone(),
                    amount: amount * n,
                })
            }
            (Unit(a), Unit(b)) => Ok(Unit(a.mul(b))),
            (Unit(q), Number(n)) | (Number(n), Unit(q)) => {
                Ok(Unit(Quantity::new(q.value * n, q.unit.clone())))
            }
            (CurrencyUnit { code, amount, per_unit, is_rate }, Number(n))
            | (Number(n), CurrencyUnit { code, amount, per_unit, is_rate }) => Ok(CurrencyUnit {
                code: code.clone(),
                amount: amount * n,
                per_unit: per_unit.clone(),
                is_rate: *is_rate,
            }),
            (Unit(q), CurrencyUnit { code, amount, per_unit, .. })
            | (CurrencyUnit { code, amount, per_unit, .. }, Unit(q)) => {
                let converted = q.convert_to(per_unit, resolver)?;
                Ok(Currency {
                    code: code.clone(),
                    amount: converted.value * amount,
                })
            }
            (a, b) => Err(Error::Syntax(format!(
                "cannot multiply {} and {}",
                a.variant_name(),
                b.variant_name()
            ))),
        }
    }

    pub fn div(&self, other: &Value, resolver: &Resolver) -> Result<Value> {
        use Value::*;
        match (self, other) {
            (Error(e), _) | (_, Error(e)) => Ok(Error(e.clone())),
            (List(a), List(b)) => Self::zip_list(a, b, |x, y| x.div(y, resolver)),
            (List(a), b) => Ok(List(a.iter().map(|x| x.div(b, resolver)).collect::<Result<_>>()?)),
            (_, Number(n)) if *n == 0.0 => Err(Error::DivisionByZero),
            (Number(a), Number(b)) => Ok(Number(a / b)),
            (Currency { code, amount }, Number(n)) => Ok(Currency {
                code: code.clone(),
                amount: amount / n,
            }),
            (Currency { code: ca, amount: aa }, Currency { code: cb, amount: ab }) => {
                Self::compatible_currency(ca, cb)?;
                if *ab == 0.0 {
                    return Err(Error::DivisionByZero);
                }
                Ok(Number(aa / ab))
            }
            (Unit(a), Unit(b)) => Ok(Unit(a.div(b)?)),
            (Unit(q), Number(n)) => Ok(Unit(Quantity::new(q.value / n, q.unit.clone()))),
            (Currency { code, amount }, Unit(q)) => Ok(CurrencyUnit {
                code: code.clone(),
                amount: *amount / q.value,
                per_unit: q.unit.clone(),
                is_rate: true,
            }),
            (a, b) => Err(Error::Syntax(format!(
                "cannot divide {} by {}",
                a.variant_name(),
                b.variant_name()
            ))),
        }
    }

    pub fn rem(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Error(e), _) | (_, Value::Error(e)) => Ok(Value::Error(e.clone())),
            (Value::Number(_), Value::Number(b)) if *b == 0.0 => Err(Error::DivisionByZero),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a % b)),
            (a, b) => Err(Error::Syntax(format!(
                "cannot compute {} mod {}",
                a.variant_name(),
                b.variant_name()
            ))),
        }
    }

    pub fn pow(&self, exponent: &Value) -> Result<Value> {
        match (self, exponent) {
            (Value::Error(e), _) | (_, Value::Error(e)) => Ok(Value::Error(e.clone())),
            (Value::Number(base), Value::Number(exp)) => {
                let v = base.powf(*exp);
                if v.is_nan() || v.is_infinite() {
                    return Err(Error::Overflow);
                }
                Ok(Value::Number(v))
            }
            (Value::Unit(q), Value::Number(exp)) => {
                let (num, den) = float_to_rational(*exp)
                    .ok_or_else(|| Error::NonNumericExponent(exp.to_string()))?;
                Ok(Value::Unit(q.pow_rational(num, den)?))
            }
            (a, b) => Err(Error::Syntax(format!(
                "cannot raise {} to the power of {}",
                a.variant_name(),
                b.variant_name()
            ))),
        }
    }

    pub fn neg(&self) -> Result<Value> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Percentage(p) => Ok(Value::Percentage(-p)),
            Value::Currency { code, amount } => Ok(Value::Currency {
                code: code.clone(),
                amount: -amount,
            }),
            Value::Unit(q) => Ok(Value::Unit(Quantity::new(-q.value, q.unit.clone()))),
            Value::Duration(s) => Ok(Value::Duration(-s)),
            Value::List(items) => Ok(Value::List(
                items.iter().map(|v| v.neg()).collect::<Result<_>>()?,
            )),
            Value::Error(e) => Ok(Value::Error(e.clone())),
            other => Err(Error::Syntax(format!("cannot negate {}", other.variant_name()))),
        }
    }

    /// `p% on y` (grow=true) / `p% off y` (grow=false): `y * (1 +/- p/100)`,
    /// preserving `y`'s variant (spec.md 4.6).
    pub fn scale_by_percent(&self, percent: f64, grow: bool) -> Result<Value> {
        let factor = if grow { 1.0 + percent / 100.0 } else { 1.0 - percent / 100.0 };
        self.scale_fraction(factor)
    }

    fn scale_fraction(&self, factor: f64) -> Result<Value> {
        match self {
            Value::Number(n) => Ok(Value::Number(n * factor)),
            Value::Currency { code, amount } => Ok(Value::Currency {
                code: code.clone(),
                amount: amount * factor,
            }),
            Value::Unit(q) => Ok(Value::Unit(Quantity::new(q.value * factor, q.unit.clone()))),
            Value::Duration(s) => Ok(Value::Duration(s * factor)),
            Value::Percentage(p) => Ok(Value::Percentage(p * factor)),
            Value::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|v| v.scale_fraction(factor))
                    .collect::<Result<_>>()?,
            )),
            Value::Error(e) => Ok(Value::Error(e.clone())),
            other => Err(Error::Syntax(format!(
                "cannot apply a percentage to {}",
                other.variant_name()
            ))),
        }
    }

    fn zip_list(a: &[Value], b: &[Value], f: impl Fn(&Value, &Value) -> Result<Value>) -> Result<Value> {
        if a.len() != b.len() {
            return Err(Error::ListLengthMismatch);
        }
        Ok(Value::List(
            a.iter().zip(b).map(|(x, y)| f(x, y)).collect::<Result<_>>()?,
        ))
    }
}

fn add_duration_to_date(date: NaiveDate, time: Option<NaiveTime>, zone: Zone, secs: f64) -> Value {
    let base_time = time.unwrap_or_default();
    let total_secs = base_time.num_seconds_from_midnight() as i64 + secs.round() as i64;
    let day_shift = total_secs.div_euclid(86_400);
    let new_secs = total_secs.rem_euclid(86_400);
    let new_time = NaiveTime::from_num_seconds_from_midnight_opt(new_secs as u32, 0).unwrap_or(base_time);
    let new_date = date + chrono::Duration::days(day_shift);
    Value::Date {
        date: new_date,
        time: if time.is_some() { Some(new_time) } else { None },
        zone,
    }
}

fn add_duration_to_time(time: NaiveTime, day_carry: i64, secs: f64) -> Value {
    let total = time.num_seconds_from_midnight() as i64 + secs.round() as i64;
    let day_shift = total.div_euclid(86_400);
    let new_secs = total.rem_euclid(86_400);
    Value::Time {
        time: NaiveTime::from_num_seconds_from_midnight_opt(new_secs as u32, 0).unwrap_or(time),
        day_carry: day_carry + day_shift,
    }
}

/// Approximate a float exponent as a small rational for `Quantity::pow_rational`.
fn float_to_rational(exp: f64) -> Option<(i32, i32)> {
    for den in 1..=12i32 {
        let num = exp * den as f64;
        if (num - num.round()).abs() < 1e-9 {
            return Some((num.round() as i32, den));
        }
    }
    None
}

/// Add N business days (Mon–Fri only), supporting negative `n` (spec.md 4.7).
pub fn add_business_days(date: NaiveDate, n: i64) -> NaiveDate {
    let mut remaining = n.abs();
    let step = if n >= 0 { 1 } else { -1 };
    let mut current = date;
    while remaining > 0 {
        current += chrono::Duration::days(step);
        let is_weekend = matches!(current.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun);
        if !is_weekend {
            remaining -= 1;
        }
    }
    current
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variant_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecalc_units::AliasTable;

    fn resolver(a: &AliasTable) -> Resolver<'_> {
        Resolver::new(a)
    }

    #[test]
    fn percentage_on_preserves_currency_variant() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let base = Value::Currency { code: "USD".into(), amount: 100.0 };
        let grown = base.scale_by_percent(10.0, true).unwrap();
        match grown {
            Value::Currency { code, amount } => {
                assert_eq!(code, "USD");
                assert!((amount - 110.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        let _ = r;
    }

    #[test]
    fn on_minus_off_matches_invariant() {
        let base = Value::Number(200.0);
        let on = base.scale_by_percent(10.0, true).unwrap();
        let off = base.scale_by_percent(10.0, false).unwrap();
        let diff = on.sub(&off, &Resolver::new(&AliasTable::new())).unwrap();
        // p on y - p off y ~= (2p/100) * y
        assert!(matches!(diff, Value::Number(n) if (n - 40.0).abs() < 1e-9));
    }

    #[test]
    fn mismatched_currency_errors() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let a = Value::Currency { code: "USD".into(), amount: 10.0 };
        let b = Value::Currency { code: "EUR".into(), amount: 5.0 };
        assert!(a.add(&b, &r).is_err());
    }

    #[test]
    fn division_by_zero_errors() {
        let aliases = AliasTable::new();
        let r = resolver(&aliases);
        let a = Value::Number(1.0);
        let b = Value::Number(0.0);
        assert!(matches!(a.div(&b, &r), Err(Error::DivisionByZero)));
    }

    #[test]
    fn approx_eq_honors_tolerance() {
        let a = Value::Number(0.1 + 0.2);
        let b = Value::Number(0.3);
        assert!(a.approx_eq(&b));
    }
}
