//! Formatter: numeric, currency, unit, list, date, and compact-datetime-
//! list rendering (spec.md 4.13).

use crate::context::{DateDisplayFormat, EngineOptions};
use crate::currency::glyph_for;
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;

pub fn format_value(value: &Value, opts: &EngineOptions) -> String {
    match value {
        Value::Number(n) => format_number(*n, opts),
        Value::Percentage(p) => format!("{}%", format_number(*p, opts)),
        Value::Currency { code, amount } => format_currency(code, *amount, opts),
        Value::Unit(q) => format!("{} {}", format_number(q.value, opts), q.unit),
        Value::CurrencyUnit {
            code,
            amount,
            per_unit,
            ..
        } => format!("{}/{}", format_currency(code, *amount, opts), per_unit),
        Value::Duration(secs) => format_duration(*secs),
        Value::Date { date, time, zone } => format_date(*date, *time, zone.as_deref(), opts),
        Value::Time { time, day_carry } => format_time(*time, *day_carry),
        Value::List(items) => {
            if items.is_empty() {
                "()".to_string()
            } else {
                items
                    .iter()
                    .map(|v| format_value(v, opts))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
        Value::Symbolic { expression, .. } => expression.clone(),
        Value::Error(e) => crate::render::error_display(&e.to_string()),
    }
}

pub fn format_number(value: f64, opts: &EngineOptions) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let abs = value.abs();
    if abs < opts.scientific_lower_threshold || abs >= opts.scientific_upper_threshold {
        return format_scientific(value, opts.decimal_places);
    }
    let rounded = round_to(value, opts.decimal_places);
    let mut s = format!("{:.*}", opts.decimal_places as usize, rounded);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if opts.group_thousands {
        s = group_thousands(&s);
    }
    s
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

fn format_scientific(value: f64, places: u32) -> String {
    let formatted = format!("{:.*e}", places as usize, value);
    // Rust emits e.g. "1.500000e2"; trim trailing zeros in the mantissa and
    // keep the documented "eN" shorthand rather than "e+0N".
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let mut mantissa = mantissa.to_string();
    if mantissa.contains('.') {
        while mantissa.ends_with('0') {
            mantissa.pop();
        }
        if mantissa.ends_with('.') {
            mantissa.pop();
        }
    }
    format!("{mantissa}e{exponent}")
}

fn group_thousands(s: &str) -> String {
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-');
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn format_currency(code: &str, amount: f64, opts: &EngineOptions) -> String {
    let negative = amount < 0.0;
    let body = format_number(amount.abs(), opts);
    let sign = if negative { "-" } else { "" };
    match glyph_for(code) {
        Some(glyph) => format!("{sign}{glyph}{body}"),
        None => format!("{sign}{body} {code}"),
    }
}

/// `2 h 1 min`, `-1 h 59 min` (spec.md 6.3) — decomposes into the largest
/// two non-zero calendar-neutral units.
pub fn format_duration(total_secs: f64) -> String {
    if total_secs == 0.0 {
        return "0 s".to_string();
    }
    let sign = if total_secs < 0.0 { "-" } else { "" };
    let mut remaining = total_secs.abs().round() as i64;

    const UNITS: &[(&str, i64)] = &[
        ("day", 86_400),
        ("h", 3_600),
        ("min", 60),
        ("s", 1),
    ];

    let mut parts = Vec::new();
    for (name, secs_per) in UNITS {
        let qty = remaining / secs_per;
        if qty > 0 {
            parts.push(format!("{qty} {name}"));
            remaining %= secs_per;
        }
        if parts.len() == 2 {
            break;
        }
    }
    if parts.is_empty() {
        parts.push("0 s".to_string());
    }
    format!("{sign}{}", parts.join(" "))
}

pub fn format_date(date: NaiveDate, time: Option<NaiveTime>, zone: Option<&str>, opts: &EngineOptions) -> String {
    let date_text = match opts.date_display_format {
        DateDisplayFormat::Iso => date.format("%Y-%m-%d").to_string(),
        DateDisplayFormat::Locale => match opts.date_locale.as_deref() {
            Some(loc) if loc.starts_with("en-US") => date.format("%m/%d/%Y").to_string(),
            _ => date.format("%d/%m/%Y").to_string(),
        },
    };
    match (time, zone) {
        (Some(t), Some(z)) => format!("{date_text} {} {z}", t.format("%H:%M")),
        (Some(t), None) => format!("{date_text} {}", t.format("%H:%M")),
        (None, _) => date_text,
    }
}

pub fn format_time(time: NaiveTime, day_carry: i64) -> String {
    let base = time.format("%H:%M").to_string();
    if day_carry == 0 {
        base
    } else {
        let sign = if day_carry > 0 { "+" } else { "-" };
        format!("{base} ({sign}{} day)", day_carry.abs())
    }
}

/// Groups a list of `Value::Date` entries (with time) by calendar date:
/// `YYYY-MM-DD: HH:MM[, HH:MM…]`, distinct days joined by `;` (spec.md
/// 4.13/6.3).
pub fn format_compact_datetime_list(values: &[Value]) -> String {
    let mut by_day: BTreeMap<NaiveDate, Vec<NaiveTime>> = BTreeMap::new();
    for v in values {
        if let Value::Date { date, time: Some(t), .. } = v {
            by_day.entry(*date).or_default().push(*t);
        }
    }
    by_day
        .into_iter()
        .map(|(date, mut times)| {
            times.sort();
            let times_text = times
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", date.format("%Y-%m-%d"), times_text)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros() {
        let opts = EngineOptions::default();
        assert_eq!(format_number(30.480_000, &opts), "30.48");
    }

    #[test]
    fn groups_thousands_when_enabled() {
        let mut opts = EngineOptions::default();
        opts.group_thousands = true;
        assert_eq!(format_number(1_234_567.0, &opts), "1,234,567");
    }

    #[test]
    fn duration_formats_two_largest_units() {
        assert_eq!(format_duration(7_260.0), "2 h 1 min");
        assert_eq!(format_duration(-7_140.0), "-1 h 59 min");
    }

    #[test]
    fn currency_prefers_glyph_for_known_code() {
        let opts = EngineOptions::default();
        assert_eq!(format_currency("USD", 672.0, &opts), "$672");
    }

    #[test]
    fn empty_list_renders_parens() {
        let opts = EngineOptions::default();
        assert_eq!(format_value(&Value::List(vec![]), &opts), "()");
    }
}
