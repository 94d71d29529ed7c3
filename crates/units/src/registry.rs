//! Built-in unit registry: symbol/name/dimension/base-multiplier table plus
//! SI (and binary, for information) prefix expansion.
//!
//! Grounded on the perfect-hash registry pattern in
//! `ferrum-fhirpath/src/functions.rs` (`phf_map!` of static metadata, O(1)
//! lookup, zero runtime allocation for the built-in table) applied to units
//! instead of functions, and on the base-multiplier/offset shape of
//! `ferrum-ucum`'s `Unit` (`to_base` / `from_base`).

use crate::dimension::Dimension;
use crate::error::{Error, Result};
use phf::phf_map;

/// Family a unit belongs to — used to group SI-prefix display thresholds and
/// to keep affine temperature units from being treated as plain
/// multiplicative ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    Amount,
    Luminosity,
    Area,
    Volume,
    Velocity,
    Acceleration,
    Force,
    Pressure,
    Energy,
    Power,
    Frequency,
    Information,
    FuelEconomy,
    /// A user-defined countable unit with no physical dimension (`dozen = 12`).
    Count,
}

/// Static metadata for one built-in unit symbol.
#[derive(Clone, Copy, Debug)]
pub struct UnitDef {
    pub symbol: &'static str,
    pub name: &'static str,
    pub dimension: Dimension,
    pub category: Category,
    /// Multiply a value in this unit by this factor to reach the SI base
    /// unit for its dimension.
    pub to_base_factor: f64,
    /// Added after scaling by `to_base_factor` (non-zero only for affine
    /// temperature scales).
    pub to_base_offset: f64,
}

const fn u(
    symbol: &'static str,
    name: &'static str,
    dimension: Dimension,
    category: Category,
    to_base_factor: f64,
) -> UnitDef {
    UnitDef {
        symbol,
        name,
        dimension,
        category,
        to_base_factor,
        to_base_offset: 0.0,
    }
}

const fn affine(
    symbol: &'static str,
    name: &'static str,
    dimension: Dimension,
    category: Category,
    to_base_factor: f64,
    to_base_offset: f64,
) -> UnitDef {
    UnitDef {
        symbol,
        name,
        dimension,
        category,
        to_base_factor,
        to_base_offset,
    }
}

/// Built-in units keyed by their canonical (unprefixed) symbol.
pub static UNITS: phf::Map<&'static str, UnitDef> = phf_map! {
    // Length (base: meter)
    "m" => u("m", "meter", Dimension::LENGTH, Category::Length, 1.0),
    "mi" => u("mi", "mile", Dimension::LENGTH, Category::Length, 1609.344),
    "ft" => u("ft", "foot", Dimension::LENGTH, Category::Length, 0.3048),
    "yd" => u("yd", "yard", Dimension::LENGTH, Category::Length, 0.9144),
    "in" => u("in", "inch", Dimension::LENGTH, Category::Length, 0.0254),
    "nmi" => u("nmi", "nautical mile", Dimension::LENGTH, Category::Length, 1852.0),

    // Mass (base: kilogram)
    "kg" => u("kg", "kilogram", Dimension::MASS, Category::Mass, 1.0),
    "g" => u("g", "gram", Dimension::MASS, Category::Mass, 0.001),
    "lb" => u("lb", "pound", Dimension::MASS, Category::Mass, 0.453_592_37),
    "oz" => u("oz", "ounce", Dimension::MASS, Category::Mass, 0.028_349_523_125),
    "t" => u("t", "tonne", Dimension::MASS, Category::Mass, 1000.0),

    // Time (base: second)
    "s" => u("s", "second", Dimension::TIME, Category::Time, 1.0),
    "min" => u("min", "minute", Dimension::TIME, Category::Time, 60.0),
    "h" => u("h", "hour", Dimension::TIME, Category::Time, 3600.0),
    "day" => u("day", "day", Dimension::TIME, Category::Time, 86_400.0),
    "week" => u("week", "week", Dimension::TIME, Category::Time, 604_800.0),

    // Electric current (base: ampere)
    "A" => u("A", "ampere", Dimension::CURRENT, Category::Current, 1.0),

    // Temperature (base: kelvin)
    "K" => u("K", "kelvin", Dimension::TEMPERATURE, Category::Temperature, 1.0),
    "C" => affine("C", "celsius", Dimension::TEMPERATURE, Category::Temperature, 1.0, 273.15),
    "F" => affine("F", "fahrenheit", Dimension::TEMPERATURE, Category::Temperature, 5.0 / 9.0, 255.372_222_222_222_2),

    // Amount of substance (base: mole)
    "mol" => u("mol", "mole", Dimension::AMOUNT, Category::Amount, 1.0),

    // Luminous intensity (base: candela)
    "cd" => u("cd", "candela", Dimension::LUMINOSITY, Category::Luminosity, 1.0),

    // Area (base: square meter)
    "ha" => u("ha", "hectare", Dimension::AREA, Category::Area, 10_000.0),
    "acre" => u("acre", "acre", Dimension::AREA, Category::Area, 4_046.856_422_4),

    // Volume (base: cubic meter)
    "L" => u("L", "liter", Dimension::VOLUME, Category::Volume, 0.001),
    "gal" => u("gal", "gallon", Dimension::VOLUME, Category::Volume, 0.003_785_411_784),

    // Force (base: newton)
    "N" => u("N", "newton", Dimension::FORCE, Category::Force, 1.0),

    // Pressure (base: pascal)
    "Pa" => u("Pa", "pascal", Dimension::PRESSURE, Category::Pressure, 1.0),
    "bar" => u("bar", "bar", Dimension::PRESSURE, Category::Pressure, 100_000.0),
    "psi" => u("psi", "pound per square inch", Dimension::PRESSURE, Category::Pressure, 6_894.757_293_168),
    "atm" => u("atm", "atmosphere", Dimension::PRESSURE, Category::Pressure, 101_325.0),

    // Energy (base: joule)
    "J" => u("J", "joule", Dimension::ENERGY, Category::Energy, 1.0),
    "cal" => u("cal", "calorie", Dimension::ENERGY, Category::Energy, 4.184),
    "Wh" => u("Wh", "watt-hour", Dimension::ENERGY, Category::Energy, 3600.0),

    // Power (base: watt)
    "W" => u("W", "watt", Dimension::POWER, Category::Power, 1.0),
    "hp" => u("hp", "horsepower", Dimension::POWER, Category::Power, 745.699_871_582_27),

    // Frequency (base: hertz)
    "Hz" => u("Hz", "hertz", Dimension::FREQUENCY, Category::Frequency, 1.0),

    // Information (base: bit)
    "bit" => u("bit", "bit", Dimension::INFORMATION, Category::Information, 1.0),
    "B" => u("B", "byte", Dimension::INFORMATION, Category::Information, 8.0),

    // Fuel economy (base: meter per cubic meter, i.e. m^-2)
    "mpg" => u("mpg", "mile per gallon", Dimension { length: -2, ..Dimension::DIMENSIONLESS }, Category::FuelEconomy, 1609.344 / 0.003_785_411_784),
    "kml" => u("kml", "kilometer per liter", Dimension { length: -2, ..Dimension::DIMENSIONLESS }, Category::FuelEconomy, 1000.0 / 0.001),
};

/// Plural and alternate spellings mapped to a canonical symbol above.
static SPELLINGS: phf::Map<&'static str, &'static str> = phf_map! {
    "meter" => "m",
    "meters" => "m",
    "metre" => "m",
    "metres" => "m",
    "miles" => "mi",
    "feet" => "ft",
    "foot" => "ft",
    "yards" => "yd",
    "inch" => "in",
    "inches" => "in",
    "kilogram" => "kg",
    "kilograms" => "kg",
    "grams" => "g",
    "gram" => "g",
    "pounds" => "lb",
    "lbs" => "lb",
    "ounces" => "oz",
    "tonnes" => "t",
    "seconds" => "s",
    "sec" => "s",
    "secs" => "s",
    "minute" => "min",
    "minutes" => "min",
    "hour" => "h",
    "hours" => "h",
    "hrs" => "h",
    "days" => "day",
    "weeks" => "week",
    "amperes" => "A",
    "amps" => "A",
    "kelvin" => "K",
    "celsius" => "C",
    "fahrenheit" => "F",
    "moles" => "mol",
    "hectares" => "ha",
    "acres" => "acre",
    "liter" => "L",
    "liters" => "L",
    "litre" => "L",
    "litres" => "L",
    "gallons" => "gal",
    "newtons" => "N",
    "pascals" => "Pa",
    "bars" => "bar",
    "joules" => "J",
    "calories" => "cal",
    "watts" => "W",
    "hertz" => "Hz",
    "bits" => "bit",
    "bytes" => "B",
};

/// SI prefixes usable on any multiplicative (non-affine) unit, plus binary
/// prefixes restricted to `Category::Information`.
static PREFIXES: phf::Map<&'static str, f64> = phf_map! {
    "Y" => 1e24, "Z" => 1e21, "E" => 1e18, "P" => 1e15, "T" => 1e12,
    "G" => 1e9, "M" => 1e6, "k" => 1e3, "h" => 1e2, "da" => 1e1,
    "d" => 1e-1, "c" => 1e-2, "m" => 1e-3, "u" => 1e-6, "n" => 1e-9,
    "p" => 1e-12, "f" => 1e-15, "a" => 1e-18,
};

static BINARY_PREFIXES: phf::Map<&'static str, f64> = phf_map! {
    "Ki" => 1024.0,
    "Mi" => 1_048_576.0,
    "Gi" => 1_073_741_824.0,
    "Ti" => 1_099_511_627_776.0,
};

/// A built-in unit after resolving plurals/prefixes, ready to be folded into
/// a [`crate::composite::CompositeUnit`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedUnit {
    pub canonical_symbol: String,
    pub dimension: Dimension,
    pub category: Category,
    pub to_base_factor: f64,
    pub to_base_offset: f64,
}

fn canonicalize(token: &str) -> &str {
    SPELLINGS.get(token).copied().unwrap_or(token)
}

/// Look up a built-in unit token, expanding SI/binary prefixes and plural
/// spellings. Does not consult user aliases — see `crate::alias::AliasTable`.
pub fn resolve_builtin(token: &str) -> Result<ResolvedUnit> {
    let canon = canonicalize(token);
    if let Some(def) = UNITS.get(canon) {
        return Ok(ResolvedUnit {
            canonical_symbol: def.symbol.to_string(),
            dimension: def.dimension,
            category: def.category,
            to_base_factor: def.to_base_factor,
            to_base_offset: def.to_base_offset,
        });
    }

    // `m` is 1 character, so prefixes must be tried longest-first to avoid
    // "mi" being misread as milli + "i".
    for (prefix, factor) in PREFIXES.entries() {
        if let Some(rest) = canon.strip_prefix(prefix) {
            if rest.is_empty() {
                continue;
            }
            let base_canon = canonicalize(rest);
            if let Some(def) = UNITS.get(base_canon) {
                if def.to_base_offset != 0.0 {
                    // Prefixes on affine (temperature) units are not physically meaningful.
                    continue;
                }
                return Ok(ResolvedUnit {
                    canonical_symbol: format!("{prefix}{}", def.symbol),
                    dimension: def.dimension,
                    category: def.category,
                    to_base_factor: def.to_base_factor * factor,
                    to_base_offset: 0.0,
                });
            }
        }
    }

    for (prefix, factor) in BINARY_PREFIXES.entries() {
        if let Some(rest) = canon.strip_prefix(prefix) {
            let base_canon = canonicalize(rest);
            if let Some(def) = UNITS.get(base_canon) {
                if def.category != Category::Information {
                    continue;
                }
                return Ok(ResolvedUnit {
                    canonical_symbol: format!("{prefix}{}", def.symbol),
                    dimension: def.dimension,
                    category: def.category,
                    to_base_factor: def.to_base_factor * factor,
                    to_base_offset: 0.0,
                });
            }
        }
    }

    Err(Error::UnknownUnit(token.to_string()))
}

/// Given a pure (non-affine) dimension, return the SI name conventionally
/// used for display simplification (spec.md 4.5: `Pa·m³→J`, `N·m→J`,
/// `kg·m/s²→N`).
pub fn canonical_symbol_for_dimension(dim: Dimension) -> Option<&'static str> {
    match dim {
        Dimension::FORCE => Some("N"),
        Dimension::ENERGY => Some("J"),
        Dimension::POWER => Some("W"),
        Dimension::PRESSURE => Some("Pa"),
        Dimension::FREQUENCY => Some("Hz"),
        Dimension::AREA => Some("m^2"),
        Dimension::VOLUME => Some("m^3"),
        Dimension::VELOCITY => Some("m/s"),
        Dimension::ACCELERATION => Some("m/s^2"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_symbol() {
        let r = resolve_builtin("m").unwrap();
        assert_eq!(r.canonical_symbol, "m");
        assert_eq!(r.to_base_factor, 1.0);
    }

    #[test]
    fn resolves_prefixed_symbol() {
        let r = resolve_builtin("km").unwrap();
        assert_eq!(r.canonical_symbol, "km");
        assert_eq!(r.to_base_factor, 1000.0);
        assert_eq!(r.dimension, Dimension::LENGTH);
    }

    #[test]
    fn resolves_plural_spelling() {
        let r = resolve_builtin("feet").unwrap();
        assert_eq!(r.canonical_symbol, "ft");
    }

    #[test]
    fn mile_is_not_milli_inch() {
        let r = resolve_builtin("mi").unwrap();
        assert_eq!(r.canonical_symbol, "mi");
        assert!((r.to_base_factor - 1609.344).abs() < 1e-6);
    }

    #[test]
    fn unknown_unit_errors() {
        assert!(resolve_builtin("frobnicate").is_err());
    }

    #[test]
    fn prefix_rejected_on_affine_unit() {
        // "kC" is not a meaningful unit (no prefixed Celsius).
        assert!(resolve_builtin("kC").is_err());
    }
}
