//! Integration coverage mirroring `ferrum-ucum/tests/basic.rs`: exercise the
//! registry, aliasing, and quantity arithmetic the way a caller outside the
//! crate would.

use notecalc_units::{AliasTable, CompositeUnit, Quantity, Resolver};

#[test]
fn workweek_alias_converts_to_hours() {
    let mut aliases = AliasTable::new();
    aliases
        .define_scaled("workweek", 40.0, CompositeUnit::single("h"))
        .unwrap();
    let resolver = Resolver::new(&aliases);

    let two_workweeks = Quantity::new(2.0, CompositeUnit::single("workweek"));
    let in_hours = two_workweeks
        .convert_to(&CompositeUnit::single("h"), &resolver)
        .unwrap();
    assert!((in_hours.value - 80.0).abs() < 1e-9);
}

#[test]
fn rate_times_length_matches_scenario() {
    // "$8/ft" then "4 m * $8/ft => $104.986..." from spec.md 8.4 — the
    // currency side is handled at the engine's Value layer; here we confirm
    // the unit conversion underneath: 4 m expressed in ft.
    let aliases = AliasTable::new();
    let resolver = Resolver::new(&aliases);
    let four_m = Quantity::new(4.0, CompositeUnit::single("m"));
    let in_ft = four_m.convert_to(&CompositeUnit::single("ft"), &resolver).unwrap();
    assert!((in_ft.value * 8.0 - 104.986_876).abs() < 1e-3);
}

#[test]
fn dozen_is_a_countable_dimensionless_alias() {
    let mut aliases = AliasTable::new();
    aliases.define_count("dozen", 12.0);
    let resolver = Resolver::new(&aliases);
    let resolved = resolver
        .resolve_composite(&CompositeUnit::single("dozen"))
        .unwrap();
    assert!(resolved.dimension.is_dimensionless());
    assert_eq!(resolved.to_base_factor, 12.0);
}

#[test]
fn incompatible_dimensions_error() {
    let aliases = AliasTable::new();
    let resolver = Resolver::new(&aliases);
    let meters = Quantity::new(1.0, CompositeUnit::single("m"));
    let seconds = Quantity::new(1.0, CompositeUnit::single("s"));
    assert!(meters.add(&seconds, &resolver).is_err());
}

#[test]
fn pressure_times_volume_simplifies_to_energy_dimension() {
    use notecalc_units::{canonical_symbol_for_dimension, Dimension};
    assert_eq!(
        canonical_symbol_for_dimension(Dimension::PRESSURE + Dimension::VOLUME),
        Some("J")
    );
}
