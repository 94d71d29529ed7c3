//! User-defined unit aliases.
//!
//! spec.md 4.4: "a variable assignment whose right side is `N unit_expr`
//! ... registers an alias `name → (factor, unit_expr)`"; numeric-only
//! aliases (`dozen = 12`) define a countable unit with dimension "count".
//! Circular alias chains are detected by DFS at resolution time (spec.md
//! 9, "Unit aliases & shadowing").
//!
//! Kept as its own small module the way `ferrum-fhirpath/src/variables.rs`
//! keeps the (conceptually similar) reactive-name registry separate from
//! the engine that walks it — an `AliasTable` only ever knows about names
//! and their definitions, never about the expression language above it.

use crate::composite::CompositeUnit;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq)]
pub enum AliasDef {
    /// `name = factor unit_expr`, e.g. `workweek = 40 h`.
    Scaled { factor: f64, unit: CompositeUnit },
    /// `name = factor` with no unit on the right, e.g. `dozen = 12`.
    Count { factor: f64 },
}

/// Insertion-ordered so that alias shadowing/iteration order matches
/// definition order, the same property spec.md 5 asks of the document's
/// line order for variables and equations.
#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    aliases: IndexMap<String, AliasDef>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AliasDef> {
        self.aliases.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn define_scaled(&mut self, name: &str, factor: f64, unit: CompositeUnit) -> Result<()> {
        let mut visiting = HashSet::new();
        self.check_acyclic(name, &unit, &mut visiting)?;
        self.aliases
            .insert(name.to_string(), AliasDef::Scaled { factor, unit });
        Ok(())
    }

    pub fn define_count(&mut self, name: &str, factor: f64) {
        self.aliases
            .insert(name.to_string(), AliasDef::Count { factor });
    }

    pub fn remove(&mut self, name: &str) {
        self.aliases.shift_remove(name);
    }

    /// Refuse to register `target` if any unit token reachable from `unit`
    /// (through other aliases) is `target` itself.
    fn check_acyclic(
        &self,
        target: &str,
        unit: &CompositeUnit,
        visiting: &mut HashSet<String>,
    ) -> Result<()> {
        for (token, _power) in unit.parts() {
            if token == target {
                return Err(Error::CircularUnitAlias(target.to_string()));
            }
            if !visiting.insert(token.to_string()) {
                continue;
            }
            if let Some(AliasDef::Scaled { unit: inner, .. }) = self.aliases.get(token) {
                self.check_acyclic(target, inner, visiting)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_and_looks_up_scaled_alias() {
        let mut t = AliasTable::new();
        t.define_scaled("workweek", 40.0, CompositeUnit::single("h"))
            .unwrap();
        match t.get("workweek").unwrap() {
            AliasDef::Scaled { factor, unit } => {
                assert_eq!(*factor, 40.0);
                assert_eq!(unit.to_string(), "h");
            }
            AliasDef::Count { .. } => panic!("expected scaled alias"),
        }
    }

    #[test]
    fn rejects_self_referential_alias() {
        let mut t = AliasTable::new();
        let err = t
            .define_scaled("loop_unit", 1.0, CompositeUnit::single("loop_unit"))
            .unwrap_err();
        assert!(matches!(err, Error::CircularUnitAlias(_)));
    }

    #[test]
    fn rejects_transitive_cycle() {
        let mut t = AliasTable::new();
        t.define_scaled("a", 2.0, CompositeUnit::single("b")).unwrap();
        let err = t
            .define_scaled("b", 3.0, CompositeUnit::single("a"))
            .unwrap_err();
        assert!(matches!(err, Error::CircularUnitAlias(_)));
    }
}
