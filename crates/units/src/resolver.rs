//! Combines the built-in registry with a document's user aliases to resolve
//! a [`CompositeUnit`] to a dimension and an SI-base conversion factor.

use crate::alias::{AliasDef, AliasTable};
use crate::composite::CompositeUnit;
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::registry::{self, Category};

/// A resolved composite unit: its physical dimension, the multiplicative
/// factor to its SI base, and — only meaningful when the composite is a
/// single power-1 token — an affine offset and display category.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedComposite {
    pub dimension: Dimension,
    pub to_base_factor: f64,
    pub to_base_offset: f64,
    pub category: Option<Category>,
}

const MAX_ALIAS_DEPTH: usize = 32;

/// Resolves unit tokens against built-ins first, then user aliases.
pub struct Resolver<'a> {
    pub aliases: &'a AliasTable,
}

impl<'a> Resolver<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    pub fn resolve_composite(&self, unit: &CompositeUnit) -> Result<ResolvedComposite> {
        if unit.is_dimensionless() {
            return Ok(ResolvedComposite {
                dimension: Dimension::DIMENSIONLESS,
                to_base_factor: 1.0,
                to_base_offset: 0.0,
                category: None,
            });
        }

        let single_affine = unit
            .as_single()
            .and_then(|token| self.resolve_token(token, 0).ok())
            .filter(|r| r.to_base_offset != 0.0);
        if let Some(r) = single_affine {
            return Ok(ResolvedComposite {
                dimension: r.dimension,
                to_base_factor: r.to_base_factor,
                to_base_offset: r.to_base_offset,
                category: Some(r.category),
            });
        }

        let mut dimension = Dimension::DIMENSIONLESS;
        let mut factor = 1.0;
        let mut only_category = None;
        let mut component_count = 0;
        for (token, power) in unit.parts() {
            let resolved = self.resolve_token(token, 0)?;
            if resolved.to_base_offset != 0.0 && power != 1 {
                return Err(Error::NonNumericExponent(power as f64));
            }
            dimension = dimension + resolved.dimension * (power as i8);
            factor *= resolved.to_base_factor.powi(power);
            component_count += 1;
            only_category = Some(resolved.category);
        }
        Ok(ResolvedComposite {
            dimension,
            to_base_factor: factor,
            to_base_offset: 0.0,
            category: if component_count == 1 {
                only_category
            } else {
                None
            },
        })
    }

    fn resolve_token(&self, token: &str, depth: usize) -> Result<TokenResolution> {
        if depth > MAX_ALIAS_DEPTH {
            return Err(Error::CircularUnitAlias(token.to_string()));
        }
        // User aliases shadow built-ins of the same spelling (spec.md 9).
        if let Some(def) = self.aliases.get(token) {
            return match def {
                AliasDef::Count { factor } => Ok(TokenResolution {
                    dimension: Dimension::DIMENSIONLESS,
                    category: Category::Count,
                    to_base_factor: *factor,
                    to_base_offset: 0.0,
                }),
                AliasDef::Scaled { factor, unit } => {
                    let mut dimension = Dimension::DIMENSIONLESS;
                    let mut total_factor = *factor;
                    let mut category = None;
                    for (inner_token, power) in unit.parts() {
                        let inner = self.resolve_token(inner_token, depth + 1)?;
                        dimension = dimension + inner.dimension * (power as i8);
                        total_factor *= inner.to_base_factor.powi(power);
                        category = Some(inner.category);
                    }
                    Ok(TokenResolution {
                        dimension,
                        category: category.unwrap_or(Category::Count),
                        to_base_factor: total_factor,
                        to_base_offset: 0.0,
                    })
                }
            };
        }
        let builtin = registry::resolve_builtin(token)?;
        Ok(TokenResolution {
            dimension: builtin.dimension,
            category: builtin.category,
            to_base_factor: builtin.to_base_factor,
            to_base_offset: builtin.to_base_offset,
        })
    }
}

struct TokenResolution {
    dimension: Dimension,
    category: Category,
    to_base_factor: f64,
    to_base_offset: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_composite() {
        let aliases = AliasTable::new();
        let r = Resolver::new(&aliases);
        let mps = CompositeUnit::single("m").mul(&CompositeUnit::single_pow("s", -1));
        let resolved = r.resolve_composite(&mps).unwrap();
        assert_eq!(resolved.dimension, Dimension::VELOCITY);
        assert_eq!(resolved.to_base_factor, 1.0);
    }

    #[test]
    fn resolves_alias_through_builtin() {
        let mut aliases = AliasTable::new();
        aliases
            .define_scaled("workweek", 40.0, CompositeUnit::single("h"))
            .unwrap();
        let r = Resolver::new(&aliases);
        let resolved = r.resolve_composite(&CompositeUnit::single("workweek")).unwrap();
        assert_eq!(resolved.dimension, Dimension::TIME);
        assert_eq!(resolved.to_base_factor, 40.0 * 3600.0);
    }

    #[test]
    fn affine_temperature_keeps_offset_only_for_singleton() {
        let aliases = AliasTable::new();
        let r = Resolver::new(&aliases);
        let resolved = r.resolve_composite(&CompositeUnit::single("C")).unwrap();
        assert_eq!(resolved.to_base_offset, 273.15);
    }
}
