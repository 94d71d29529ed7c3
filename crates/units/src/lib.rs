//! Dimensional analysis, unit registry, and quantity arithmetic.
//!
//! This crate knows nothing about the expression language above it — it is
//! the leaf component the system overview (spec.md 2) calls "Dimensions &
//! Unit Registry" and "Quantity Engine", kept separate the way
//! `ferrum-ucum` is kept separate from `ferrum-fhirpath`.

pub mod alias;
pub mod composite;
pub mod dimension;
pub mod error;
pub mod quantity;
pub mod registry;
pub mod resolver;

pub use alias::{AliasDef, AliasTable};
pub use composite::CompositeUnit;
pub use dimension::Dimension;
pub use error::{Error, Result};
pub use quantity::Quantity;
pub use registry::{canonical_symbol_for_dimension, resolve_builtin, Category, ResolvedUnit, UnitDef};
pub use resolver::{Resolver, ResolvedComposite};
