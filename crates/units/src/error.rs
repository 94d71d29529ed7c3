//! Error type for the unit/quantity subsystem.
//!
//! Shaped like `ferrum-ucum/src/error.rs`: one flat enum, each variant a
//! fixed, documented message a caller can surface verbatim.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("cannot combine incompatible units '{left}' and '{right}'")]
    IncompatibleUnits { left: String, right: String },

    #[error("circular unit alias detected starting at '{0}'")]
    CircularUnitAlias(String),

    #[error("exponent {0} is not supported for this unit composition")]
    NonNumericExponent(f64),

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow")]
    Overflow,
}
