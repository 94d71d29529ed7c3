//! Engine error type.
//!
//! One variant per kind enumerated in spec.md 7, shaped after
//! `ferrum-fhirpath/src/error.rs` (flat `thiserror` enum, each message
//! fixed and documented) with unit errors folded in transparently, the way
//! a dependent crate's error commonly rides along via `#[from]`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("thousands separators are not allowed in input values")]
    GroupingInInput,

    #[error("incompatible units: {0}")]
    IncompatibleUnits(String),

    #[error("currencies '{left}' and '{right}' cannot be combined")]
    IncompatibleCurrency { left: String, right: String },

    #[error("list items do not share a compatible dimension")]
    IncompatibleListDimensions,

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("unknown named argument '{0}'")]
    UnknownNamedArgument(String),

    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("circular unit alias detected starting at '{0}'")]
    CircularUnitAlias(String),

    #[error("circular dependency involving '{0}'")]
    CircularDependency(String),

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("list lengths do not match")]
    ListLengthMismatch,

    #[error("list exceeds the maximum allowed length ({0})")]
    ListTooLong(usize),

    #[error("nested lists are not supported")]
    NestedListUnsupported,

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow")]
    Overflow,

    #[error("invalid date literal '{0}'")]
    InvalidDateLiteral(String),

    #[error("invalid duration step")]
    InvalidDurationStep,

    #[error("range step sign must match range direction")]
    NegativeRangeStep,

    #[error("slice range must not be reversed")]
    NonMonotonicSlice,

    #[error("no equation found for '{0}'")]
    NoEquation(String),

    #[error("multiple equations contain target '{0}'")]
    MultipleEquationsContainTarget(String),

    #[error("exponent must be numeric to solve for '{0}'")]
    NonNumericExponent(String),

    #[error("variable '{0}' appears on both sides of the equation")]
    VariableOnBothSides(String),

    #[error("currency exchange rate unavailable for '{0}'")]
    RateUnavailable(String),

    #[error(transparent)]
    Unit(#[from] notecalc_units::Error),
}

impl Error {
    /// The fixed, user-facing kind tag used by render nodes (spec.md 6.2's
    /// `error{kind, error, displayText}`).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Syntax(_) => "Syntax",
            Error::GroupingInInput => "GroupingInInput",
            Error::IncompatibleUnits(_) => "IncompatibleUnits",
            Error::IncompatibleCurrency { .. } => "IncompatibleCurrency",
            Error::IncompatibleListDimensions => "IncompatibleListDimensions",
            Error::UnknownUnit(_) => "UnknownUnit",
            Error::UnknownFunction(_) => "UnknownFunction",
            Error::UnknownNamedArgument(_) => "UnknownNamedArgument",
            Error::MissingArgument(_) => "MissingArgument",
            Error::CircularUnitAlias(_) => "CircularUnitAlias",
            Error::CircularDependency(_) => "CircularDependency",
            Error::UndefinedVariable(_) => "UndefinedVariable",
            Error::ListLengthMismatch => "ListLengthMismatch",
            Error::ListTooLong(_) => "ListTooLong",
            Error::NestedListUnsupported => "NestedListUnsupported",
            Error::DivisionByZero => "DivisionByZero",
            Error::Overflow => "Overflow",
            Error::InvalidDateLiteral(_) => "InvalidDateLiteral",
            Error::InvalidDurationStep => "InvalidDurationStep",
            Error::NegativeRangeStep => "NegativeRangeStep",
            Error::NonMonotonicSlice => "NonMonotonicSlice",
            Error::NoEquation(_) => "NoEquation",
            Error::MultipleEquationsContainTarget(_) => "MultipleEquationsContainTarget",
            Error::NonNumericExponent(_) => "NonNumericExponent",
            Error::VariableOnBothSides(_) => "VariableOnBothSides",
            Error::RateUnavailable(_) => "RateUnavailable",
            Error::Unit(inner) => match inner {
                notecalc_units::Error::UnknownUnit(_) => "UnknownUnit",
                notecalc_units::Error::IncompatibleUnits { .. } => "IncompatibleUnits",
                notecalc_units::Error::CircularUnitAlias(_) => "CircularUnitAlias",
                notecalc_units::Error::NonNumericExponent(_) => "NonNumericExponent",
                notecalc_units::Error::DivisionByZero => "DivisionByZero",
                notecalc_units::Error::Overflow => "Overflow",
            },
        }
    }
}
