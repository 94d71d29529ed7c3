//! Token types for the notebook calculator lexer.
//!
//! Shaped after `ferrum-fhirpath/src/token.rs`: a flat `TokenType` enum plus
//! a `Token` struct carrying the raw lexeme and source position, so the
//! parser (and, per spec.md 3.9, live re-rendering) can always recover the
//! original text a token came from.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Number,
    /// A number immediately followed by a currency/unit suffix, kept as one
    /// token with the unit lexeme preserved on `Token::unit_suffix`.
    CurrencyLiteral,
    UnitLiteral,
    PercentageLiteral,
    DateLiteral,
    StringLiteral,
    Identifier,
    /// `__sp_ref_[a-z0-9]+__` — an opaque reference placeholder, treated as
    /// an ordinary free variable per spec.md 9 and 6.3.
    IdentifierReference,

    // Keywords
    To,
    In,
    Of,
    On,
    Off,
    As,
    Per,
    Mod,
    Where,
    Step,
    Solve,
    Desc,

    // Operators / punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    DotDot,
    Colon,
    /// A bare `%` not fused onto a preceding number (`a / b as %`).
    Percent,
    Equal,
    FatArrow,
    /// `>`, `<`, `>=`, `<=`, `==`, `!=` — `where`-predicate comparators
    /// (spec.md 4.8); the lexeme carries which spelling matched.
    CompareOp,

    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    pub position: usize,
    /// For `UnitLiteral`/`CurrencyLiteral`, the unit/currency lexeme that
    /// was fused onto the numeric literal (e.g. `"km"` in `3km`).
    pub unit_suffix: Option<String>,
}

impl Token {
    pub fn new(kind: TokenType, lexeme: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
            unit_suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.unit_suffix = Some(suffix.into());
        self
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenType::Eof, "", position)
    }

    pub fn error(message: impl Into<String>, position: usize) -> Self {
        Self::new(TokenType::Error, message, position)
    }
}

/// Keyword lookup — a perfect hash map the way
/// `ferrum-fhirpath/src/functions.rs` uses `phf_map!` for its function
/// registry, applied here to reserved words instead.
pub static KEYWORDS: phf::Map<&'static str, TokenType> = phf::phf_map! {
    "to" => TokenType::To,
    "in" => TokenType::In,
    "of" => TokenType::Of,
    "on" => TokenType::On,
    "off" => TokenType::Off,
    "as" => TokenType::As,
    "per" => TokenType::Per,
    "mod" => TokenType::Mod,
    "where" => TokenType::Where,
    "step" => TokenType::Step,
    "solve" => TokenType::Solve,
    "desc" => TokenType::Desc,
};
