//! Tokenizer for a single notebook line.
//!
//! Character-at-a-time scanner in the shape of `ferrum-fhirpath/src/lexer.rs`
//! (a `Vec<char>` buffer, `advance`/`peek`, one `next_token` per call), but
//! recognizing the richer literal set spec.md 4.1 asks for: numbers with
//! thousands grouping, currency literals, compact unit literals, percentage
//! literals, and date/time literals, ahead of the FHIRPath-style keyword and
//! operator tables.

use crate::error::{Error, Result};
use crate::token::{Token, TokenType, KEYWORDS};
use phf::phf_map;

/// Injected so the lexer can recognize `3km`/`2 workweeks` as a single
/// compact unit literal without owning the unit registry itself — the
/// engine supplies a view over built-ins plus the document's current
/// aliases.
pub trait UnitLookup {
    fn is_unit_token(&self, token: &str) -> bool;
}

/// A `UnitLookup` that recognizes nothing; useful for tests and for
/// contexts where unit-suffix fusion isn't wanted.
pub struct NoUnits;
impl UnitLookup for NoUnits {
    fn is_unit_token(&self, _token: &str) -> bool {
        false
    }
}

static CURRENCY_SYMBOLS: phf_map::Map<char, &'static str> = phf_map! {
    '$' => "USD",
    '\u{20ac}' => "EUR",
    '\u{a3}' => "GBP",
    '\u{a5}' => "JPY",
};

static ISO_CODES: phf::Set<&'static str> = phf::phf_set! {
    "USD", "EUR", "GBP", "JPY", "CNY", "CAD", "AUD", "CHF", "INR", "MXN",
};

pub struct Lexer<'a> {
    chars: Vec<char>,
    position: usize,
    units: &'a dyn UnitLookup,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, units: &'a dyn UnitLookup) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            units,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenType::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.position;
        let Some(c) = self.current() else {
            return Ok(Token::eof(start));
        };

        if c == '#' {
            while self.current().is_some() {
                self.advance();
            }
            return Ok(Token::eof(start));
        }

        if c == '"' {
            return self.scan_string();
        }

        if self.looks_like_ref_placeholder() {
            return self.scan_ref_placeholder();
        }

        if self.looks_like_iso_date() {
            return self.scan_date();
        }

        if let Some(&code) = CURRENCY_SYMBOLS.get(&c) {
            self.advance();
            self.skip_whitespace();
            if matches!(self.current(), Some(d) if d.is_ascii_digit() || d == '.') {
                return self.scan_currency_amount(code);
            }
            // Bare currency marker, e.g. "total to $": no amount follows.
            return Ok(Token::new(TokenType::Identifier, code, start));
        }

        if c.is_ascii_digit() || (c == '.' && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()))
        {
            return self.scan_number_and_suffix();
        }

        if c.is_alphabetic() || c == '_' {
            return self.scan_identifier_or_currency_prefix();
        }

        self.scan_operator(c, start)
    }

    fn scan_string(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // opening quote
        let mut content = String::new();
        loop {
            match self.current() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Ok(Token::error("unterminated string literal", start)),
            }
        }
        Ok(Token::new(TokenType::StringLiteral, content, start))
    }

    fn looks_like_ref_placeholder(&self) -> bool {
        let prefix = "__sp_ref_";
        self.matches_literal(prefix)
    }

    fn matches_literal(&self, needle: &str) -> bool {
        needle
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn scan_ref_placeholder(&mut self) -> Result<Token> {
        let start = self.position;
        let mut text = String::new();
        // Consume "__sp_ref_", then [a-z0-9]+, then the closing "__".
        for _ in 0.."__sp_ref_".len() {
            text.push(self.current().unwrap());
            self.advance();
        }
        while matches!(self.current(), Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit()) {
            text.push(self.current().unwrap());
            self.advance();
        }
        if self.matches_literal("__") {
            text.push_str("__");
            self.advance();
            self.advance();
            Ok(Token::new(TokenType::IdentifierReference, text, start))
        } else {
            Ok(Token::error("malformed reference placeholder", start))
        }
    }

    fn looks_like_iso_date(&self) -> bool {
        (0..4).all(|i| matches!(self.peek_at(i), Some(c) if c.is_ascii_digit()))
            && self.peek_at(4) == Some('-')
    }

    fn scan_date(&mut self) -> Result<Token> {
        let start = self.position;
        let consume_digits = |lexer: &mut Self, n: usize, out: &mut String| -> bool {
            for _ in 0..n {
                match lexer.current() {
                    Some(c) if c.is_ascii_digit() => {
                        out.push(c);
                        lexer.advance();
                    }
                    _ => return false,
                }
            }
            true
        };

        let mut text = String::new();
        if !consume_digits(self, 4, &mut text) {
            return Ok(Token::error("invalid date literal", start));
        }
        text.push('-');
        self.advance();
        let mut month = String::new();
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) && month.len() < 2 {
            month.push(self.current().unwrap());
            self.advance();
        }
        if month.is_empty() || self.current() != Some('-') {
            return Ok(Token::error("invalid date literal", start));
        }
        text.push_str(&month);
        text.push('-');
        self.advance();
        let mut day = String::new();
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) && day.len() < 2 {
            day.push(self.current().unwrap());
            self.advance();
        }
        if day.is_empty() {
            return Ok(Token::error("invalid date literal", start));
        }
        text.push_str(&day);

        // Optional " HH:MM[:SS]"
        if self.current() == Some(' ') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit())
        {
            let save = self.position;
            let mut time_text = String::from(" ");
            self.advance();
            let mut ok = true;
            let mut hh = String::new();
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) && hh.len() < 2 {
                hh.push(self.current().unwrap());
                self.advance();
            }
            ok &= !hh.is_empty() && self.current() == Some(':');
            if ok {
                time_text.push_str(&hh);
                time_text.push(':');
                self.advance();
                let mut mm = String::new();
                while matches!(self.current(), Some(c) if c.is_ascii_digit()) && mm.len() < 2 {
                    mm.push(self.current().unwrap());
                    self.advance();
                }
                ok &= mm.len() == 2;
                time_text.push_str(&mm);
                if ok && self.current() == Some(':') {
                    let restore = self.position;
                    self.advance();
                    let mut ss = String::new();
                    while matches!(self.current(), Some(c) if c.is_ascii_digit()) && ss.len() < 2 {
                        ss.push(self.current().unwrap());
                        self.advance();
                    }
                    if ss.len() == 2 {
                        time_text.push(':');
                        time_text.push_str(&ss);
                    } else {
                        self.position = restore;
                    }
                }
            }
            if ok {
                text.push_str(&time_text);
                // Optional zone: " UTC" or "+HH:MM"/"-HH:MM".
                if self.current() == Some(' ') && self.matches_literal(" UTC") {
                    text.push_str(" UTC");
                    self.position += 4;
                } else if matches!(self.current(), Some('+') | Some('-')) {
                    let zone_start = self.position;
                    let mut zone = String::new();
                    zone.push(self.current().unwrap());
                    self.advance();
                    let mut digits = String::new();
                    while matches!(self.current(), Some(c) if c.is_ascii_digit() || c == ':')
                        && digits.len() < 5
                    {
                        digits.push(self.current().unwrap());
                        self.advance();
                    }
                    if digits.len() >= 4 {
                        zone.push_str(&digits);
                        text.push_str(&zone);
                    } else {
                        self.position = zone_start;
                    }
                }
            } else {
                self.position = save;
            }
        }

        Ok(Token::new(TokenType::DateLiteral, text, start))
    }

    fn scan_currency_amount(&mut self, code: &'static str) -> Result<Token> {
        let start = self.position;
        if !matches!(self.current(), Some(c) if c.is_ascii_digit() || c == '.') {
            return Ok(Token::error("expected amount after currency symbol", start));
        }
        let number = self.scan_plain_number()?;
        Ok(Token::new(TokenType::CurrencyLiteral, number, start).with_suffix(code))
    }

    fn scan_plain_number(&mut self) -> Result<String> {
        let start = self.position;
        let mut saw_comma = false;
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == ',' && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                saw_comma = true;
                self.advance();
            } else {
                break;
            }
        }
        if self.current() == Some('.') && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit())
        {
            self.advance();
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            let save = self.position;
            self.advance();
            let mut exp = String::new();
            if matches!(self.current(), Some('+') | Some('-')) {
                exp.push(self.current().unwrap());
                self.advance();
            }
            let mut had_digit = false;
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                exp.push(self.current().unwrap());
                self.advance();
                had_digit = true;
            }
            if !had_digit {
                self.position = save;
            }
        }
        let lexeme: String = self.chars[start..self.position].iter().collect();
        if saw_comma {
            return Err(Error::GroupingInInput);
        }
        Ok(lexeme)
    }

    fn scan_number_and_suffix(&mut self) -> Result<Token> {
        let start = self.position;
        let number = match self.scan_plain_number() {
            Ok(n) => n,
            Err(Error::GroupingInInput) => {
                return Ok(Token::error("GroupingInInput", start));
            }
            Err(other) => return Err(other),
        };

        // Immediate (no whitespace) trailing currency symbol: "100$".
        if let Some(&code) = self.current().and_then(|c| CURRENCY_SYMBOLS.get(&c)) {
            self.advance();
            return Ok(Token::new(TokenType::CurrencyLiteral, number, start).with_suffix(code));
        }

        // Immediate percentage sign.
        if self.current() == Some('%') {
            self.advance();
            return Ok(Token::new(TokenType::PercentageLiteral, number, start));
        }

        // Immediate unit suffix: letters directly touching the digits, not
        // followed by `(` (which would make it a function call instead).
        if matches!(self.current(), Some(c) if c.is_alphabetic()) {
            let ident_start = self.position;
            let mut ident = String::new();
            while matches!(self.current(), Some(c) if c.is_alphanumeric()) {
                ident.push(self.current().unwrap());
                self.advance();
            }
            if self.current() != Some('(') && self.units.is_unit_token(&ident) {
                return Ok(Token::new(TokenType::UnitLiteral, number, start).with_suffix(ident));
            }
            // Not a recognized unit: rewind, the identifier becomes its own
            // token and the parser inserts implicit multiplication.
            self.position = ident_start;
        }

        // Suffix ISO currency code with a single separating space: "12 EUR".
        if self.current() == Some(' ') {
            let save = self.position;
            self.advance();
            let mut code = String::new();
            while matches!(self.current(), Some(c) if c.is_ascii_uppercase()) && code.len() < 3 {
                code.push(self.current().unwrap());
                self.advance();
            }
            if code.len() == 3 && ISO_CODES.contains(code.as_str()) {
                let leaked: &'static str = Box::leak(code.into_boxed_str());
                return Ok(Token::new(TokenType::CurrencyLiteral, number, start).with_suffix(leaked));
            }
            self.position = save;
        }

        Ok(Token::new(TokenType::Number, number, start))
    }

    fn scan_identifier_or_currency_prefix(&mut self) -> Result<Token> {
        let start = self.position;
        let mut ident = String::new();
        while matches!(self.current(), Some(c) if c.is_alphanumeric() || c == '_') {
            ident.push(self.current().unwrap());
            self.advance();
        }

        if ident.len() == 3 && ISO_CODES.contains(ident.as_str()) {
            let save = self.position;
            self.skip_whitespace();
            if matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                let code: &'static str = match ident.as_str() {
                    "USD" => "USD",
                    "EUR" => "EUR",
                    "GBP" => "GBP",
                    "JPY" => "JPY",
                    "CNY" => "CNY",
                    "CAD" => "CAD",
                    "AUD" => "AUD",
                    "CHF" => "CHF",
                    "INR" => "INR",
                    "MXN" => "MXN",
                    _ => unreachable!(),
                };
                let number = self.scan_plain_number()?;
                return Ok(Token::new(TokenType::CurrencyLiteral, number, start).with_suffix(code));
            }
            self.position = save;
        }

        if let Some(kw) = KEYWORDS.get(ident.as_str()) {
            return Ok(Token::new(kw.clone(), ident, start));
        }

        Ok(Token::new(TokenType::Identifier, ident, start))
    }

    fn scan_operator(&mut self, c: char, start: usize) -> Result<Token> {
        self.advance();
        let kind = match c {
            '+' => TokenType::Plus,
            '-' => {
                if self.current() == Some('>') {
                    // not part of grammar; treat as error
                    self.advance();
                    return Ok(Token::error("unexpected '->'", start));
                }
                TokenType::Minus
            }
            '*' => TokenType::Star,
            '/' => TokenType::Slash,
            '^' => TokenType::Caret,
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            ',' => TokenType::Comma,
            ':' => TokenType::Colon,
            '%' => TokenType::Percent,
            '.' => {
                if self.current() == Some('.') {
                    self.advance();
                    TokenType::DotDot
                } else {
                    TokenType::Dot
                }
            }
            '=' => {
                if self.current() == Some('>') {
                    self.advance();
                    TokenType::FatArrow
                } else if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenType::CompareOp, "==", start));
                } else {
                    TokenType::Equal
                }
            }
            '>' => {
                if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenType::CompareOp, ">=", start));
                }
                return Ok(Token::new(TokenType::CompareOp, ">", start));
            }
            '<' => {
                if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenType::CompareOp, "<=", start));
                }
                return Ok(Token::new(TokenType::CompareOp, "<", start));
            }
            '!' => {
                if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::new(TokenType::CompareOp, "!=", start));
                }
                return Ok(Token::error("unexpected character '!'", start));
            }
            other => return Ok(Token::error(format!("unexpected character '{other}'"), start)),
        };
        Ok(Token::new(kind, c.to_string(), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_plain_assignment() {
        let lex = Lexer::new("price = 3", &NoUnits);
        let toks = lex.tokenize().unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Identifier,
                TokenType::Equal,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn recognizes_currency_prefix_symbol() {
        let lex = Lexer::new("$4", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::CurrencyLiteral);
        assert_eq!(toks[0].unit_suffix.as_deref(), Some("USD"));
        assert_eq!(toks[0].lexeme, "4");
    }

    #[test]
    fn recognizes_trailing_currency_symbol() {
        let lex = Lexer::new("100$", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::CurrencyLiteral);
        assert_eq!(toks[0].unit_suffix.as_deref(), Some("USD"));
    }

    struct OnlyFt;
    impl UnitLookup for OnlyFt {
        fn is_unit_token(&self, token: &str) -> bool {
            token == "ft" || token == "m" || token == "h"
        }
    }

    #[test]
    fn recognizes_compact_unit_literal() {
        let lex = Lexer::new("100 ft", &OnlyFt);
        let toks = lex.tokenize().unwrap();
        // "100" then whitespace then "ft": whitespace means it's not fused,
        // it stays a separate identifier token (implicit-mult territory).
        assert_eq!(toks[0].kind, TokenType::Number);
        assert_eq!(toks[1].kind, TokenType::Identifier);
    }

    #[test]
    fn recognizes_fused_compact_unit_literal() {
        let lex = Lexer::new("3km", &OnlyFt);
        // "km" isn't registered in OnlyFt, so this exercises the
        // "not a unit -> leave as separate tokens" path instead.
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::Number);
        assert_eq!(toks[1].kind, TokenType::Identifier);

        let lex2 = Lexer::new("3h", &OnlyFt);
        let toks2 = lex2.tokenize().unwrap();
        assert_eq!(toks2[0].kind, TokenType::UnitLiteral);
        assert_eq!(toks2[0].unit_suffix.as_deref(), Some("h"));
    }

    #[test]
    fn rejects_grouping_in_input() {
        let lex = Lexer::new("12,345", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::Error);
        assert_eq!(toks[0].lexeme, "GroupingInInput");
    }

    #[test]
    fn recognizes_percentage_literal() {
        let lex = Lexer::new("15%", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::PercentageLiteral);
        assert_eq!(toks[0].lexeme, "15");
    }

    #[test]
    fn recognizes_reference_placeholder() {
        let lex = Lexer::new("__sp_ref_ab12__ + 1", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::IdentifierReference);
        assert_eq!(toks[0].lexeme, "__sp_ref_ab12__");
    }

    #[test]
    fn recognizes_iso_date() {
        let lex = Lexer::new("2024-01-15", &NoUnits);
        let toks = lex.tokenize().unwrap();
        assert_eq!(toks[0].kind, TokenType::DateLiteral);
        assert_eq!(toks[0].lexeme, "2024-01-15");
    }

    #[test]
    fn keywords_are_recognized() {
        let lex = Lexer::new("100 ft to m", &OnlyFt);
        let toks = lex.tokenize().unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind.clone()).collect();
        assert!(kinds.contains(&TokenType::To));
    }
}
