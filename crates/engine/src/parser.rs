//! Expression parser and line classifier.
//!
//! Recursive-descent over the token stream, shaped after
//! `ferrum-fhirpath/src/parser.rs` (one function per precedence level,
//! `peek`/`advance`/`expect` helpers) but implementing spec.md 4.3's
//! notebook grammar (`where` lowest, `to`/`in`/`as %` next, then the usual
//! arithmetic ladder, with `of`/`on`/`off` percentage binders riding at
//! `*` precedence) instead of FHIRPath's boolean/path grammar.

use crate::ast::{Arg, AstNode, BinOp, Comparator, Expr, Param, PercentOp, UnaryOp};
use crate::error::{Error, Result};
use crate::lexer::{Lexer, UnitLookup};
use crate::token::{Token, TokenType};

/// Context-sensitive phrase-identifier recognition (spec.md 9): inside an
/// expression, a run of identifier tokens only merges into one phrase name
/// when the joined string is already a known variable/function name.
pub trait KnownNames {
    fn is_known_name(&self, candidate: &str) -> bool;
    fn is_known_function(&self, name: &str) -> bool {
        let _ = name;
        false
    }
}

pub struct NoKnownNames;
impl KnownNames for NoKnownNames {
    fn is_known_name(&self, _candidate: &str) -> bool {
        false
    }
}

/// Parses one notebook line into exactly one [`AstNode`].
pub fn parse_line(line: &str, units: &dyn UnitLookup, names: &dyn KnownNames) -> AstNode {
    let tokens = match Lexer::new(line, units).tokenize() {
        Ok(t) => t,
        Err(e) => {
            return AstNode::ErrorNode {
                kind: "Syntax".to_string(),
                message: e.to_string(),
            }
        }
    };
    classify(line, tokens, names)
}

/// Index of the first top-level (paren/bracket-depth 0) occurrence of `kind`.
fn find_top_level(tokens: &[Token], kind: TokenType) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate() {
        match &t.kind {
            TokenType::LParen | TokenType::LBracket => depth += 1,
            TokenType::RParen | TokenType::RBracket => depth -= 1,
            k if *k == kind && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_identifier_like(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace()
}

fn classify(raw: &str, tokens: Vec<Token>, names: &dyn KnownNames) -> AstNode {
    if tokens.iter().any(|t| t.kind == TokenType::Error) {
        let msg = tokens
            .iter()
            .find(|t| t.kind == TokenType::Error)
            .map(|t| t.lexeme.clone())
            .unwrap_or_default();
        if msg == "GroupingInInput" {
            return AstNode::ErrorNode {
                kind: "GroupingInInput".to_string(),
                message: Error::GroupingInInput.to_string(),
            };
        }
        return AstNode::ErrorNode {
            kind: "Syntax".to_string(),
            message: msg,
        };
    }

    if let Some(arrow_idx) = find_top_level(&tokens, TokenType::FatArrow) {
        let pre = &tokens[..arrow_idx];
        if let Some(eq_idx) = find_top_level(pre, TokenType::Equal) {
            let lhs_text = span_text(raw, pre, 0, eq_idx);
            let rhs_tokens = to_owned_with_eof(&pre[eq_idx + 1..]);
            if lhs_text.trim().is_empty() {
                return AstNode::ErrorNode {
                    kind: "MissingVariableName".to_string(),
                    message: "assignment is missing a variable name".to_string(),
                };
            }
            if !lhs_text.chars().all(is_identifier_like)
                || lhs_text.trim_start().starts_with(|c: char| c.is_ascii_digit())
            {
                return AstNode::ErrorNode {
                    kind: "Syntax".to_string(),
                    message: "invalid variable name".to_string(),
                };
            }
            return match parse_expr_tokens(rhs_tokens, names) {
                Ok(expr) => AstNode::CombinedAssignment {
                    name: lhs_text.trim().to_string(),
                    raw_expression: span_text(raw, pre, eq_idx + 1, pre.len()),
                    expr: Box::new(expr),
                },
                Err(e) => AstNode::ErrorNode {
                    kind: "Syntax".to_string(),
                    message: e.to_string(),
                },
            };
        }
        let expr_tokens = to_owned_with_eof(pre);
        return match parse_expr_tokens(expr_tokens, names) {
            Ok(expr) => AstNode::Expression {
                raw_expression: span_text(raw, &tokens, 0, arrow_idx),
                expr: Box::new(expr),
                live: true,
            },
            Err(e) => AstNode::ErrorNode {
                kind: "Syntax".to_string(),
                message: e.to_string(),
            },
        };
    }

    if let Some(eq_idx) = find_top_level(&tokens, TokenType::Equal) {
        let lhs = &tokens[..eq_idx];
        let rhs_tokens = to_owned_with_eof(&tokens[eq_idx + 1..]);

        // Function definition: `name(params) = body`.
        if lhs.len() >= 3
            && lhs[0].kind == TokenType::Identifier
            && lhs[1].kind == TokenType::LParen
            && lhs.last().map(|t| t.kind.clone()) == Some(TokenType::RParen)
        {
            return parse_function_definition(lhs, rhs_tokens, names);
        }

        let lhs_text = span_text(raw, &tokens, 0, eq_idx);
        if lhs_text.trim().is_empty() {
            return AstNode::ErrorNode {
                kind: "MissingVariableName".to_string(),
                message: "assignment is missing a variable name".to_string(),
            };
        }
        if lhs_text.chars().all(is_identifier_like)
            && !lhs_text.trim_start().starts_with(|c: char| c.is_ascii_digit())
        {
            return match parse_expr_tokens(rhs_tokens, names) {
                Ok(expr) => AstNode::VariableAssignment {
                    name: lhs_text.trim().to_string(),
                    raw_value: span_text(raw, &tokens, eq_idx + 1, tokens.len()),
                    parsed_value: Box::new(expr),
                },
                Err(e) => AstNode::ErrorNode {
                    kind: "Syntax".to_string(),
                    message: e.to_string(),
                },
            };
        }
        return AstNode::PlainText {
            content: raw.to_string(),
        };
    }

    AstNode::PlainText {
        content: raw.to_string(),
    }
}

fn parse_function_definition(lhs: &[Token], rhs_tokens: Vec<Token>, names: &dyn KnownNames) -> AstNode {
    let fn_name = lhs[0].lexeme.clone();
    let mut params = Vec::new();
    let mut i = 2; // skip name, LParen
    while i < lhs.len() && lhs[i].kind != TokenType::RParen {
        if lhs[i].kind != TokenType::Identifier {
            return AstNode::ErrorNode {
                kind: "Syntax".to_string(),
                message: "invalid parameter name in function definition".to_string(),
            };
        }
        let pname = lhs[i].lexeme.clone();
        i += 1;
        let mut default = None;
        if i < lhs.len() && lhs[i].kind == TokenType::Equal {
            i += 1;
            let start = i;
            while i < lhs.len() && lhs[i].kind != TokenType::Comma && lhs[i].kind != TokenType::RParen {
                i += 1;
            }
            let mut def_tokens = to_owned_with_eof(&lhs[start..i]);
            if def_tokens.len() > 1 {
                match parse_expr_tokens(std::mem::take(&mut def_tokens), names) {
                    Ok(e) => default = Some(e),
                    Err(e) => {
                        return AstNode::ErrorNode {
                            kind: "Syntax".to_string(),
                            message: e.to_string(),
                        }
                    }
                }
            }
        }
        params.push(Param { name: pname, default });
        if i < lhs.len() && lhs[i].kind == TokenType::Comma {
            i += 1;
        }
    }
    match parse_expr_tokens(rhs_tokens, names) {
        Ok(expr) => AstNode::FunctionDefinition {
            name: fn_name,
            params,
            expr: Box::new(expr),
        },
        Err(e) => AstNode::ErrorNode {
            kind: "Syntax".to_string(),
            message: e.to_string(),
        },
    }
}

fn to_owned_with_eof(tokens: &[Token]) -> Vec<Token> {
    let mut v: Vec<Token> = tokens.to_vec();
    if v.last().map(|t| t.kind.clone()) != Some(TokenType::Eof) {
        let pos = v.last().map(|t| t.position + 1).unwrap_or(0);
        v.push(Token::eof(pos));
    }
    v
}

/// Best-effort reconstruction of the original substring spanning
/// `tokens[from..to]`, used only for display/raw-expression bookkeeping
/// (live re-rendering, spec.md 3.9) — not for re-lexing.
fn span_text(raw: &str, tokens: &[Token], from: usize, to: usize) -> String {
    if from >= to {
        return String::new();
    }
    let start = tokens.get(from).map(|t| t.position).unwrap_or(0);
    let end_tok = tokens.get(to.saturating_sub(1));
    let end = match end_tok {
        Some(t) if t.kind == TokenType::Eof => t.position,
        Some(t) => t.position + t.lexeme.chars().count().max(1),
        None => raw.chars().count(),
    };
    raw.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn parse_expr_tokens(tokens: Vec<Token>, names: &dyn KnownNames) -> Result<Expr> {
    let mut p = ExprParser { tokens, pos: 0, names };
    let expr = p.parse_top_level()?;
    p.expect_eof()?;
    Ok(expr)
}

struct ExprParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    names: &'a dyn KnownNames,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenType {
        self.peek().kind.clone()
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, kind: TokenType) -> Result<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(Error::Syntax(format!(
                "expected {kind:?}, found '{}'",
                self.peek().lexeme
            )))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.peek_kind() == TokenType::Eof {
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "unexpected trailing token '{}'",
                self.peek().lexeme
            )))
        }
    }

    fn parse_top_level(&mut self) -> Result<Expr> {
        let first = self.parse_where()?;
        if self.peek_kind() == TokenType::Comma {
            let mut items = vec![first];
            while self.peek_kind() == TokenType::Comma {
                self.advance();
                items.push(self.parse_where()?);
            }
            return Ok(Expr::List(items));
        }
        Ok(first)
    }

    fn parse_where(&mut self) -> Result<Expr> {
        let lhs = self.parse_range()?;
        if self.peek_kind() == TokenType::Where {
            self.advance();
            let cmp = self.parse_comparator()?;
            let value = self.parse_range()?;
            return Ok(Expr::Where {
                list: Box::new(lhs),
                cmp,
                value: Box::new(value),
            });
        }
        Ok(lhs)
    }

    fn parse_comparator(&mut self) -> Result<Comparator> {
        let t = self.expect(TokenType::CompareOp)?;
        match t.lexeme.as_str() {
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            ">=" => Ok(Comparator::Ge),
            "<=" => Ok(Comparator::Le),
            "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            other => Err(Error::Syntax(format!("unsupported where predicate '{other}'"))),
        }
    }

    fn parse_range(&mut self) -> Result<Expr> {
        let lhs = self.parse_convert()?;
        if self.peek_kind() == TokenType::DotDot {
            self.advance();
            let to = self.parse_convert()?;
            let mut step = None;
            if self.peek_kind() == TokenType::Step {
                self.advance();
                step = Some(Box::new(self.parse_convert()?));
            }
            return Ok(Expr::Range {
                from: Box::new(lhs),
                to: Box::new(to),
                step,
            });
        }
        Ok(lhs)
    }

    fn parse_convert(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            match self.peek_kind() {
                TokenType::To | TokenType::In => {
                    self.advance();
                    let unit = self.parse_unit_expr()?;
                    lhs = Expr::ConvertTo {
                        expr: Box::new(lhs),
                        unit: Box::new(unit),
                    };
                }
                TokenType::As => {
                    self.advance();
                    self.expect(TokenType::Percent)?;
                    lhs = Expr::AsPercent { expr: Box::new(lhs) };
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    /// A unit target expression: identifiers combined with `*`, `/`, `per`,
    /// and `^ <integer>` — a restricted grammar, not full expression syntax.
    fn parse_unit_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unit_atom()?;
        loop {
            match self.peek_kind() {
                TokenType::Star => {
                    self.advance();
                    let rhs = self.parse_unit_atom()?;
                    lhs = Expr::Binary {
                        op: BinOp::Mul,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Slash | TokenType::Per => {
                    self.advance();
                    let rhs = self.parse_unit_atom()?;
                    lhs = Expr::Binary {
                        op: BinOp::Div,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Caret => {
                    self.advance();
                    let exp = self.expect(TokenType::Number)?;
                    let n: f64 = exp.lexeme.parse().unwrap_or(1.0);
                    lhs = Expr::Binary {
                        op: BinOp::Pow,
                        lhs: Box::new(lhs),
                        rhs: Box::new(Expr::Number(n)),
                    };
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unit_atom(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenType::Identifier => {
                let t = self.advance();
                Ok(Expr::Identifier(t.lexeme))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_unit_expr()?;
                self.expect(TokenType::RParen)?;
                Ok(inner)
            }
            _ => Err(Error::Syntax(format!(
                "expected a unit, found '{}'",
                self.peek().lexeme
            ))),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            match self.peek_kind() {
                TokenType::Plus => {
                    self.advance();
                    let rhs = self.parse_multiplicative()?;
                    lhs = Expr::Binary {
                        op: BinOp::Add,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Minus => {
                    self.advance();
                    let rhs = self.parse_multiplicative()?;
                    lhs = Expr::Binary {
                        op: BinOp::Sub,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenType::Number
                | TokenType::CurrencyLiteral
                | TokenType::UnitLiteral
                | TokenType::PercentageLiteral
                | TokenType::DateLiteral
                | TokenType::StringLiteral
                | TokenType::Identifier
                | TokenType::IdentifierReference
                | TokenType::LParen
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek_kind() {
                TokenType::Star => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary {
                        op: BinOp::Mul,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Slash => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary {
                        op: BinOp::Div,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Mod => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary {
                        op: BinOp::Mod,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                TokenType::Of => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::PercentBind {
                        op: PercentOp::Of,
                        percent: Box::new(lhs),
                        base: Box::new(rhs),
                    };
                }
                TokenType::On => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::PercentBind {
                        op: PercentOp::On,
                        percent: Box::new(lhs),
                        base: Box::new(rhs),
                    };
                }
                TokenType::Off => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::PercentBind {
                        op: PercentOp::Off,
                        percent: Box::new(lhs),
                        base: Box::new(rhs),
                    };
                }
                _ if self.starts_primary() => {
                    // Implicit multiplication (spec.md 4.1): juxtaposition
                    // of two quantities with no intervening operator.
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary {
                        op: BinOp::Mul,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenType::Minus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(expr),
                })
            }
            TokenType::Plus => {
                self.advance();
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Plus,
                    expr: Box::new(expr),
                })
            }
            _ => self.parse_pow(),
        }
    }

    fn parse_pow(&mut self) -> Result<Expr> {
        let lhs = self.parse_postfix()?;
        if self.peek_kind() == TokenType::Caret {
            self.advance();
            let rhs = self.parse_unary()?; // right-associative
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.peek_kind() == TokenType::LBracket {
                self.advance();
                let first = self.parse_where()?;
                if self.peek_kind() == TokenType::DotDot {
                    self.advance();
                    let to = self.parse_where()?;
                    self.expect(TokenType::RBracket)?;
                    expr = Expr::Slice {
                        expr: Box::new(expr),
                        from: Box::new(first),
                        to: Box::new(to),
                    };
                } else {
                    self.expect(TokenType::RBracket)?;
                    expr = Expr::Index {
                        expr: Box::new(expr),
                        index: Box::new(first),
                    };
                }
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenType::Number => {
                let t = self.advance();
                Ok(Expr::Number(parse_number(&t.lexeme)?))
            }
            TokenType::CurrencyLiteral => {
                let t = self.advance();
                Ok(Expr::Currency {
                    code: t.unit_suffix.unwrap_or_default(),
                    amount: parse_number(&t.lexeme)?,
                })
            }
            TokenType::UnitLiteral => {
                let t = self.advance();
                Ok(Expr::UnitLiteral {
                    amount: parse_number(&t.lexeme)?,
                    unit: t.unit_suffix.unwrap_or_default(),
                })
            }
            TokenType::PercentageLiteral => {
                let t = self.advance();
                Ok(Expr::Percentage(parse_number(&t.lexeme)?))
            }
            TokenType::DateLiteral => {
                let t = self.advance();
                Ok(Expr::DateLiteral(t.lexeme))
            }
            TokenType::StringLiteral => {
                let t = self.advance();
                Ok(Expr::StringLiteral(t.lexeme))
            }
            TokenType::IdentifierReference => {
                let t = self.advance();
                Ok(Expr::Reference(t.lexeme))
            }
            TokenType::Identifier => self.parse_identifier_or_call(),
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_top_level()?;
                self.expect(TokenType::RParen)?;
                Ok(inner)
            }
            TokenType::Solve => self.parse_solve(),
            _ => Err(Error::Syntax(format!(
                "unexpected token '{}'",
                self.peek().lexeme
            ))),
        }
    }

    fn parse_identifier_or_call(&mut self) -> Result<Expr> {
        let t = self.advance();
        let mut name = t.lexeme;

        if self.peek_kind() == TokenType::LParen {
            self.advance();
            let mut args = Vec::new();
            if self.peek_kind() != TokenType::RParen {
                loop {
                    let arg = self.parse_arg()?;
                    args.push(arg);
                    if self.peek_kind() == TokenType::Comma {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenType::RParen)?;
            return Ok(Expr::Call { name, args });
        }

        // Greedy phrase-identifier matching: extend with following
        // identifier tokens only while the growing phrase is a known name.
        while self.peek_kind() == TokenType::Identifier {
            let candidate = format!("{name} {}", self.peek().lexeme);
            if self.names.is_known_name(&candidate) {
                name = candidate;
                self.advance();
            } else {
                break;
            }
        }
        Ok(Expr::Identifier(name))
    }

    fn parse_arg(&mut self) -> Result<Arg> {
        // `sort(list, desc)` (spec.md 4.8): `desc` is a bare keyword, not an
        // expression, so it can't flow through `parse_where`/`parse_primary`
        // like an ordinary argument. Represent it as a string-literal flag
        // `aggregate_sort` recognizes by value.
        if self.peek_kind() == TokenType::Desc {
            self.advance();
            return Ok(Arg {
                name: None,
                value: Expr::StringLiteral("desc".to_string()),
            });
        }
        if self.peek_kind() == TokenType::Identifier {
            let save = self.pos;
            let ident = self.advance();
            if self.peek_kind() == TokenType::Colon {
                self.advance();
                let value = self.parse_where()?;
                return Ok(Arg {
                    name: Some(ident.lexeme),
                    value,
                });
            }
            self.pos = save;
        }
        Ok(Arg {
            name: None,
            value: self.parse_where()?,
        })
    }

    fn parse_solve(&mut self) -> Result<Expr> {
        self.expect(TokenType::Solve)?;
        let target_tok = self.expect(TokenType::Identifier)?;
        self.expect(TokenType::In)?;
        let equation = self.parse_additive()?;
        let mut assumptions = Vec::new();
        while self.peek_kind() == TokenType::Comma {
            self.advance();
            assumptions.push(self.parse_additive()?);
        }
        let mut predicate = None;
        if self.peek_kind() == TokenType::Where {
            self.advance();
            let lhs = self.parse_additive()?;
            let cmp = self.parse_comparator()?;
            let rhs = self.parse_additive()?;
            predicate = Some(Box::new(Expr::Where {
                list: Box::new(lhs),
                cmp,
                value: Box::new(rhs),
            }));
        }
        Ok(Expr::Solve {
            target: target_tok.lexeme,
            equation: Some(Box::new(equation)),
            assumptions,
            predicate,
        })
    }
}

fn parse_number(lexeme: &str) -> Result<f64> {
    lexeme
        .parse::<f64>()
        .map_err(|_| Error::Syntax(format!("invalid numeric literal '{lexeme}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::NoUnits;

    #[test]
    fn classifies_plain_assignment() {
        let node = parse_line("price = 3", &NoUnits, &NoKnownNames);
        match node {
            AstNode::VariableAssignment { name, .. } => assert_eq!(name, "price"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_live_expression() {
        let node = parse_line("100 + 1 =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::Expression { live, .. } => assert!(live),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_combined_assignment() {
        let node = parse_line("total = price * qty =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::CombinedAssignment { name, .. } => assert_eq!(name, "total"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn chained_fat_arrow_first_wins() {
        // `x = y => z =>` has expression `y`.
        let node = parse_line("x = y => z =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::CombinedAssignment { name, expr, .. } => {
                assert_eq!(name, "x");
                assert_eq!(*expr, Expr::Identifier("y".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn plain_text_without_markers() {
        let node = parse_line("just some notes here", &NoUnits, &NoKnownNames);
        assert!(matches!(node, AstNode::PlainText { .. }));
    }

    #[test]
    fn function_definition_parses_params_and_defaults() {
        let node = parse_line("tip(bill, rate = 20) = bill * rate / 100", &NoUnits, &NoKnownNames);
        match node {
            AstNode::FunctionDefinition { name, params, .. } => {
                assert_eq!(name, "tip");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "bill");
                assert!(params[0].default.is_none());
                assert_eq!(params[1].name, "rate");
                assert!(params[1].default.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn implicit_multiplication_between_number_and_paren() {
        let node = parse_line("2(3 + 4) =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::Expression { expr, .. } => {
                assert!(matches!(*expr, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn percent_of_binds_correctly() {
        let node = parse_line("15% of 200 =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::Expression { expr, .. } => {
                assert!(matches!(*expr, Expr::PercentBind { op: PercentOp::Of, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn range_with_step_parses() {
        let node = parse_line("1..10 step 2 =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::Expression { expr, .. } => {
                assert!(matches!(*expr, Expr::Range { step: Some(_), .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sort_desc_keyword_argument_parses() {
        let node = parse_line("sort(costs, desc) =>", &NoUnits, &NoKnownNames);
        match node {
            AstNode::Expression { expr, .. } => match *expr {
                Expr::Call { name, args } => {
                    assert_eq!(name, "sort");
                    assert_eq!(args.len(), 2);
                    assert!(matches!(args[1].value, Expr::StringLiteral(ref s) if s == "desc"));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
