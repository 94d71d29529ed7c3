//! Expression and line-level AST.
//!
//! Two layers, mirroring `ferrum-fhirpath`'s `ast.rs`/`hir.rs` split: `Expr`
//! is the recursive-descent parse tree for a single expression (spec.md
//! 4.3), and `AstNode` is the per-line classification spec.md 3.9 and 4.2
//! describe (`PlainText`, `VariableAssignment`, `Expression`,
//! `CombinedAssignment`, `FunctionDefinition`, `ErrorNode`).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentOp {
    /// `p% of y`
    Of,
    /// `p% on y`
    On,
    /// `p% off y`
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// A named or positional call argument (spec.md 4.9: `tip(rate: 20%, bill: 50)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Raw percent value, e.g. `15` for `15%`.
    Percentage(f64),
    /// `code` is a lexical currency tag (`"USD"`, `"$"`-mapped to ISO, etc).
    Currency { code: String, amount: f64 },
    /// A number fused with a unit/alias token at lex time, e.g. `100 ft`.
    UnitLiteral { amount: f64, unit: String },
    /// Raw lexeme, parsed into a calendar date/time by the date evaluator.
    DateLiteral(String),
    StringLiteral(String),
    Identifier(String),
    /// `__sp_ref_[a-z0-9]+__` — an opaque reference placeholder (spec.md 6.3).
    Reference(String),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// `name(args...)`, covering both built-in aggregate/scalar functions
    /// and user-defined functions (spec.md 4.9).
    Call {
        name: String,
        args: Vec<Arg>,
    },
    /// 1-based indexing, `list[i]`.
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    /// Inclusive slicing, `list[a..b]`.
    Slice {
        expr: Box<Expr>,
        from: Box<Expr>,
        to: Box<Expr>,
    },
    /// Numeric range, `a..b [step s]`.
    Range {
        from: Box<Expr>,
        to: Box<Expr>,
        step: Option<Box<Expr>>,
    },
    /// Comma-separated top-level list.
    List(Vec<Expr>),
    /// `expr to/in unit-expr` or `expr as %`.
    ConvertTo {
        expr: Box<Expr>,
        unit: Box<Expr>,
    },
    AsPercent {
        expr: Box<Expr>,
    },
    /// `p% of/on/off y`.
    PercentBind {
        op: PercentOp,
        percent: Box<Expr>,
        base: Box<Expr>,
    },
    /// `list where <cmp> <value>`.
    Where {
        list: Box<Expr>,
        cmp: Comparator,
        value: Box<Expr>,
    },
    /// Bare `x =>` (implicit solve) or `solve x in eq[, assumptions][where pred] =>`.
    Solve {
        target: String,
        equation: Option<Box<Expr>>,
        assumptions: Vec<Expr>,
        predicate: Option<Box<Expr>>,
    },
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "mod",
            BinOp::Pow => "^",
        };
        write!(f, "{s}")
    }
}

/// A parsed source line, per spec.md 3.9 / 4.2.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    PlainText {
        content: String,
    },
    VariableAssignment {
        name: String,
        raw_value: String,
        parsed_value: Box<Expr>,
    },
    Expression {
        raw_expression: String,
        expr: Box<Expr>,
        /// `true` when the line ended in `=>` (live-result rendering).
        live: bool,
    },
    CombinedAssignment {
        name: String,
        raw_expression: String,
        expr: Box<Expr>,
    },
    FunctionDefinition {
        name: String,
        params: Vec<Param>,
        expr: Box<Expr>,
    },
    ErrorNode {
        kind: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// Collect every free identifier referenced by an expression, used by the
/// reactive store (spec.md 3.6) to build dependency edges and by the
/// solver (spec.md 3.7) to record an equation's free variables. Call names
/// are not collected; named-argument keys are not collected.
pub fn free_identifiers(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Identifier(name) | Expr::Reference(name) => {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        Expr::Number(_)
        | Expr::Percentage(_)
        | Expr::Currency { .. }
        | Expr::UnitLiteral { .. }
        | Expr::DateLiteral(_)
        | Expr::StringLiteral(_) => {}
        Expr::Binary { lhs, rhs, .. } => {
            free_identifiers(lhs, out);
            free_identifiers(rhs, out);
        }
        Expr::Unary { expr, .. } => free_identifiers(expr, out),
        Expr::Call { args, .. } => {
            for a in args {
                free_identifiers(&a.value, out);
            }
        }
        Expr::Index { expr, index } => {
            free_identifiers(expr, out);
            free_identifiers(index, out);
        }
        Expr::Slice { expr, from, to } => {
            free_identifiers(expr, out);
            free_identifiers(from, out);
            free_identifiers(to, out);
        }
        Expr::Range { from, to, step } => {
            free_identifiers(from, out);
            free_identifiers(to, out);
            if let Some(s) = step {
                free_identifiers(s, out);
            }
        }
        Expr::List(items) => {
            for i in items {
                free_identifiers(i, out);
            }
        }
        Expr::ConvertTo { expr, unit } => {
            free_identifiers(expr, out);
            free_identifiers(unit, out);
        }
        Expr::AsPercent { expr } => free_identifiers(expr, out),
        Expr::PercentBind { percent, base, .. } => {
            free_identifiers(percent, out);
            free_identifiers(base, out);
        }
        Expr::Where { list, value, .. } => {
            free_identifiers(list, out);
            free_identifiers(value, out);
        }
        Expr::Solve {
            equation,
            assumptions,
            predicate,
            ..
        } => {
            if let Some(e) = equation {
                free_identifiers(e, out);
            }
            for a in assumptions {
                free_identifiers(a, out);
            }
            if let Some(p) = predicate {
                free_identifiers(p, out);
            }
        }
    }
}
