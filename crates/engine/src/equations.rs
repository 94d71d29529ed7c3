//! Equation store and single-unknown symbolic solver (spec.md 3.7, 4.11).
//!
//! Grounded on the same "walk the tree, fold each step into an inverse
//! operation" shape `ferrum-fhirpath/src/vm/evaluator.rs` uses to unwind a
//! compiled path expression one node at a time, applied here to isolating a
//! variable instead of evaluating a path.

use crate::ast::{free_identifiers, BinOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::value::Value;
use notecalc_units::Resolver;

#[derive(Clone, Debug, PartialEq)]
pub struct EquationRecord {
    pub line_number: usize,
    pub lhs: Expr,
    pub rhs: Expr,
    pub free_variables: Vec<String>,
}

#[derive(Default)]
pub struct EquationStore {
    records: Vec<EquationRecord>,
}

impl EquationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, line_number: usize, lhs: Expr, rhs: Expr) {
        self.remove_line(line_number);
        let mut free_variables = Vec::new();
        free_identifiers(&lhs, &mut free_variables);
        free_identifiers(&rhs, &mut free_variables);
        self.records.push(EquationRecord {
            line_number,
            lhs,
            rhs,
            free_variables,
        });
        self.records.sort_by_key(|r| r.line_number);
    }

    pub fn remove_line(&mut self, line_number: usize) {
        self.records.retain(|r| r.line_number != line_number);
    }

    pub fn explicit(&self, lhs: Expr, rhs: Expr) -> EquationRecord {
        let mut free_variables = Vec::new();
        free_identifiers(&lhs, &mut free_variables);
        free_identifiers(&rhs, &mut free_variables);
        EquationRecord {
            line_number: usize::MAX,
            lhs,
            rhs,
            free_variables,
        }
    }

    /// Latest equation whose left side is exactly `Identifier(name)` — the
    /// form every assignment line inserts under — used to re-evaluate a
    /// reactive dependent from its own stored right-hand side rather than
    /// by searching for `name` among some other equation's free variables.
    /// `records` stays sorted by `line_number` after every [`Self::insert`],
    /// so the last match found scanning in reverse is the most recent one.
    pub fn latest_for_name(&self, name: &str) -> Option<&EquationRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| matches!(&r.lhs, Expr::Identifier(n) if n == name))
    }

    /// Nearest equation above `before_line` mentioning `target`, per
    /// spec.md 4.11's implicit-solve search order.
    pub fn nearest_containing(&self, target: &str, before_line: usize) -> Result<&EquationRecord> {
        let candidates: Vec<&EquationRecord> = self
            .records
            .iter()
            .filter(|r| r.line_number < before_line && r.free_variables.iter().any(|v| v == target))
            .collect();
        let nearest_line = candidates
            .iter()
            .map(|r| r.line_number)
            .max()
            .ok_or_else(|| Error::NoEquation(target.to_string()))?;
        let at_nearest: Vec<&EquationRecord> = candidates
            .into_iter()
            .filter(|r| r.line_number == nearest_line)
            .collect();
        if at_nearest.len() > 1 {
            return Err(Error::MultipleEquationsContainTarget(target.to_string()));
        }
        Ok(at_nearest[0])
    }
}

fn contains_identifier(expr: &Expr, name: &str) -> bool {
    let mut out = Vec::new();
    free_identifiers(expr, &mut out);
    out.iter().any(|n| n == name)
}

/// Solves `record` for `target`, evaluating every sub-expression that does
/// not itself contain `target` through `eval`.
pub fn solve<F>(record: &EquationRecord, target: &str, eval: &F, resolver: &Resolver) -> Result<Value>
where
    F: Fn(&Expr) -> Result<Value>,
{
    let lhs_has = contains_identifier(&record.lhs, target);
    let rhs_has = contains_identifier(&record.rhs, target);
    match (lhs_has, rhs_has) {
        (true, true) => Err(Error::VariableOnBothSides(target.to_string())),
        (false, false) => Err(Error::NoEquation(target.to_string())),
        (true, false) => {
            let known = eval(&record.rhs)?;
            isolate(&record.lhs, target, known, eval, resolver)
        }
        (false, true) => {
            let known = eval(&record.lhs)?;
            isolate(&record.rhs, target, known, eval, resolver)
        }
    }
}

/// Peels one layer of `expr` at a time, folding its inverse into `rhs_value`,
/// until `target` stands alone (spec.md 4.11: linear terms, parens,
/// subtraction reordering, target-in-denominator, integer powers via
/// rational roots).
fn isolate<F>(expr: &Expr, target: &str, rhs_value: Value, eval: &F, resolver: &Resolver) -> Result<Value>
where
    F: Fn(&Expr) -> Result<Value>,
{
    match expr {
        Expr::Identifier(name) if name == target => Ok(rhs_value),
        Expr::Unary {
            op: UnaryOp::Neg,
            expr: inner,
        } => isolate(inner, target, rhs_value.neg()?, eval, resolver),
        Expr::Unary {
            op: UnaryOp::Plus,
            expr: inner,
        } => isolate(inner, target, rhs_value, eval, resolver),
        Expr::Binary { op, lhs, rhs } => {
            let lhs_has = contains_identifier(lhs, target);
            let rhs_has = contains_identifier(rhs, target);
            if lhs_has && rhs_has {
                return Err(Error::VariableOnBothSides(target.to_string()));
            }
            if !lhs_has && !rhs_has {
                return Err(Error::NoEquation(target.to_string()));
            }
            match op {
                BinOp::Add => {
                    if lhs_has {
                        let known = eval(rhs)?;
                        isolate(lhs, target, rhs_value.sub(&known, resolver)?, eval, resolver)
                    } else {
                        let known = eval(lhs)?;
                        isolate(rhs, target, rhs_value.sub(&known, resolver)?, eval, resolver)
                    }
                }
                BinOp::Sub => {
                    if lhs_has {
                        // lhs - rhs = rhs_value  =>  lhs = rhs_value + rhs
                        let known = eval(rhs)?;
                        isolate(lhs, target, rhs_value.add(&known, resolver)?, eval, resolver)
                    } else {
                        // lhs - rhs = rhs_value  =>  rhs = lhs - rhs_value
                        let known = eval(lhs)?;
                        isolate(rhs, target, known.sub(&rhs_value, resolver)?, eval, resolver)
                    }
                }
                BinOp::Mul => {
                    if lhs_has {
                        let known = eval(rhs)?;
                        isolate(lhs, target, rhs_value.div(&known, resolver)?, eval, resolver)
                    } else {
                        let known = eval(lhs)?;
                        isolate(rhs, target, rhs_value.div(&known, resolver)?, eval, resolver)
                    }
                }
                BinOp::Div => {
                    if lhs_has {
                        // lhs / rhs = rhs_value  =>  lhs = rhs_value * rhs
                        let known = eval(rhs)?;
                        isolate(lhs, target, rhs_value.mul(&known, resolver)?, eval, resolver)
                    } else {
                        // lhs / rhs = rhs_value (target in the denominator)
                        let known = eval(lhs)?;
                        isolate(rhs, target, known.div(&rhs_value, resolver)?, eval, resolver)
                    }
                }
                BinOp::Pow => {
                    if rhs_has {
                        return Err(Error::NonNumericExponent(target.to_string()));
                    }
                    let exponent = eval(rhs)?;
                    let n = exponent
                        .numeric_magnitude()
                        .ok_or_else(|| Error::NonNumericExponent(target.to_string()))?;
                    if n == 0.0 {
                        return Err(Error::NonNumericExponent(target.to_string()));
                    }
                    let root = rhs_value.pow(&Value::Number(1.0 / n))?;
                    isolate(lhs, target, root, eval, resolver)
                }
                BinOp::Mod => Err(Error::Syntax(format!(
                    "cannot solve for '{target}' across a mod expression"
                ))),
            }
        }
        other => {
            if contains_identifier(other, target) {
                Err(Error::Syntax(format!(
                    "cannot isolate '{target}' from this equation"
                )))
            } else {
                Err(Error::NoEquation(target.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use notecalc_units::AliasTable;

    fn ident(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    fn eval_number(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            _ => Err(Error::Syntax("unsupported in test eval".to_string())),
        }
    }

    #[test]
    fn solves_linear_equation_for_x() {
        // distance = rate * time  =>  solve time
        let mut store = EquationStore::new();
        store.insert(
            1,
            ident("distance"),
            Expr::Binary {
                op: BinOp::Mul,
                lhs: Box::new(ident("rate")),
                rhs: Box::new(ident("time")),
            },
        );
        let record = store.nearest_containing("time", 5).unwrap();
        let aliases = AliasTable::new();
        let resolver = Resolver::new(&aliases);
        let eval = |expr: &Expr| -> Result<Value> {
            match expr {
                Expr::Identifier(n) if n == "distance" => Ok(Value::Number(100.0)),
                Expr::Identifier(n) if n == "rate" => Ok(Value::Number(20.0)),
                other => eval_number(other),
            }
        };
        let result = solve(record, "time", &eval, &resolver).unwrap();
        assert!(matches!(result, Value::Number(n) if (n - 5.0).abs() < 1e-9));
    }

    #[test]
    fn both_sides_is_an_error() {
        let record = EquationRecord {
            line_number: 0,
            lhs: ident("x"),
            rhs: Expr::Binary {
                op: BinOp::Add,
                lhs: Box::new(ident("x")),
                rhs: Box::new(num(1.0)),
            },
            free_variables: vec!["x".to_string()],
        };
        let aliases = AliasTable::new();
        let resolver = Resolver::new(&aliases);
        let result = solve(&record, "x", &eval_number, &resolver);
        assert!(matches!(result, Err(Error::VariableOnBothSides(_))));
    }

    #[test]
    fn nearest_containing_picks_closest_preceding_line() {
        let mut store = EquationStore::new();
        store.insert(1, ident("a"), num(1.0));
        store.insert(3, ident("a"), num(2.0));
        let record = store.nearest_containing("a", 10).unwrap();
        assert_eq!(record.line_number, 3);
    }
}
