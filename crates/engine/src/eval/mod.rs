//! Expression evaluator (spec.md 4.12) and the evaluator registry that
//! dispatches a parsed line to the right domain logic.
//!
//! `eval_expr` is the single recursive walker every domain evaluator below
//! shares — the same role `ferrum-fhirpath/src/vm/evaluator.rs`'s
//! `eval_node` plays for that engine's compiled path tree — while
//! [`registry`] realizes spec.md 4.12's ordered `canHandle`/`evaluate` list
//! at the coarser, per-line granularity.

pub mod builtins;
pub mod registry;

use crate::ast::{BinOp, Comparator, Expr, PercentOp, UnaryOp};
use crate::equations::{self, EquationRecord, EquationStore};
use crate::error::{Error, Result};
use crate::functions::{self, FunctionStore};
use crate::store::VariableStore;
use crate::value::Value;
use crate::context::EngineOptions;
use crate::currency;
use chrono::NaiveDate;
use notecalc_units::{AliasTable, CompositeUnit, Quantity, Resolver};
use smallvec::SmallVec;

/// Borrowed view over every piece of engine state an expression evaluation
/// might need to read. Cheap to copy (every field is a reference or a
/// `usize`), so nested evaluation (function calls, solve substitution) just
/// clones it with an adjusted `call_depth`/`current_line`.
#[derive(Clone, Copy)]
pub struct EvalCtx<'a> {
    pub variables: &'a VariableStore,
    pub functions: &'a FunctionStore,
    pub equations: &'a EquationStore,
    pub aliases: &'a AliasTable,
    pub options: &'a EngineOptions,
    pub current_line: usize,
    pub call_depth: usize,
}

impl<'a> EvalCtx<'a> {
    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.aliases)
    }

    fn deeper(&self) -> Result<EvalCtx<'a>> {
        if self.call_depth >= self.options.recursion_limit {
            return Err(Error::Syntax(
                "recursion limit exceeded while solving or calling a function".to_string(),
            ));
        }
        Ok(EvalCtx {
            call_depth: self.call_depth + 1,
            ..*self
        })
    }
}

pub fn eval_expr(expr: &Expr, ctx: &EvalCtx) -> Result<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Percentage(p) => Ok(Value::Percentage(*p)),
        Expr::Currency { code, amount } => Ok(Value::Currency {
            code: code.clone(),
            amount: *amount,
        }),
        Expr::UnitLiteral { amount, unit } => {
            Ok(Value::Unit(Quantity::new(*amount, CompositeUnit::single(unit.clone()))))
        }
        Expr::DateLiteral(lexeme) => parse_date_literal(lexeme),
        // No dedicated String variant in the value taxonomy (spec silence);
        // a quoted literal carries itself verbatim as free-standing text.
        Expr::StringLiteral(s) => Ok(Value::Symbolic {
            expression: s.clone(),
            free_variables: Vec::new(),
        }),
        Expr::Identifier(name) => resolve_identifier(name, ctx, &[]),
        Expr::Reference(name) => resolve_identifier(name, ctx, &[]),
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, ctx),
        Expr::Unary { op, expr } => {
            let v = eval_expr(expr, ctx)?;
            match op {
                UnaryOp::Neg => v.neg(),
                UnaryOp::Plus => Ok(v),
            }
        }
        Expr::Call { name, args } => eval_call(name, args, ctx),
        Expr::Index { expr, index } => eval_index(expr, index, ctx),
        Expr::Slice { expr, from, to } => eval_slice(expr, from, to, ctx),
        Expr::Range { from, to, step } => eval_range(from, to, step.as_deref(), ctx),
        Expr::List(items) => {
            if items.len() > ctx.options.list_max_length {
                return Err(Error::ListTooLong(ctx.options.list_max_length));
            }
            let values = items.iter().map(|e| eval_expr(e, ctx)).collect::<Result<_>>()?;
            Ok(Value::List(values))
        }
        Expr::ConvertTo { expr, unit } => {
            let value = eval_expr(expr, ctx)?;
            eval_convert(value, unit, ctx)
        }
        Expr::AsPercent { expr } => {
            let value = eval_expr(expr, ctx)?;
            let n = value
                .numeric_magnitude()
                .ok_or_else(|| Error::Syntax("'as %' requires a numeric value".to_string()))?;
            Ok(Value::Percentage(n * 100.0))
        }
        Expr::PercentBind { op, percent, base } => eval_percent_bind(*op, percent, base, ctx),
        Expr::Where { list, cmp, value } => eval_where(list, *cmp, value, ctx),
        Expr::Solve {
            target,
            equation,
            assumptions,
            predicate,
        } => eval_solve(target, equation.as_deref(), assumptions, predicate.as_deref(), ctx),
    }
}

fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, ctx: &EvalCtx) -> Result<Value> {
    let l = eval_expr(lhs, ctx)?;
    let r = eval_expr(rhs, ctx)?;
    let resolver = ctx.resolver();
    match op {
        BinOp::Add => l.add(&r, &resolver),
        BinOp::Sub => l.sub(&r, &resolver),
        BinOp::Mul => l.mul(&r, &resolver),
        BinOp::Div => l.div(&r, &resolver),
        BinOp::Mod => l.rem(&r),
        BinOp::Pow => l.pow(&r),
    }
}

fn eval_percent_bind(op: PercentOp, percent: &Expr, base: &Expr, ctx: &EvalCtx) -> Result<Value> {
    let p = eval_expr(percent, ctx)?;
    let b = eval_expr(base, ctx)?;
    let resolver = ctx.resolver();
    match op {
        PercentOp::Of => p.mul(&b, &resolver),
        PercentOp::On => p.add(&b, &resolver),
        PercentOp::Off => b.sub(&p, &resolver),
    }
}

/// Resolves an identifier against the variable store; a miss falls back to
/// an implicit solve against the nearest preceding equation that mentions
/// it (spec.md 4.11 scopes this to the bare `x =>` line, but the dependency
/// graph treats every reference the same way, so this generalizes cleanly
/// to any nested reference instead of special-casing the top-level case).
fn resolve_identifier(name: &str, ctx: &EvalCtx, extra: &[EquationRecord]) -> Result<Value> {
    if let Some(v) = ctx.variables.get(name) {
        return Ok(v.clone());
    }
    let deeper = ctx.deeper()?;
    let record = extra
        .iter()
        .find(|r| r.free_variables.iter().any(|v| v == name))
        .cloned()
        .map(Ok)
        .unwrap_or_else(|| {
            ctx.equations
                .nearest_containing(name, ctx.current_line)
                .map(|r| r.clone())
        })?;
    let resolver = ctx.resolver();
    let eval_fn = |e: &Expr| eval_with_fallback(e, &deeper, extra);
    equations::solve(&record, name, &eval_fn, &resolver)
}

fn eval_with_fallback(expr: &Expr, ctx: &EvalCtx, extra: &[EquationRecord]) -> Result<Value> {
    match expr {
        Expr::Identifier(name) | Expr::Reference(name) => resolve_identifier(name, ctx, extra),
        _ => eval_expr(expr, ctx),
    }
}

fn eval_solve(
    target: &str,
    equation: Option<&Expr>,
    assumptions: &[Expr],
    predicate: Option<&Expr>,
    ctx: &EvalCtx,
) -> Result<Value> {
    let assumption_records: Vec<EquationRecord> = assumptions
        .iter()
        .filter_map(|e| match e {
            Expr::Identifier(name) => ctx.equations.nearest_containing(name, usize::MAX).ok().cloned(),
            _ => None,
        })
        .collect();

    let record: EquationRecord = match equation {
        Some(Expr::Identifier(eq_name)) => ctx
            .equations
            .nearest_containing(eq_name, usize::MAX)
            .or_else(|_| ctx.equations.nearest_containing(target, ctx.current_line))?
            .clone(),
        Some(_) | None => ctx.equations.nearest_containing(target, ctx.current_line)?.clone(),
    };

    let deeper = ctx.deeper()?;
    let eval_fn = |e: &Expr| eval_with_fallback(e, &deeper, &assumption_records);
    let resolver = ctx.resolver();
    let candidate = equations::solve(&record, target, &eval_fn, &resolver)?;

    let Some(pred) = predicate else {
        return Ok(candidate);
    };
    if predicate_holds(pred, target, &candidate, ctx)? {
        return Ok(candidate);
    }
    let negated = candidate.neg()?;
    if predicate_holds(pred, target, &negated, ctx)? {
        return Ok(negated);
    }
    Ok(candidate)
}

/// `predicate` is parsed as an `Expr::Where{list, cmp, value}` node even
/// though it's testing a scalar rather than filtering a list (spec.md 4.11
/// reuses the same `where <cmp> <value>` shape for a solve's domain guard).
fn predicate_holds(predicate: &Expr, target: &str, candidate: &Value, ctx: &EvalCtx) -> Result<bool> {
    let Expr::Where { list, cmp, value } = predicate else {
        return Err(Error::Syntax("malformed solve predicate".to_string()));
    };
    let lhs = eval_with_target(list, target, candidate, ctx)?;
    let rhs = eval_with_target(value, target, candidate, ctx)?;
    compare(&lhs, *cmp, &rhs)
}

fn eval_with_target(expr: &Expr, target: &str, candidate: &Value, ctx: &EvalCtx) -> Result<Value> {
    match expr {
        Expr::Identifier(name) if name == target => Ok(candidate.clone()),
        Expr::Identifier(name) => resolve_identifier(name, ctx, &[]),
        Expr::Number(n) => Ok(Value::Number(*n)),
        _ => eval_expr(expr, ctx),
    }
}

fn compare(lhs: &Value, cmp: Comparator, rhs: &Value) -> Result<bool> {
    if let (Value::Date { date: a, time: at, .. }, Value::Date { date: b, time: bt, .. }) = (lhs, rhs) {
        let key_a = (*a, at.unwrap_or_default());
        let key_b = (*b, bt.unwrap_or_default());
        return Ok(match cmp {
            Comparator::Lt => key_a < key_b,
            Comparator::Le => key_a <= key_b,
            Comparator::Gt => key_a > key_b,
            Comparator::Ge => key_a >= key_b,
            Comparator::Eq => key_a == key_b,
            Comparator::Ne => key_a != key_b,
        });
    }
    let a = lhs
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("'where' comparison requires numeric operands".to_string()))?;
    let b = rhs
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("'where' comparison requires numeric operands".to_string()))?;
    Ok(match cmp {
        Comparator::Lt => a < b,
        Comparator::Le => a <= b,
        Comparator::Gt => a > b,
        Comparator::Ge => a >= b,
        Comparator::Eq => lhs.approx_eq(rhs),
        Comparator::Ne => !lhs.approx_eq(rhs),
    })
}

fn eval_where(list: &Expr, cmp: Comparator, value: &Expr, ctx: &EvalCtx) -> Result<Value> {
    let list_val = eval_expr(list, ctx)?;
    let bound = eval_expr(value, ctx)?;
    let Value::List(items) = list_val else {
        return Err(Error::Syntax("'where' expects a list on its left side".to_string()));
    };
    let filtered: Vec<Value> = items
        .into_iter()
        .map(|item| compare(&item, cmp, &bound).map(|keep| (keep, item)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter_map(|(keep, item)| keep.then_some(item))
        .collect();
    Ok(Value::List(filtered))
}

fn eval_index(expr: &Expr, index: &Expr, ctx: &EvalCtx) -> Result<Value> {
    let base = eval_expr(expr, ctx)?;
    let idx_val = eval_expr(index, ctx)?;
    let Value::List(items) = base else {
        return Err(Error::Syntax("indexing requires a list".to_string()));
    };
    let idx = idx_val
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("list index must be numeric".to_string()))?;
    let n = idx.round() as i64;
    if n == 0 {
        return Err(Error::Syntax("index 0 is out of range (indexing is 1-based)".to_string()));
    }
    // 1-based indexing (spec.md 4.1); negative indexes count from the end
    // (spec.md 4.8: `-1` is the last item).
    let zero_based = if n > 0 { n - 1 } else { items.len() as i64 + n };
    if zero_based < 0 || zero_based as usize >= items.len() {
        return Err(Error::Syntax(format!("index {idx} is out of range")));
    }
    Ok(items[zero_based as usize].clone())
}

fn eval_slice(expr: &Expr, from: &Expr, to: &Expr, ctx: &EvalCtx) -> Result<Value> {
    let base = eval_expr(expr, ctx)?;
    let Value::List(items) = base else {
        return Err(Error::Syntax("slicing requires a list".to_string()));
    };
    let from_val = eval_expr(from, ctx)?
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("slice bounds must be numeric".to_string()))?;
    let to_val = eval_expr(to, ctx)?
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("slice bounds must be numeric".to_string()))?;
    if to_val < from_val {
        return Err(Error::NonMonotonicSlice);
    }
    let start = (from_val.round() as i64 - 1).max(0) as usize;
    let end = (to_val.round() as i64).max(0) as usize;
    let end = end.min(items.len());
    if start >= items.len() {
        return Ok(Value::List(Vec::new()));
    }
    Ok(Value::List(items[start..end].to_vec()))
}

fn eval_range(from: &Expr, to: &Expr, step: Option<&Expr>, ctx: &EvalCtx) -> Result<Value> {
    let from_val = eval_expr(from, ctx)?
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("range bounds must be numeric".to_string()))?;
    let to_val = eval_expr(to, ctx)?
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("range bounds must be numeric".to_string()))?;
    if from_val.fract() != 0.0 || to_val.fract() != 0.0 {
        return Err(Error::Syntax("range endpoints must be integers".to_string()));
    }
    let step_val = match step {
        Some(s) => eval_expr(s, ctx)?
            .numeric_magnitude()
            .ok_or(Error::InvalidDurationStep)?,
        None => 1.0,
    };
    if step_val == 0.0 {
        return Err(Error::InvalidDurationStep);
    }
    if (to_val >= from_val && step_val < 0.0) || (to_val < from_val && step_val > 0.0) {
        return Err(Error::NegativeRangeStep);
    }
    let mut values = Vec::new();
    let mut current = from_val;
    loop {
        if (step_val > 0.0 && current > to_val) || (step_val < 0.0 && current < to_val) {
            break;
        }
        values.push(Value::Number(current));
        if values.len() > ctx.options.range_max_length {
            return Err(Error::ListTooLong(ctx.options.range_max_length));
        }
        current += step_val;
    }
    Ok(Value::List(values))
}

fn eval_convert(value: Value, unit_expr: &Expr, ctx: &EvalCtx) -> Result<Value> {
    if let Expr::Identifier(name) = unit_expr {
        let upper = name.to_uppercase();
        if currency::is_known_code(&upper) {
            return convert_currency(value, &upper, ctx);
        }
    }
    let target = unit_expr_to_composite(unit_expr)?;
    let resolver = ctx.resolver();
    match value {
        Value::Unit(q) => Ok(Value::Unit(q.convert_to(&target, &resolver)?)),
        Value::Number(n) => Ok(Value::Unit(
            Quantity::new(n, CompositeUnit::dimensionless()).convert_to(&target, &resolver)?,
        )),
        other => Err(Error::IncompatibleUnits(format!(
            "cannot convert {} to a unit",
            other.variant_name()
        ))),
    }
}

fn convert_currency(value: Value, to_code: &str, ctx: &EvalCtx) -> Result<Value> {
    match value {
        Value::Currency { code, amount } => {
            if code == to_code {
                return Ok(Value::Currency { code, amount });
            }
            let snapshot = ctx
                .options
                .fx_snapshot
                .as_ref()
                .ok_or_else(|| Error::RateUnavailable(to_code.to_string()))?;
            let converted = snapshot
                .convert(amount, &code, to_code)
                .ok_or_else(|| Error::RateUnavailable(format!("{code}->{to_code}")))?;
            Ok(Value::Currency {
                code: to_code.to_string(),
                amount: converted,
            })
        }
        Value::Number(n) => Ok(Value::Currency {
            code: to_code.to_string(),
            amount: n,
        }),
        other => Err(Error::IncompatibleCurrency {
            left: other.variant_name().to_string(),
            right: to_code.to_string(),
        }),
    }
}

fn unit_expr_to_composite(expr: &Expr) -> Result<CompositeUnit> {
    match expr {
        Expr::Identifier(token) => Ok(CompositeUnit::single(token.clone())),
        Expr::Binary { op: BinOp::Mul, lhs, rhs } => {
            Ok(unit_expr_to_composite(lhs)?.mul(&unit_expr_to_composite(rhs)?))
        }
        Expr::Binary { op: BinOp::Div, lhs, rhs } => {
            Ok(unit_expr_to_composite(lhs)?.div(&unit_expr_to_composite(rhs)?))
        }
        Expr::Binary { op: BinOp::Pow, lhs, rhs } => {
            let Expr::Number(n) = rhs.as_ref() else {
                return Err(Error::NonNumericExponent("unit exponent".to_string()));
            };
            Ok(unit_expr_to_composite(lhs)?.pow(*n as i32))
        }
        _ => Err(Error::Syntax("invalid unit expression".to_string())),
    }
}

fn eval_call(name: &str, args: &[crate::ast::Arg], ctx: &EvalCtx) -> Result<Value> {
    if let Some(def) = ctx.functions.get(name) {
        let deeper = ctx.deeper()?;
        let eval_fn = |e: &Expr| eval_expr(e, ctx);
        let bound = functions::bind_arguments(def, args, &eval_fn)?;
        let mut scope = ctx.variables.clone();
        for (pname, value) in bound {
            scope.write(&pname, value, String::new(), 0);
        }
        let call_ctx = EvalCtx {
            variables: &scope,
            ..deeper
        };
        return eval_expr(&def.body, &call_ctx);
    }
    // Most calls pass a handful of arguments (spec.md 4.9's examples never
    // go past three); a small inline buffer avoids a heap allocation for
    // the common case the way `ferrum-fhirpath/src/vm/evaluator.rs` uses
    // `SmallVec` for its own per-call argument buffers.
    let values: SmallVec<[Value; 4]> = args
        .iter()
        .map(|a| eval_expr(&a.value, ctx))
        .collect::<Result<_>>()?;
    builtins::call(name, &values, ctx)
}

fn parse_date_literal(lexeme: &str) -> Result<Value> {
    // `YYYY-MM-DD[THH:MM[:SS]][Z|+HH:MM]`.
    let (date_part, rest) = lexeme.split_once('T').map(|(d, r)| (d, Some(r))).unwrap_or((lexeme, None));
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDateLiteral(lexeme.to_string()))?;
    let (time, zone) = match rest {
        None => (None, None),
        Some(r) => {
            let (time_part, zone_part) = split_zone(r);
            let time = chrono::NaiveTime::parse_from_str(time_part, "%H:%M:%S")
                .or_else(|_| chrono::NaiveTime::parse_from_str(time_part, "%H:%M"))
                .map_err(|_| Error::InvalidDateLiteral(lexeme.to_string()))?;
            (Some(time), zone_part)
        }
    };
    Ok(Value::Date { date, time, zone })
}

fn split_zone(s: &str) -> (&str, Option<String>) {
    if let Some(stripped) = s.strip_suffix('Z') {
        return (stripped, Some("UTC".to_string()));
    }
    if let Some(idx) = s.rfind(['+', '-']) {
        if idx > 0 {
            return (&s[..idx], Some(s[idx..].to_string()));
        }
    }
    (s, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VariableStore;

    fn ctx<'a>(
        variables: &'a VariableStore,
        functions: &'a FunctionStore,
        equations: &'a EquationStore,
        aliases: &'a AliasTable,
        options: &'a EngineOptions,
    ) -> EvalCtx<'a> {
        EvalCtx {
            variables,
            functions,
            equations,
            aliases,
            options,
            current_line: 0,
            call_depth: 0,
        }
    }

    #[test]
    fn evaluates_simple_arithmetic() {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = ctx(&variables, &functions, &equations, &aliases, &options);
        let expr = Expr::Binary {
            op: BinOp::Add,
            lhs: Box::new(Expr::Number(2.0)),
            rhs: Box::new(Expr::Number(3.0)),
        };
        let v = eval_expr(&expr, &c).unwrap();
        assert!(matches!(v, Value::Number(n) if (n - 5.0).abs() < 1e-9));
    }

    #[test]
    fn implicit_solve_resolves_from_stored_equation() {
        let mut variables = VariableStore::new();
        variables.write("distance", Value::Number(100.0), "100".to_string(), 0);
        variables.write("rate", Value::Number(20.0), "20".to_string(), 0);
        let functions = FunctionStore::new();
        let mut equations = EquationStore::new();
        equations.insert(
            1,
            Expr::Identifier("distance".to_string()),
            Expr::Binary {
                op: BinOp::Mul,
                lhs: Box::new(Expr::Identifier("rate".to_string())),
                rhs: Box::new(Expr::Identifier("time".to_string())),
            },
        );
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = EvalCtx {
            variables: &variables,
            functions: &functions,
            equations: &equations,
            aliases: &aliases,
            options: &options,
            current_line: 5,
            call_depth: 0,
        };
        let v = eval_expr(&Expr::Identifier("time".to_string()), &c).unwrap();
        assert!(matches!(v, Value::Number(n) if (n - 5.0).abs() < 1e-9));
    }

    #[test]
    fn one_based_indexing() {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = ctx(&variables, &functions, &equations, &aliases, &options);
        let list = Expr::List(vec![Expr::Number(10.0), Expr::Number(20.0), Expr::Number(30.0)]);
        let idx = Expr::Index {
            expr: Box::new(list),
            index: Box::new(Expr::Number(2.0)),
        };
        let v = eval_expr(&idx, &c).unwrap();
        assert!(matches!(v, Value::Number(n) if (n - 20.0).abs() < 1e-9));
    }

    #[test]
    fn negative_index_counts_from_the_end() {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = ctx(&variables, &functions, &equations, &aliases, &options);
        let list = Expr::List(vec![Expr::Number(10.0), Expr::Number(20.0), Expr::Number(30.0)]);
        let idx = Expr::Index {
            expr: Box::new(list),
            index: Box::new(Expr::Number(-1.0)),
        };
        let v = eval_expr(&idx, &c).unwrap();
        assert!(matches!(v, Value::Number(n) if (n - 30.0).abs() < 1e-9));
    }

    #[test]
    fn zero_index_and_out_of_range_index_have_distinct_messages() {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = ctx(&variables, &functions, &equations, &aliases, &options);
        let list = || Expr::List(vec![Expr::Number(10.0), Expr::Number(20.0)]);
        let zero_err = eval_expr(
            &Expr::Index { expr: Box::new(list()), index: Box::new(Expr::Number(0.0)) },
            &c,
        )
        .unwrap_err();
        let oob_err = eval_expr(
            &Expr::Index { expr: Box::new(list()), index: Box::new(Expr::Number(5.0)) },
            &c,
        )
        .unwrap_err();
        assert_ne!(zero_err.to_string(), oob_err.to_string());
    }

    #[test]
    fn range_rejects_non_integer_endpoints() {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let c = ctx(&variables, &functions, &equations, &aliases, &options);
        let range = Expr::Range {
            from: Box::new(Expr::Number(1.5)),
            to: Box::new(Expr::Number(5.0)),
            step: None,
        };
        assert!(eval_expr(&range, &c).is_err());
    }
}
