//! Built-in scalar and aggregate function surface (spec.md 4.12 item 10,
//! SPEC_FULL.md 4.14/4.15).
//!
//! Grounded on `ferrum-fhirpath/src/vm/functions/math.rs`'s small
//! `name -> implementation` dispatch (`abs`, `ceiling`, `floor`, `round`,
//! `sqrt`, `power`, `ln`, `log`, `exp`, `truncate`), generalized here to
//! also cover the aggregate surface spec.md names directly (`sum`, `total`,
//! `count`, `min`, `max`, `mean`, `median`, `stddev`, `range`, `sort`).

use super::EvalCtx;
use crate::error::{Error, Result};
use crate::value::Value;
use notecalc_units::Quantity;

/// Every name [`call`] dispatches on, consulted by `parser::KnownNames` so a
/// bare `sum`/`total`/... isn't mistaken for a multi-word identifier phrase.
pub static NAMES: phf::Set<&'static str> = phf::phf_set! {
    "abs", "floor", "ceiling", "ceil", "truncate", "round", "sqrt", "pow",
    "power", "ln", "log10", "log", "exp", "sum", "total", "count", "min",
    "max", "mean", "avg", "median", "stddev", "range", "sort",
};

pub fn is_known(name: &str) -> bool {
    NAMES.contains(name)
}

pub fn call(name: &str, args: &[Value], ctx: &EvalCtx) -> Result<Value> {
    match name {
        "abs" => unary(single(args, name)?, f64::abs),
        "floor" => unary(single(args, name)?, f64::floor),
        "ceiling" | "ceil" => unary(single(args, name)?, f64::ceil),
        "truncate" => unary(single(args, name)?, f64::trunc),
        "round" => round_fn(args),
        "sqrt" => sqrt_fn(single(args, name)?),
        "pow" | "power" => pow_fn(args, ctx),
        "ln" => unary(single(args, name)?, f64::ln),
        "log10" => unary(single(args, name)?, f64::log10),
        "log" => log_fn(args),
        "exp" => unary(single(args, name)?, f64::exp),
        "sum" => aggregate_sum(args, ctx),
        "total" => total_fn(args, ctx),
        "count" => Ok(Value::Number(as_list(args).len() as f64)),
        "min" => aggregate_minmax(args, true),
        "max" => aggregate_minmax(args, false),
        "mean" | "avg" => aggregate_mean(args, ctx),
        "median" => aggregate_median(args),
        "stddev" => aggregate_stddev(args),
        "range" => aggregate_range(args),
        "sort" => aggregate_sort(args),
        other => Err(Error::UnknownFunction(other.to_string())),
    }
}

fn single<'a>(args: &'a [Value], fn_name: &str) -> Result<&'a Value> {
    args.first()
        .ok_or_else(|| Error::MissingArgument(format!("{fn_name}'s first argument")))
}

/// Applies `f` to a `Number`/`Unit`/`Currency`/`Duration`'s magnitude,
/// preserving the variant (spec.md 4.14: "`abs` on a `Unit` preserves the
/// unit").
fn unary(value: &Value, f: impl Fn(f64) -> f64) -> Result<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(f(*n))),
        Value::Unit(q) => Ok(Value::Unit(Quantity::new(f(q.value), q.unit.clone()))),
        Value::Currency { code, amount } => Ok(Value::Currency {
            code: code.clone(),
            amount: f(*amount),
        }),
        Value::Duration(s) => Ok(Value::Duration(f(*s))),
        Value::Error(e) => Ok(Value::Error(e.clone())),
        other => Err(Error::Syntax(format!(
            "function not defined for {}",
            other.variant_name()
        ))),
    }
}

fn round_fn(args: &[Value]) -> Result<Value> {
    let value = single(args, "round")?;
    let places = args
        .get(1)
        .and_then(|v| v.numeric_magnitude())
        .unwrap_or(0.0) as i32;
    let factor = 10f64.powi(places);
    unary(value, |n| (n * factor).round() / factor)
}

fn sqrt_fn(value: &Value) -> Result<Value> {
    match value {
        Value::Number(n) if *n < 0.0 => Err(Error::Syntax(
            "sqrt of a negative number is undefined outside the solver's quadratic path".to_string(),
        )),
        Value::Number(n) => Ok(Value::Number(n.sqrt())),
        Value::Unit(q) => Ok(Value::Unit(q.pow_rational(1, 2)?)),
        other => Err(Error::Syntax(format!(
            "sqrt is not defined for {}",
            other.variant_name()
        ))),
    }
}

fn pow_fn(args: &[Value], _ctx: &EvalCtx) -> Result<Value> {
    let base = single(args, "pow")?;
    let exponent = args
        .get(1)
        .ok_or_else(|| Error::MissingArgument("pow's exponent".to_string()))?;
    base.pow(exponent)
}

fn log_fn(args: &[Value]) -> Result<Value> {
    let base = single(args, "log")?
        .numeric_magnitude()
        .ok_or_else(|| Error::Syntax("log's base must be numeric".to_string()))?;
    let x = args
        .get(1)
        .and_then(|v| v.numeric_magnitude())
        .ok_or_else(|| Error::MissingArgument("log's value".to_string()))?;
    Ok(Value::Number(x.log(base)))
}

/// Flattens call arguments into one list: a single list argument is
/// unwrapped, otherwise every argument is treated as one element (spec.md
/// 4.8: aggregates accept either shape).
fn as_list(args: &[Value]) -> Vec<Value> {
    if let [Value::List(items)] = args {
        items.clone()
    } else {
        args.to_vec()
    }
}

fn numeric_items(args: &[Value]) -> Result<Vec<f64>> {
    as_list(args)
        .iter()
        .map(|v| {
            v.numeric_magnitude()
                .ok_or_else(|| Error::Syntax("aggregate functions require numeric list items".to_string()))
        })
        .collect()
}

fn aggregate_sum(args: &[Value], ctx: &EvalCtx) -> Result<Value> {
    let items = as_list(args);
    let resolver = ctx.resolver();
    let mut acc = items
        .first()
        .cloned()
        .ok_or_else(|| Error::Syntax("sum requires at least one value".to_string()))?;
    for item in &items[1..] {
        acc = acc.add(item, &resolver)?;
    }
    Ok(acc)
}

/// `total(...)` (SPEC_FULL.md 4.15): identical to `sum`, except a bare
/// string literal argument is rejected rather than silently ignored.
fn total_fn(args: &[Value], ctx: &EvalCtx) -> Result<Value> {
    for item in as_list(args) {
        if matches!(item, Value::Symbolic { .. }) {
            return Err(Error::Syntax(
                "total(...) does not accept non-numeric text arguments".to_string(),
            ));
        }
    }
    aggregate_sum(args, ctx)
}

fn aggregate_minmax(args: &[Value], want_min: bool) -> Result<Value> {
    let nums = numeric_items(args)?;
    let items = as_list(args);
    let mut best_idx = 0usize;
    for (i, n) in nums.iter().enumerate() {
        let better = if want_min { *n < nums[best_idx] } else { *n > nums[best_idx] };
        if better {
            best_idx = i;
        }
    }
    items
        .get(best_idx)
        .cloned()
        .ok_or_else(|| Error::Syntax("min/max requires at least one value".to_string()))
}

/// `mean`/`avg` expects a single list argument (spec.md 4.8): `avg(5)`
/// errors rather than treating the scalar as a one-element list, but
/// `avg([])` returns `0` rather than erroring.
fn aggregate_mean(args: &[Value], ctx: &EvalCtx) -> Result<Value> {
    let [Value::List(items)] = args else {
        return Err(Error::Syntax("mean/avg expects a list argument, not a scalar".to_string()));
    };
    if items.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let resolver = ctx.resolver();
    let mut acc = items[0].clone();
    for item in &items[1..] {
        acc = acc.add(item, &resolver)?;
    }
    acc.div(&Value::Number(items.len() as f64), &resolver)
}

fn aggregate_median(args: &[Value]) -> Result<Value> {
    let mut nums = numeric_items(args)?;
    if nums.is_empty() {
        return Err(Error::Syntax("median requires at least one value".to_string()));
    }
    nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = nums.len() / 2;
    let value = if nums.len() % 2 == 0 {
        (nums[mid - 1] + nums[mid]) / 2.0
    } else {
        nums[mid]
    };
    Ok(Value::Number(value))
}

fn aggregate_stddev(args: &[Value]) -> Result<Value> {
    let nums = numeric_items(args)?;
    if nums.len() < 2 {
        return Err(Error::Syntax("stddev requires at least two values".to_string()));
    }
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    let variance = nums.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (nums.len() - 1) as f64;
    Ok(Value::Number(variance.sqrt()))
}

fn aggregate_range(args: &[Value]) -> Result<Value> {
    let nums = numeric_items(args)?;
    let min = nums.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::Syntax("range requires at least one value".to_string()));
    }
    Ok(Value::Number(max - min))
}

/// `desc` flag recognized by [`aggregate_sort`] (spec.md 4.8), parsed as a
/// bare keyword argument into this sentinel string literal.
fn is_desc_flag(v: &Value) -> bool {
    matches!(v, Value::Symbolic { expression, .. } if expression == "desc")
}

fn aggregate_sort(args: &[Value]) -> Result<Value> {
    let descending = args.last().is_some_and(is_desc_flag);
    let list_args = if descending { &args[..args.len() - 1] } else { args };
    let mut items = as_list(list_args);
    items.sort_by(|a, b| {
        let an = a.numeric_magnitude().unwrap_or(f64::NAN);
        let bn = b.numeric_magnitude().unwrap_or(f64::NAN);
        an.partial_cmp(&bn).unwrap_or(std::cmp::Ordering::Equal)
    });
    if descending {
        items.reverse();
    }
    Ok(Value::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EquationStore;
    use crate::functions::FunctionStore;
    use crate::store::VariableStore;
    use notecalc_units::AliasTable;
    use crate::context::EngineOptions;

    fn with_ctx(f: impl FnOnce(&EvalCtx)) {
        let variables = VariableStore::new();
        let functions = FunctionStore::new();
        let equations = EquationStore::new();
        let aliases = AliasTable::new();
        let options = EngineOptions::default();
        let ctx = EvalCtx {
            variables: &variables,
            functions: &functions,
            equations: &equations,
            aliases: &aliases,
            options: &options,
            current_line: 0,
            call_depth: 0,
        };
        f(&ctx);
    }

    #[test]
    fn abs_preserves_unit() {
        let q = Value::Unit(Quantity::new(-5.0, notecalc_units::CompositeUnit::single("m")));
        let result = call("abs", &[q], &dummy_ctx());
        match result.unwrap() {
            Value::Unit(q) => assert_eq!(q.value, 5.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn median_of_even_count_averages_middle_two() {
        let values = vec![Value::List(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
            Value::Number(4.0),
        ])];
        let result = aggregate_median(&values).unwrap();
        assert!(matches!(result, Value::Number(n) if (n - 2.5).abs() < 1e-9));
    }

    #[test]
    fn sum_over_explicit_args() {
        with_ctx(|ctx| {
            let args = vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];
            let result = aggregate_sum(&args, ctx).unwrap();
            assert!(matches!(result, Value::Number(n) if (n - 6.0).abs() < 1e-9));
        });
    }

    #[test]
    fn total_rejects_string_argument() {
        with_ctx(|ctx| {
            let args = vec![Value::Symbolic {
                expression: "not a number".to_string(),
                free_variables: vec![],
            }];
            assert!(total_fn(&args, ctx).is_err());
        });
    }

    #[test]
    fn avg_on_scalar_errors_instead_of_treating_it_as_a_one_item_list() {
        with_ctx(|ctx| {
            assert!(aggregate_mean(&[Value::Number(5.0)], ctx).is_err());
        });
    }

    #[test]
    fn avg_on_empty_list_returns_zero() {
        with_ctx(|ctx| {
            let result = aggregate_mean(&[Value::List(vec![])], ctx).unwrap();
            assert!(matches!(result, Value::Number(n) if n == 0.0));
        });
    }

    #[test]
    fn sort_desc_reverses_ascending_order() {
        let list = Value::List(vec![Value::Number(3.0), Value::Number(1.0), Value::Number(2.0)]);
        let desc_flag = Value::Symbolic { expression: "desc".to_string(), free_variables: vec![] };
        let result = aggregate_sort(&[list, desc_flag]).unwrap();
        let Value::List(items) = result else { panic!("expected a list") };
        let nums: Vec<f64> = items.iter().map(|v| v.numeric_magnitude().unwrap()).collect();
        assert_eq!(nums, vec![3.0, 2.0, 1.0]);
    }

    fn dummy_ctx() -> EvalCtx<'static> {
        // A single 'static-lifetime context for tests that only exercise
        // unary scalar functions (no variable/equation lookups).
        static VARIABLES: std::sync::OnceLock<VariableStore> = std::sync::OnceLock::new();
        static FUNCTIONS: std::sync::OnceLock<FunctionStore> = std::sync::OnceLock::new();
        static EQUATIONS: std::sync::OnceLock<EquationStore> = std::sync::OnceLock::new();
        static ALIASES: std::sync::OnceLock<AliasTable> = std::sync::OnceLock::new();
        static OPTIONS: std::sync::OnceLock<EngineOptions> = std::sync::OnceLock::new();
        EvalCtx {
            variables: VARIABLES.get_or_init(VariableStore::new),
            functions: FUNCTIONS.get_or_init(FunctionStore::new),
            equations: EQUATIONS.get_or_init(EquationStore::new),
            aliases: ALIASES.get_or_init(AliasTable::new),
            options: OPTIONS.get_or_init(EngineOptions::default),
            current_line: 0,
            call_depth: 0,
        }
    }
}
