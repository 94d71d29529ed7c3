//! Ordered evaluator registry (spec.md 4.12): each parsed line goes to the
//! first evaluator in a fixed list whose `can_handle` claims it.
//!
//! `ferrum-fhirpath` never needed this layer — one compiled plan always has
//! exactly one shape. A notebook line doesn't: the same [`eval_expr`] walker
//! underlies a plain sum, a unit conversion, a date computation and an
//! implicit solve alike, so most of the ten kinds spec.md 4.12 names turn
//! out to be classification predicates over an already-parsed `Expr`
//! picking which evaluator *claims* a line, not ten independent evaluation
//! strategies. `UnitsEvaluator`, `PercentageEvaluator`, `DateEvaluator`,
//! `ListEvaluator`, `SolveEvaluator` and `UserFunctionCallEvaluator` all
//! bottom out in [`evaluate_live_expression`]; `ExpressionEvaluator` is the
//! same function reached when none of the more specific shapes match.
//! `FunctionDefinitionEvaluator`, `CombinedAssignmentEvaluator` and
//! `VariableAssignmentEvaluator` are the only three with distinct
//! `AstNode` variants to themselves and genuinely different behavior
//! (defining a function; writing a variable and fanning the change out to
//! its dependents).

use super::{builtins::is_known, eval_expr, EvalCtx};
use crate::ast::{free_identifiers, AstNode, Expr};
use crate::context::EngineOptions;
use crate::equations::EquationStore;
use crate::error::Error;
use crate::format::format_value;
use crate::functions::FunctionStore;
use crate::render::{error_display, RenderNode};
use crate::store::VariableStore;
use crate::value::Value;
use notecalc_units::AliasTable;

/// Every piece of mutable document state one line's evaluation can touch.
/// Built fresh by [`crate::Engine`] for each line it processes.
pub struct EngineState<'a> {
    pub variables: &'a mut VariableStore,
    pub functions: &'a mut FunctionStore,
    pub equations: &'a mut EquationStore,
    pub aliases: &'a mut AliasTable,
    pub options: &'a EngineOptions,
    pub line_number: usize,
    /// Unix seconds the host supplied for this evaluation pass; threaded
    /// through to [`VariableStore::write`]'s `created_at`/`updated_at`.
    pub now: i64,
}

impl<'a> EngineState<'a> {
    fn ctx(&self) -> EvalCtx<'_> {
        EvalCtx {
            variables: self.variables,
            functions: self.functions,
            equations: self.equations,
            aliases: self.aliases,
            options: self.options,
            current_line: self.line_number,
            call_depth: 0,
        }
    }
}

pub trait Evaluator {
    fn can_handle(&self, node: &AstNode, state: &EngineState) -> bool;
    fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode;
}

struct FunctionDefinitionEvaluator;
struct UnitsEvaluator;
struct PercentageEvaluator;
struct DateEvaluator;
struct ListEvaluator;
struct SolveEvaluator;
struct UserFunctionCallEvaluator;
struct CombinedAssignmentEvaluator;
struct VariableAssignmentEvaluator;
struct ExpressionEvaluator;

pub fn registry() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(FunctionDefinitionEvaluator),
        Box::new(UnitsEvaluator),
        Box::new(PercentageEvaluator),
        Box::new(DateEvaluator),
        Box::new(ListEvaluator),
        Box::new(SolveEvaluator),
        Box::new(UserFunctionCallEvaluator),
        Box::new(CombinedAssignmentEvaluator),
        Box::new(VariableAssignmentEvaluator),
        Box::new(ExpressionEvaluator),
    ]
}

/// Dispatches one parsed line to its evaluator and returns the render node
/// the host displays. `PlainText`/`ErrorNode` never reach the registry —
/// there's nothing to classify, they map onto their render node directly.
pub fn evaluate_node(node: &AstNode, state: &mut EngineState) -> RenderNode {
    match node {
        AstNode::PlainText { content } => {
            return RenderNode::PlainText { content: content.clone() }
        }
        AstNode::ErrorNode { kind, message } => {
            return RenderNode::Error {
                kind: kind.clone(),
                error: message.clone(),
                display_text: error_display(message),
            }
        }
        _ => {}
    }
    for evaluator in registry() {
        if evaluator.can_handle(node, state) {
            return evaluator.evaluate(node, state);
        }
    }
    // ExpressionEvaluator claims every remaining `Expression` node and the
    // three assignment evaluators claim their own variant outright, so this
    // is unreachable for any node `parser::parse_line` can produce.
    let message = "no evaluator matched this line".to_string();
    RenderNode::Error {
        kind: "Syntax".to_string(),
        display_text: error_display(&message),
        error: message,
    }
}

/// Walks `expr`'s subtree looking for a node matching `pred`, the same
/// shape as [`free_identifiers`] but testing a predicate instead of
/// collecting names.
fn any_subexpr(expr: &Expr, pred: &impl Fn(&Expr) -> bool) -> bool {
    if pred(expr) {
        return true;
    }
    match expr {
        Expr::Number(_)
        | Expr::Percentage(_)
        | Expr::Currency { .. }
        | Expr::UnitLiteral { .. }
        | Expr::DateLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::Identifier(_)
        | Expr::Reference(_) => false,
        Expr::Binary { lhs, rhs, .. } => any_subexpr(lhs, pred) || any_subexpr(rhs, pred),
        Expr::Unary { expr, .. } => any_subexpr(expr, pred),
        Expr::Call { args, .. } => args.iter().any(|a| any_subexpr(&a.value, pred)),
        Expr::Index { expr, index } => any_subexpr(expr, pred) || any_subexpr(index, pred),
        Expr::Slice { expr, from, to } => {
            any_subexpr(expr, pred) || any_subexpr(from, pred) || any_subexpr(to, pred)
        }
        Expr::Range { from, to, step } => {
            any_subexpr(from, pred)
                || any_subexpr(to, pred)
                || step.as_deref().map_or(false, |s| any_subexpr(s, pred))
        }
        Expr::List(items) => items.iter().any(|i| any_subexpr(i, pred)),
        Expr::ConvertTo { expr, unit } => any_subexpr(expr, pred) || any_subexpr(unit, pred),
        Expr::AsPercent { expr } => any_subexpr(expr, pred),
        Expr::PercentBind { percent, base, .. } => {
            any_subexpr(percent, pred) || any_subexpr(base, pred)
        }
        Expr::Where { list, value, .. } => any_subexpr(list, pred) || any_subexpr(value, pred),
        Expr::Solve { equation, assumptions, predicate, .. } => {
            equation.as_deref().map_or(false, |e| any_subexpr(e, pred))
                || assumptions.iter().any(|a| any_subexpr(a, pred))
                || predicate.as_deref().map_or(false, |p| any_subexpr(p, pred))
        }
    }
}

fn is_units_shaped(expr: &Expr) -> bool {
    matches!(expr, Expr::ConvertTo { .. })
        || any_subexpr(expr, &|e| matches!(e, Expr::UnitLiteral { .. }))
}

fn is_percentage_shaped(expr: &Expr) -> bool {
    any_subexpr(expr, &|e| {
        matches!(e, Expr::Percentage(_) | Expr::AsPercent { .. } | Expr::PercentBind { .. })
    })
}

fn is_date_shaped(expr: &Expr) -> bool {
    any_subexpr(expr, &|e| matches!(e, Expr::DateLiteral(_)))
}

fn is_list_shaped(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::List(_) | Expr::Index { .. } | Expr::Slice { .. } | Expr::Range { .. } | Expr::Where { .. }
    )
}

fn is_solve_shaped(expr: &Expr) -> bool {
    matches!(expr, Expr::Solve { .. } | Expr::Identifier(_))
}

fn is_user_function_call(expr: &Expr, state: &EngineState) -> bool {
    matches!(expr, Expr::Call { name, .. } if state.functions.contains(name) && !is_known(name))
}

impl Evaluator for FunctionDefinitionEvaluator {
    fn can_handle(&self, node: &AstNode, _state: &EngineState) -> bool {
        matches!(node, AstNode::FunctionDefinition { .. })
    }

    fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode {
        let AstNode::FunctionDefinition { name, params, expr } = node else {
            unreachable!("can_handle guarantees this variant")
        };
        state.functions.define(name, params.clone(), (**expr).clone(), state.line_number);
        RenderNode::PlainText { content: format!("{name} defined") }
    }
}

macro_rules! expr_classified_evaluator {
    ($ty:ident, $pred:expr) => {
        impl Evaluator for $ty {
            fn can_handle(&self, node: &AstNode, state: &EngineState) -> bool {
                match node {
                    AstNode::Expression { expr, .. } => ($pred)(expr, state),
                    _ => false,
                }
            }

            fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode {
                let AstNode::Expression { raw_expression, expr, .. } = node else {
                    unreachable!("can_handle guarantees this variant")
                };
                evaluate_live_expression(raw_expression, expr, state)
            }
        }
    };
}

expr_classified_evaluator!(UnitsEvaluator, |e: &Expr, _s: &EngineState| is_units_shaped(e));
expr_classified_evaluator!(PercentageEvaluator, |e: &Expr, _s: &EngineState| is_percentage_shaped(e));
expr_classified_evaluator!(DateEvaluator, |e: &Expr, _s: &EngineState| is_date_shaped(e));
expr_classified_evaluator!(ListEvaluator, |e: &Expr, _s: &EngineState| is_list_shaped(e));
expr_classified_evaluator!(SolveEvaluator, |e: &Expr, _s: &EngineState| is_solve_shaped(e));
expr_classified_evaluator!(UserFunctionCallEvaluator, |e: &Expr, s: &EngineState| is_user_function_call(e, s));

impl Evaluator for ExpressionEvaluator {
    fn can_handle(&self, node: &AstNode, _state: &EngineState) -> bool {
        matches!(node, AstNode::Expression { .. })
    }

    fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode {
        let AstNode::Expression { raw_expression, expr, .. } = node else {
            unreachable!("can_handle guarantees this variant")
        };
        evaluate_live_expression(raw_expression, expr, state)
    }
}

impl Evaluator for VariableAssignmentEvaluator {
    fn can_handle(&self, node: &AstNode, _state: &EngineState) -> bool {
        matches!(node, AstNode::VariableAssignment { .. })
    }

    fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode {
        let AstNode::VariableAssignment { name, raw_value, parsed_value } = node else {
            unreachable!("can_handle guarantees this variant")
        };
        let value = evaluate_assignment(name, raw_value, parsed_value, state);
        render_value_result(
            |display| RenderNode::Variable {
                name: name.clone(),
                raw_value: raw_value.clone(),
                display_text: format!("{name} = {display}"),
            },
            &value,
            state,
        )
    }
}

impl Evaluator for CombinedAssignmentEvaluator {
    fn can_handle(&self, node: &AstNode, _state: &EngineState) -> bool {
        matches!(node, AstNode::CombinedAssignment { .. })
    }

    fn evaluate(&self, node: &AstNode, state: &mut EngineState) -> RenderNode {
        let AstNode::CombinedAssignment { name, raw_expression, expr } = node else {
            unreachable!("can_handle guarantees this variant")
        };
        let value = evaluate_assignment(name, raw_expression, expr, state);
        render_value_result(
            |display| RenderNode::Combined {
                name: name.clone(),
                expression: raw_expression.clone(),
                result_display: display.to_string(),
                display_text: format!("{name} = {raw_expression} = {display}"),
            },
            &value,
            state,
        )
    }
}

/// Evaluates `expr` against the current document state and renders it as a
/// live math result, folding any evaluation error into an `Error` render
/// node instead (spec.md 6.2/7).
fn evaluate_live_expression(raw_expression: &str, expr: &Expr, state: &EngineState) -> RenderNode {
    let value = match eval_expr(expr, &state.ctx()) {
        Ok(v) => v,
        Err(e) => Value::Error(e),
    };
    render_value_result(
        |display| RenderNode::MathResult {
            expression: raw_expression.to_string(),
            result_display: display.to_string(),
            display_text: format!("{raw_expression} = {display}"),
        },
        &value,
        state,
    )
}

/// Writes a variable/combined-assignment line's resulting value and fans
/// the change out to its reactive dependents (spec.md 3.5, 3.6, 5).
///
/// Every such line is unconditionally recorded in the equation store before
/// it is evaluated: a later line may solve against it even when this line's
/// own right-hand side can't yet be evaluated (spec.md 5: "line order
/// defines both assignment order and the equation store order").
fn evaluate_assignment(name: &str, raw_source: &str, expr: &Expr, state: &mut EngineState) -> Value {
    state.equations.insert(state.line_number, Expr::Identifier(name.to_string()), expr.clone());

    let mut deps = Vec::new();
    free_identifiers(expr, &mut deps);
    state.variables.set_dependencies(name, deps);

    if state.variables.is_circular(name) {
        let err = Error::CircularDependency(name.to_string());
        state.variables.write(name, Value::Error(err.clone()), raw_source.to_string(), state.now);
        return Value::Error(err);
    }

    let value = match eval_expr(expr, &state.ctx()) {
        Ok(v) => v,
        Err(e) => Value::Error(e),
    };
    let value = match register_unit_alias_if_applicable(name, expr, &value, state) {
        Some(err) => Value::Error(Error::from(err)),
        None => value,
    };

    state.variables.write(name, value.clone(), raw_source.to_string(), state.now);
    propagate_dependents(name, state);
    value
}

/// Promotes a plain assignment to a unit alias exactly for the two shapes
/// spec.md 4.6 documents — a quantity result (`workweek = 40h`) or a bare
/// numeric literal (`dozen = 12`) — so e.g. `x = 5` (a computed number, not
/// a literal) doesn't silently also become an alias.
fn register_unit_alias_if_applicable(
    name: &str,
    expr: &Expr,
    value: &Value,
    state: &mut EngineState,
) -> Option<notecalc_units::Error> {
    match (expr, value) {
        (_, Value::Unit(q)) => state.aliases.define_scaled(name, q.value, q.unit.clone()).err(),
        (Expr::Number(n), _) => {
            state.aliases.define_count(name, *n);
            None
        }
        _ => None,
    }
}

/// Re-evaluates every variable that transitively depends on `root`, in the
/// deterministic topological order [`VariableStore::topo_dependents`]
/// computes, against each dependent's own stored right-hand side.
fn propagate_dependents(root: &str, state: &mut EngineState) {
    for dependent in state.variables.topo_dependents(root) {
        if state.variables.is_circular(&dependent) {
            let err = Error::CircularDependency(dependent.clone());
            state.variables.write(&dependent, Value::Error(err), String::new(), state.now);
            continue;
        }
        let Some(record) = state.equations.latest_for_name(&dependent).cloned() else {
            continue;
        };
        let raw = state
            .variables
            .record(&dependent)
            .map(|r| r.raw_source.clone())
            .unwrap_or_default();
        let value = match eval_expr(&record.rhs, &state.ctx()) {
            Ok(v) => v,
            Err(e) => Value::Error(e),
        };
        let value = match register_unit_alias_if_applicable(&dependent, &record.rhs, &value, state) {
            Some(err) => Value::Error(Error::from(err)),
            None => value,
        };
        state.variables.write(&dependent, value, raw, state.now);
    }
}

/// Shared error-vs-value rendering: an `Error` value always becomes an
/// `Error` render node regardless of which evaluator produced it, so the
/// host's error UX doesn't depend on which evaluator happened to run.
fn render_value_result(
    build: impl FnOnce(&str) -> RenderNode,
    value: &Value,
    state: &EngineState,
) -> RenderNode {
    if let Value::Error(e) = value {
        return RenderNode::Error {
            kind: e.kind().to_string(),
            error: e.to_string(),
            display_text: error_display(&e.to_string()),
        };
    }
    let display = format_value(value, state.options);
    build(&display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_line, KnownNames};
    use notecalc_units::AliasTable;

    struct TestNames<'a> {
        variables: &'a VariableStore,
        functions: &'a FunctionStore,
    }
    impl<'a> KnownNames for TestNames<'a> {
        fn is_known_name(&self, candidate: &str) -> bool {
            self.variables.contains(candidate) || self.functions.contains(candidate)
        }
        fn is_known_function(&self, name: &str) -> bool {
            self.functions.contains(name) || is_known(name)
        }
    }

    fn fresh_state(
        variables: &mut VariableStore,
        functions: &mut FunctionStore,
        equations: &mut EquationStore,
        aliases: &mut AliasTable,
        options: &EngineOptions,
        line_number: usize,
    ) -> EngineState<'_> {
        EngineState { variables, functions, equations, aliases, options, line_number, now: 0 }
    }

    #[test]
    fn plain_assignment_renders_variable_node() {
        let mut variables = VariableStore::new();
        let mut functions = FunctionStore::new();
        let mut equations = EquationStore::new();
        let mut aliases = AliasTable::new();
        let options = EngineOptions::default();
        let names = TestNames { variables: &variables, functions: &functions };
        let node = parse_line("price = 3", &crate::lexer::NoUnits, &names);
        let mut state = fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 1);
        let render = evaluate_node(&node, &mut state);
        match render {
            RenderNode::Variable { name, .. } => assert_eq!(name, "price"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reactive_dependent_updates_after_root_changes() {
        let mut variables = VariableStore::new();
        let mut functions = FunctionStore::new();
        let mut equations = EquationStore::new();
        let mut aliases = AliasTable::new();
        let options = EngineOptions::default();

        {
            let names = TestNames { variables: &variables, functions: &functions };
            let node = parse_line("price = 3", &crate::lexer::NoUnits, &names);
            let mut state =
                fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 1);
            evaluate_node(&node, &mut state);
        }
        {
            let names = TestNames { variables: &variables, functions: &functions };
            let node = parse_line("total = price * 2 =>", &crate::lexer::NoUnits, &names);
            let mut state =
                fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 2);
            evaluate_node(&node, &mut state);
        }
        assert_eq!(variables.get("total"), Some(&Value::Number(6.0)));

        {
            let names = TestNames { variables: &variables, functions: &functions };
            let node = parse_line("price = 10", &crate::lexer::NoUnits, &names);
            let mut state =
                fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 1);
            evaluate_node(&node, &mut state);
        }
        assert_eq!(variables.get("total"), Some(&Value::Number(20.0)));
    }

    #[test]
    fn bare_number_assignment_registers_count_alias() {
        let mut variables = VariableStore::new();
        let mut functions = FunctionStore::new();
        let mut equations = EquationStore::new();
        let mut aliases = AliasTable::new();
        let options = EngineOptions::default();
        let names = TestNames { variables: &variables, functions: &functions };
        let node = parse_line("dozen = 12", &crate::lexer::NoUnits, &names);
        let mut state = fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 1);
        evaluate_node(&node, &mut state);
        assert!(aliases.contains("dozen"));
    }

    #[test]
    fn circular_dependency_renders_as_error() {
        let mut variables = VariableStore::new();
        let mut functions = FunctionStore::new();
        let mut equations = EquationStore::new();
        let mut aliases = AliasTable::new();
        let options = EngineOptions::default();

        {
            let names = TestNames { variables: &variables, functions: &functions };
            let node = parse_line("a = b + 1", &crate::lexer::NoUnits, &names);
            let mut state =
                fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 1);
            evaluate_node(&node, &mut state);
        }
        let names = TestNames { variables: &variables, functions: &functions };
        let node = parse_line("b = a + 1", &crate::lexer::NoUnits, &names);
        let mut state = fresh_state(&mut variables, &mut functions, &mut equations, &mut aliases, &options, 2);
        let render = evaluate_node(&node, &mut state);
        assert!(matches!(render, RenderNode::Error { kind, .. } if kind == "CircularDependency"));
    }
}
