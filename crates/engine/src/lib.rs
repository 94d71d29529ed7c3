//! Semantic expression engine for the notebook calculator.
//!
//! Wires the tokenizer, parser, value taxonomy, evaluator registry,
//! reactive variable store, equation store, unit-alias table and formatter
//! (the modules below) behind one `Engine` entry point, the same role
//! `ferrum-fhirpath/src/lib.rs` plays for that crate's compile/evaluate
//! pipeline: the public surface is a handful of methods, everything else
//! stays an internal module.

pub mod ast;
pub mod context;
pub mod currency;
pub mod equations;
pub mod error;
pub mod eval;
pub mod format;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod store;
pub mod token;
pub mod value;

use ast::AstNode;
use context::EngineOptions;
use equations::EquationStore;
use eval::registry::{evaluate_node, EngineState};
use functions::FunctionStore;
use lexer::UnitLookup;
use notecalc_units::AliasTable;
use parser::KnownNames;
use render::RenderNode;
use store::VariableStore;

/// Bridges the lexer's unit-suffix recognition to the live document state:
/// a token fuses into a unit literal when it names a built-in unit or an
/// alias the document has defined so far (spec.md 4.1, 4.6).
struct EngineUnitLookup<'a> {
    aliases: &'a AliasTable,
}

impl<'a> UnitLookup for EngineUnitLookup<'a> {
    fn is_unit_token(&self, token: &str) -> bool {
        notecalc_units::resolve_builtin(token).is_ok() || self.aliases.contains(token)
    }
}

/// Bridges the parser's phrase-identifier disambiguation to the live
/// document state (spec.md 9): a run of words only merges into one name
/// when it already names a variable, user function, or built-in function.
struct EngineKnownNames<'a> {
    variables: &'a VariableStore,
    functions: &'a FunctionStore,
}

impl<'a> KnownNames for EngineKnownNames<'a> {
    fn is_known_name(&self, candidate: &str) -> bool {
        self.variables.contains(candidate) || self.functions.contains(candidate)
    }

    fn is_known_function(&self, name: &str) -> bool {
        self.functions.contains(name) || eval::builtins::is_known(name)
    }
}

/// The engine's full document state: every variable written so far, every
/// function definition, every recorded equation, and every unit alias
/// (spec.md 3). A host owns one `Engine` per open notebook document.
pub struct Engine {
    variables: VariableStore,
    functions: FunctionStore,
    equations: EquationStore,
    aliases: AliasTable,
    options: EngineOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            variables: VariableStore::new(),
            functions: FunctionStore::new(),
            equations: EquationStore::new(),
            aliases: AliasTable::new(),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn functions(&self) -> &FunctionStore {
        &self.functions
    }

    /// Parses one notebook line without evaluating it, against the
    /// document's current variables/functions/aliases.
    #[tracing::instrument(level = "debug", skip(self, raw), fields(line_number))]
    pub fn parse_line(&self, line_number: usize, raw: &str) -> AstNode {
        let _ = line_number;
        let units = EngineUnitLookup { aliases: &self.aliases };
        let names = EngineKnownNames { variables: &self.variables, functions: &self.functions };
        parser::parse_line(raw, &units, &names)
    }

    /// Parses and evaluates one notebook line, writing any resulting
    /// variable/equation/alias state back into the document and returning
    /// the render node the host displays (spec.md 1, 6.2).
    ///
    /// `now` is Unix seconds supplied by the host — the engine performs no
    /// wall-clock reads of its own (spec.md 9) — used as both the "today"
    /// anchor for relative date literals and the variable record's
    /// created/updated timestamp.
    #[tracing::instrument(level = "debug", skip(self, raw), fields(line_number))]
    pub fn evaluate(&mut self, line_number: usize, raw: &str, now: i64) -> RenderNode {
        let node = self.parse_line(line_number, raw);
        let mut state = EngineState {
            variables: &mut self.variables,
            functions: &mut self.functions,
            equations: &mut self.equations,
            aliases: &mut self.aliases,
            options: &self.options,
            line_number,
            now,
        };
        evaluate_node(&node, &mut state)
    }

    /// Parses every line of a multi-line document, in isolation from one
    /// another (no evaluation, no shared state beyond what's already on the
    /// document at call time).
    pub fn parse_content(&self, content: &str) -> Vec<AstNode> {
        content
            .lines()
            .enumerate()
            .map(|(i, line)| self.parse_line(i + 1, line))
            .collect()
    }

    /// Evaluates every line of a multi-line document in order, threading
    /// reactive updates and equation-store lookups across lines the way a
    /// host re-running a whole notebook would (spec.md 5).
    pub fn evaluate_content(&mut self, content: &str, now: i64) -> Vec<RenderNode> {
        content
            .lines()
            .enumerate()
            .map(|(i, line)| self.evaluate(i + 1, line, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::Value;

    #[test]
    fn reactive_propagation_across_lines() {
        let mut engine = Engine::new();
        engine.evaluate(1, "price = 10", 0);
        engine.evaluate(2, "total = price * 3 =>", 0);
        assert_eq!(engine.variables.get("total"), Some(&Value::Number(30.0)));
        engine.evaluate(1, "price = 20", 0);
        assert_eq!(engine.variables.get("total"), Some(&Value::Number(60.0)));
    }

    #[test]
    fn unit_conversion_round_trips() {
        let mut engine = Engine::new();
        let render = engine.evaluate(1, "100 km to mi =>", 0);
        match render {
            RenderNode::MathResult { result_display, .. } => {
                assert!(result_display.contains("mi"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scaled_unit_alias_then_conversion() {
        let mut engine = Engine::new();
        engine.evaluate(1, "workweek = 40 h", 0);
        let render = engine.evaluate(2, "2 workweek to h =>", 0);
        match render {
            RenderNode::MathResult { result_display, .. } => {
                assert!(result_display.contains("80"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn implicit_solve_against_earlier_equation() {
        let mut engine = Engine::new();
        engine.evaluate(1, "distance = rate * time", 0);
        engine.evaluate(2, "rate = 20", 0);
        engine.evaluate(3, "distance = 100", 0);
        let render = engine.evaluate(4, "time =>", 0);
        match render {
            RenderNode::MathResult { result_display, .. } => {
                assert!(result_display.contains('5'));
            }
            other => panic!("unexpected render {other:?}"),
        }
    }

    #[test]
    fn function_definition_then_call() {
        let mut engine = Engine::new();
        engine.evaluate(1, "tip(bill, rate = 15) = bill * rate / 100", 0);
        let render = engine.evaluate(2, "tip(100) =>", 0);
        match render {
            RenderNode::MathResult { result_display, .. } => {
                assert_eq!(result_display, "15");
            }
            other => panic!("unexpected render {other:?}"),
        }
    }

    #[test]
    fn circular_dependency_surfaces_as_error() {
        let mut engine = Engine::new();
        engine.evaluate(1, "a = b + 1", 0);
        let render = engine.evaluate(2, "b = a + 1", 0);
        assert!(matches!(render, RenderNode::Error { kind, .. } if kind == "CircularDependency"));
    }
}
