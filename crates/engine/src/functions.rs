//! User-defined function store and argument binding (spec.md 3.8, 4.9).
//!
//! A function definition is stored as data (name, parameters, body) the
//! same way `ferrum-fhirpath/src/vm/functions/registry.rs` keeps its
//! built-in table as data rather than closures, except these bodies are
//! resolved dynamically against the caller's variable scope at call time
//! rather than compiled once.

use crate::ast::{Arg, Expr, Param};
use crate::error::{Error, Result};
use crate::value::Value;
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Expr,
    pub definition_line: usize,
}

#[derive(Default)]
pub struct FunctionStore {
    defs: IndexMap<String, FunctionDef>,
}

impl FunctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, params: Vec<Param>, body: Expr, definition_line: usize) {
        self.defs.insert(
            name.to_string(),
            FunctionDef {
                name: name.to_string(),
                params,
                body,
                definition_line,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }
}

/// Binds call-site `args` to `def`'s parameters: positional args fill
/// params left-to-right, named args assign by name, unfilled params fall
/// back to their default expression, and a still-unfilled required
/// parameter is a [`Error::MissingArgument`] (spec.md 4.9).
pub fn bind_arguments<F>(def: &FunctionDef, args: &[Arg], eval: &F) -> Result<Vec<(String, Value)>>
where
    F: Fn(&Expr) -> Result<Value>,
{
    let mut bound: Vec<Option<Value>> = vec![None; def.params.len()];
    let mut next_positional = 0usize;

    for arg in args {
        match &arg.name {
            None => {
                if next_positional >= def.params.len() {
                    return Err(Error::Syntax(format!(
                        "too many arguments passed to '{}'",
                        def.name
                    )));
                }
                bound[next_positional] = Some(eval(&arg.value)?);
                next_positional += 1;
            }
            Some(name) => {
                let idx = def
                    .params
                    .iter()
                    .position(|p| &p.name == name)
                    .ok_or_else(|| Error::UnknownNamedArgument(name.clone()))?;
                bound[idx] = Some(eval(&arg.value)?);
            }
        }
    }

    let mut resolved = Vec::with_capacity(def.params.len());
    for (i, param) in def.params.iter().enumerate() {
        let value = match bound[i].take() {
            Some(v) => v,
            None => match &param.default {
                Some(default_expr) => eval(default_expr)?,
                None => return Err(Error::MissingArgument(param.name.clone())),
            },
        };
        resolved.push((param.name.clone(), value));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_number(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            _ => Err(Error::Syntax("unsupported in test eval".to_string())),
        }
    }

    fn sample_def() -> FunctionDef {
        FunctionDef {
            name: "tip".to_string(),
            params: vec![
                Param {
                    name: "bill".to_string(),
                    default: None,
                },
                Param {
                    name: "rate".to_string(),
                    default: Some(Expr::Number(15.0)),
                },
            ],
            body: Expr::Identifier("bill".to_string()),
            definition_line: 1,
        }
    }

    #[test]
    fn positional_args_fill_left_to_right() {
        let def = sample_def();
        let args = vec![
            Arg { name: None, value: Expr::Number(50.0) },
            Arg { name: None, value: Expr::Number(20.0) },
        ];
        let bound = bind_arguments(&def, &args, &eval_number).unwrap();
        assert_eq!(bound[0], ("bill".to_string(), Value::Number(50.0)));
        assert_eq!(bound[1], ("rate".to_string(), Value::Number(20.0)));
    }

    #[test]
    fn missing_optional_uses_default() {
        let def = sample_def();
        let args = vec![Arg { name: None, value: Expr::Number(50.0) }];
        let bound = bind_arguments(&def, &args, &eval_number).unwrap();
        assert_eq!(bound[1], ("rate".to_string(), Value::Number(15.0)));
    }

    #[test]
    fn missing_required_errors() {
        let def = sample_def();
        let args: Vec<Arg> = vec![];
        assert!(matches!(
            bind_arguments(&def, &args, &eval_number),
            Err(Error::MissingArgument(_))
        ));
    }

    #[test]
    fn named_arg_out_of_order() {
        let def = sample_def();
        let args = vec![
            Arg { name: Some("rate".to_string()), value: Expr::Number(20.0) },
            Arg { name: Some("bill".to_string()), value: Expr::Number(50.0) },
        ];
        let bound = bind_arguments(&def, &args, &eval_number).unwrap();
        assert_eq!(bound[0], ("bill".to_string(), Value::Number(50.0)));
        assert_eq!(bound[1], ("rate".to_string(), Value::Number(20.0)));
    }

    #[test]
    fn unknown_named_arg_errors() {
        let def = sample_def();
        let args = vec![Arg { name: Some("nope".to_string()), value: Expr::Number(1.0) }];
        assert!(matches!(
            bind_arguments(&def, &args, &eval_number),
            Err(Error::UnknownNamedArgument(_))
        ));
    }
}
