//! Reactive variable store: records plus a dependency graph with
//! topological re-evaluation and cycle detection (spec.md 3.5, 3.6, 4.10).
//!
//! The graph owns only name references and edges, never the variables
//! themselves (spec.md 9) — the same separation
//! `ferrum-fhirpath/src/variables.rs`'s `VariableRegistry` keeps between
//! name→id allocation and the `Context` that actually holds values.

use crate::value::Value;
use indexmap::{IndexMap, IndexSet};

#[derive(Clone, Debug)]
pub struct VariableRecord {
    pub name: String,
    pub current_value: Value,
    pub raw_source: String,
    pub units_hint: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Clone, Debug, Default)]
struct DependencyNode {
    dependencies: IndexSet<String>,
    dependents: IndexSet<String>,
    is_circular: bool,
}

#[derive(Default, Clone)]
pub struct VariableStore {
    records: IndexMap<String, VariableRecord>,
    graph: IndexMap<String, DependencyNode>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.records.get(name).map(|r| &r.current_value)
    }

    pub fn record(&self, name: &str) -> Option<&VariableRecord> {
        self.records.get(name)
    }

    pub fn is_circular(&self, name: &str) -> bool {
        self.graph.get(name).map(|n| n.is_circular).unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) {
        self.records.shift_remove(name);
        self.set_dependencies(name, Vec::new());
        self.graph.shift_remove(name);
    }

    /// Writes a variable's value and raw source. `created_at` is preserved
    /// across reassignment; `updated_at` always advances.
    pub fn write(&mut self, name: &str, value: Value, raw_source: String, now: i64) {
        let created_at = self
            .records
            .get(name)
            .map(|r| r.created_at)
            .unwrap_or(now);
        self.records.insert(
            name.to_string(),
            VariableRecord {
                name: name.to_string(),
                current_value: value,
                raw_source,
                units_hint: None,
                created_at,
                updated_at: now,
            },
        );
    }

    /// Replaces the dependency edges for `name` and refreshes circular
    /// flags across the whole graph. Edges always get applied — spec.md 9
    /// treats a cycle as first-class state, not a rejected edit — but
    /// every node left in a cycle is later forced to an `Error` value by
    /// the caller (spec.md 4.10/7).
    pub fn set_dependencies(&mut self, name: &str, deps: Vec<String>) {
        let old_deps: Vec<String> = self
            .graph
            .get(name)
            .map(|n| n.dependencies.iter().cloned().collect())
            .unwrap_or_default();
        for dep in &old_deps {
            if let Some(node) = self.graph.get_mut(dep) {
                node.dependents.shift_remove(name);
            }
        }
        let node = self.graph.entry(name.to_string()).or_default();
        node.dependencies = deps.iter().cloned().collect();
        for dep in &deps {
            let dep_node = self.graph.entry(dep.clone()).or_default();
            dep_node.dependents.insert(name.to_string());
        }
        self.refresh_circular_flags();
    }

    pub fn dependencies(&self, name: &str) -> Vec<String> {
        self.graph
            .get(name)
            .map(|n| n.dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every node transitively depending on `root`, in deterministic
    /// topological order (ties broken by graph insertion order), so a
    /// changed root is followed by its dependents in an order where every
    /// dependency is visited before its dependent (spec.md 5/8).
    pub fn topo_dependents(&self, root: &str) -> Vec<String> {
        let mut visited: IndexSet<String> = IndexSet::new();
        let mut queue = vec![root.to_string()];
        while let Some(n) = queue.pop() {
            if let Some(node) = self.graph.get(&n) {
                for dependent in &node.dependents {
                    if visited.insert(dependent.clone()) {
                        queue.push(dependent.clone());
                    }
                }
            }
        }

        let mut order = Vec::new();
        let mut placed: IndexSet<String> = IndexSet::new();
        let mut remaining: IndexSet<String> = visited.clone();
        while !remaining.is_empty() {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|n| {
                    self.graph
                        .get(*n)
                        .map(|node| {
                            node.dependencies
                                .iter()
                                .all(|d| d == root || placed.contains(d) || !visited.contains(d))
                        })
                        .unwrap_or(true)
                })
                .cloned()
                .collect();
            if ready.is_empty() {
                // Residual cycle among `remaining`; emit in insertion order
                // rather than looping forever.
                order.extend(remaining.iter().cloned());
                break;
            }
            for n in &ready {
                remaining.shift_remove(n);
                placed.insert(n.clone());
                order.push(n.clone());
            }
        }
        order
    }

    /// Full-graph cycle detection via DFS with a recursion stack; every
    /// node on a cycle is flagged `is_circular`, every node no longer on
    /// one is cleared (spec.md 4.10: "subsequent edits that break the
    /// cycle clear the flag chain-wide").
    fn refresh_circular_flags(&mut self) {
        let names: Vec<String> = self.graph.keys().cloned().collect();
        let mut circular: IndexSet<String> = IndexSet::new();
        let mut visited: IndexSet<String> = IndexSet::new();

        for start in &names {
            if visited.contains(start) {
                continue;
            }
            let mut stack: Vec<(String, usize)> = vec![(start.clone(), 0)];
            let mut path: Vec<String> = Vec::new();
            let mut on_path: IndexSet<String> = IndexSet::new();
            while let Some((node, idx)) = stack.pop() {
                if idx == 0 {
                    path.push(node.clone());
                    on_path.insert(node.clone());
                    visited.insert(node.clone());
                }
                let deps: Vec<String> = self
                    .graph
                    .get(&node)
                    .map(|n| n.dependencies.iter().cloned().collect())
                    .unwrap_or_default();
                if let Some(next_dep) = deps.get(idx) {
                    stack.push((node.clone(), idx + 1));
                    if on_path.contains(next_dep) {
                        let cycle_start = path.iter().position(|n| n == next_dep).unwrap_or(0);
                        for n in &path[cycle_start..] {
                            circular.insert(n.clone());
                        }
                    } else if !visited.contains(next_dep) {
                        stack.push((next_dep.clone(), 0));
                    }
                } else {
                    on_path.shift_remove(&node);
                    path.pop();
                }
            }
        }

        for (name, node) in self.graph.iter_mut() {
            node.is_circular = circular.contains(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_simple_cycle() {
        let mut store = VariableStore::new();
        store.set_dependencies("a", vec!["b".to_string()]);
        store.set_dependencies("b", vec!["a".to_string()]);
        assert!(store.is_circular("a"));
        assert!(store.is_circular("b"));
    }

    #[test]
    fn breaking_cycle_clears_flags() {
        let mut store = VariableStore::new();
        store.set_dependencies("a", vec!["b".to_string()]);
        store.set_dependencies("b", vec!["a".to_string()]);
        store.set_dependencies("b", vec![]);
        assert!(!store.is_circular("a"));
        assert!(!store.is_circular("b"));
    }

    #[test]
    fn topo_order_visits_every_dependent_once() {
        let mut store = VariableStore::new();
        store.set_dependencies("total", vec!["price".to_string(), "qty".to_string()]);
        let order = store.topo_dependents("price");
        assert_eq!(order, vec!["total".to_string()]);
    }

    #[test]
    fn created_at_is_immutable_across_writes() {
        let mut store = VariableStore::new();
        store.write("x", Value::Number(1.0), "1".to_string(), 100);
        store.write("x", Value::Number(2.0), "2".to_string(), 200);
        let rec = store.record("x").unwrap();
        assert_eq!(rec.created_at, 100);
        assert_eq!(rec.updated_at, 200);
    }
}
