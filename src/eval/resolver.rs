// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lazy, memoized resolution of node references

use super::cache::{BuildStats, ResultCache};
use super::validate::ShapeValidator;
use crate::error::{BuildError, BuildResult};
use crate::registry::{OperationRegistry, Value};
use crate::tree::{Argument, ConstructionTree, NodeDefinition};
use ahash::AHashSet;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// A node whose arguments are being resolved
struct Frame<'a, S> {
    name: String,
    definition: &'a NodeDefinition,
    arguments: Vec<Value<S>>,
}

/// State of one build: evaluates nodes on demand, depth first.
///
/// Only nodes reachable from the requested one are built, each at most once.
/// Descent uses an explicit stack of frames, so nesting depth is bounded by
/// memory rather than the call stack. The names on that stack double as the
/// cycle detector.
pub struct Resolver<'a, S> {
    tree: &'a ConstructionTree,
    registry: &'a OperationRegistry<S>,
    validator: Option<&'a dyn ShapeValidator<S>>,
    max_depth: Option<usize>,
    cache: ResultCache<S>,
    in_progress: Vec<String>,
    on_stack: AHashSet<String>,
    stats: BuildStats,
}

impl<'a, S> Resolver<'a, S> {
    pub fn new(tree: &'a ConstructionTree, registry: &'a OperationRegistry<S>) -> Self {
        Self {
            tree,
            registry,
            validator: None,
            max_depth: None,
            cache: ResultCache::new(),
            in_progress: Vec::new(),
            on_stack: AHashSet::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn with_validator(mut self, validator: &'a dyn ShapeValidator<S>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Fail with `DepthLimit` when nesting exceeds `max_depth`; unlimited by default
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Replace references by their shapes; literals pass through untouched
    pub fn resolve_arguments(&mut self, arguments: &[Argument]) -> BuildResult<Vec<Value<S>>> {
        arguments
            .iter()
            .map(|argument| match argument {
                Argument::Literal(literal) => Ok(Value::Literal(literal.clone())),
                Argument::Reference(name) => self.evaluate_node(name).map(Value::Shape),
            })
            .collect()
    }

    /// Build the shape for `name`, building whatever it references first.
    ///
    /// On error the resolver stays usable: names entered by the failed call
    /// are released and nothing it built half-way is cached.
    #[instrument(level = "debug", skip(self))]
    pub fn evaluate_node(&mut self, name: &str) -> BuildResult<Arc<S>> {
        if let Some(shape) = self.cache.get(name) {
            self.stats.cache_hits += 1;
            trace!(node = name, "cache hit");
            return Ok(Arc::clone(shape));
        }

        let base = self.in_progress.len();
        let result = self.evaluate_uncached(name);
        if result.is_err() {
            for entered in self.in_progress.drain(base..) {
                self.on_stack.remove(&entered);
            }
        }
        result
    }

    fn evaluate_uncached(&mut self, name: &str) -> BuildResult<Arc<S>> {
        let mut current = self.enter(name)?;
        let mut parents: Vec<Frame<'a, S>> = Vec::new();

        loop {
            let definition = current.definition;
            if let Some(argument) = definition.parameters.get(current.arguments.len()) {
                match argument {
                    Argument::Literal(literal) => {
                        current.arguments.push(Value::Literal(literal.clone()));
                    }
                    Argument::Reference(child) => match self.cache.get(child).cloned() {
                        Some(shape) => {
                            self.stats.cache_hits += 1;
                            trace!(node = child.as_str(), "cache hit");
                            current.arguments.push(Value::Shape(shape));
                        }
                        None => {
                            let frame = self.enter(child)?;
                            parents.push(std::mem::replace(&mut current, frame));
                        }
                    },
                }
                continue;
            }

            let shape = self.complete(current)?;
            match parents.pop() {
                Some(mut parent) => {
                    parent.arguments.push(Value::Shape(shape));
                    current = parent;
                }
                None => return Ok(shape),
            }
        }
    }

    /// Start evaluating `name`: cycle and depth checks, then lookup
    fn enter(&mut self, name: &str) -> BuildResult<Frame<'a, S>> {
        if self.on_stack.contains(name) {
            let start = self
                .in_progress
                .iter()
                .position(|n| n == name)
                .unwrap_or(0);
            let mut path = self.in_progress[start..].to_vec();
            path.push(name.to_string());
            return Err(BuildError::Cycle { path });
        }
        if let Some(limit) = self.max_depth {
            if self.in_progress.len() >= limit {
                return Err(BuildError::DepthLimit {
                    node: name.to_string(),
                    limit,
                });
            }
        }

        let tree = self.tree;
        let definition = tree.get(name)?;

        self.in_progress.push(name.to_string());
        self.on_stack.insert(name.to_string());
        self.stats.max_depth = self.stats.max_depth.max(self.in_progress.len());

        Ok(Frame {
            name: name.to_string(),
            definition,
            arguments: Vec::with_capacity(definition.parameters.len()),
        })
    }

    /// Invoke the operation of a frame whose arguments are all resolved
    fn complete(&mut self, frame: Frame<'a, S>) -> BuildResult<Arc<S>> {
        let Frame {
            name,
            definition,
            arguments,
        } = frame;

        let operation =
            self.registry
                .get(&definition.kind)
                .ok_or_else(|| BuildError::UnknownOperation {
                    node: name.clone(),
                    kind: definition.kind.clone(),
                })?;

        debug!(
            node = name.as_str(),
            kind = %definition.kind,
            arguments = arguments.len(),
            "executing command"
        );
        self.stats.record_invocation(&definition.kind);
        let shape = operation
            .invoke(&arguments)
            .map_err(|source| BuildError::OperationExecution {
                node: name.clone(),
                kind: definition.kind.clone(),
                source,
            })?;

        if let Some(validator) = self.validator {
            validator
                .validate(&name, &shape)
                .map_err(|source| BuildError::Validation {
                    node: name.clone(),
                    source,
                })?;
        }

        self.in_progress.pop();
        self.on_stack.remove(&name);
        Ok(self.cache.insert(&name, shape))
    }

    pub fn cache(&self) -> &ResultCache<S> {
        &self.cache
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn into_stats(self) -> BuildStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeDefinition;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Shapes are plain numbers: `num` yields its literal, `add` sums.
    fn arithmetic() -> OperationRegistry<f64> {
        OperationRegistry::new()
            .with("num", |args: &[Value<f64>]| -> Result<f64> {
                args[0].as_literal()?.as_f64()
            })
            .unwrap()
            .with("add", |args: &[Value<f64>]| -> Result<f64> {
                args.iter().map(|a| a.as_shape().copied()).sum()
            })
            .unwrap()
    }

    fn node(kind: &str, parameters: Vec<Argument>) -> NodeDefinition {
        NodeDefinition::new(kind, parameters)
    }

    #[test]
    fn test_evaluates_diamond_once_per_node() {
        let tree = ConstructionTree::new("top")
            .with_node("leaf", node("num", vec![Argument::literal(2.0)]))
            .with_node("left", node("add", vec![Argument::reference("leaf")]))
            .with_node(
                "right",
                node("add", vec![Argument::reference("leaf"), Argument::reference("leaf")]),
            )
            .with_node(
                "top",
                node("add", vec![Argument::reference("left"), Argument::reference("right")]),
            );
        let registry = arithmetic();

        let mut resolver = Resolver::new(&tree, &registry);
        let result = resolver.evaluate_node("top").unwrap();

        assert_eq!(*result, 6.0);
        assert_eq!(resolver.cache().len(), 4);
        let stats = resolver.into_stats();
        assert_eq!(stats.evaluated_nodes, 4);
        assert_eq!(stats.invocations_of("num"), 1);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_shared_node_yields_identical_shape() {
        let tree = ConstructionTree::new("pair")
            .with_node("leaf", node("num", vec![Argument::literal(1.0)]))
            .with_node(
                "pair",
                node("keep", vec![Argument::reference("leaf"), Argument::reference("leaf")]),
            );
        let same = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&same);
        let registry = arithmetic()
            .with("keep", move |args: &[Value<f64>]| -> Result<f64> {
                let a = args[0].shape_handle().unwrap();
                let b = args[1].shape_handle().unwrap();
                if Arc::ptr_eq(a, b) {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(0.0)
            })
            .unwrap();

        Resolver::new(&tree, &registry).evaluate_node("pair").unwrap();
        assert_eq!(same.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_literals_pass_through_unchanged() {
        let tree = ConstructionTree::new("x");
        let registry = arithmetic();
        let mut resolver = Resolver::new(&tree, &registry);

        let nested = Argument::literal(crate::tree::Literal::new(serde_json::json!([[1, 2], [3]])));
        let resolved = resolver.resolve_arguments(&[nested.clone()]).unwrap();

        match (&resolved[0], nested) {
            (Value::Literal(got), Argument::Literal(expected)) => assert_eq!(got, &expected),
            _ => panic!("literal was not passed through"),
        }
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let tree = ConstructionTree::new("loop")
            .with_node("loop", node("add", vec![Argument::reference("loop")]));
        let registry = arithmetic();

        match Resolver::new(&tree, &registry).evaluate_node("loop") {
            Err(BuildError::Cycle { path }) => assert_eq!(path, vec!["loop", "loop"]),
            other => panic!("expected cycle, got {:?}", other.map(|s| *s)),
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut tree = ConstructionTree::new("n0");
        for i in 0..10 {
            tree.insert(
                format!("n{}", i),
                node("add", vec![Argument::reference(format!("n{}", i + 1))]),
            );
        }
        tree.insert("n10", node("num", vec![Argument::literal(1.0)]));
        let registry = arithmetic();

        let ok = Resolver::new(&tree, &registry)
            .with_max_depth(11)
            .evaluate_node("n0");
        assert_eq!(*ok.unwrap(), 1.0);

        match Resolver::new(&tree, &registry)
            .with_max_depth(5)
            .evaluate_node("n0")
        {
            Err(BuildError::DepthLimit { node, limit }) => {
                assert_eq!(node, "n5");
                assert_eq!(limit, 5);
            }
            other => panic!("expected depth limit, got {:?}", other.map(|s| *s)),
        }
    }

    #[test]
    fn test_deep_chain_without_limit() {
        let depth = 10_000;
        let mut tree = ConstructionTree::new("n0");
        for i in 0..depth {
            tree.insert(
                format!("n{}", i),
                node("add", vec![Argument::reference(format!("n{}", i + 1))]),
            );
        }
        tree.insert(format!("n{}", depth), node("num", vec![Argument::literal(3.0)]));
        let registry = arithmetic();

        let mut resolver = Resolver::new(&tree, &registry);
        assert_eq!(*resolver.evaluate_node("n0").unwrap(), 3.0);
        let stats = resolver.into_stats();
        assert_eq!(stats.evaluated_nodes, depth + 1);
        assert_eq!(stats.max_depth, depth + 1);
    }

    #[test]
    fn test_resolver_reusable_after_error() {
        let tree = ConstructionTree::new("a")
            .with_node("a", node("add", vec![Argument::reference("missing")]))
            .with_node("b", node("add", vec![Argument::reference("a")]));
        let registry = arithmetic();
        let mut resolver = Resolver::new(&tree, &registry);

        for name in ["a", "a", "b"] {
            match resolver.evaluate_node(name) {
                Err(BuildError::UndefinedReference { name }) => assert_eq!(name, "missing"),
                other => panic!("expected undefined reference, got {:?}", other.map(|s| *s)),
            }
        }
        assert!(resolver.cache().is_empty());

        // Depth accounting restarts from the caller's level
        let tree = ConstructionTree::new("x")
            .with_node("x", node("add", vec![Argument::reference("bad")]))
            .with_node("bad", node("nope", Vec::new()))
            .with_node("y", node("num", vec![Argument::literal(1.0)]));
        let mut resolver = Resolver::new(&tree, &registry).with_max_depth(1);
        assert!(matches!(
            resolver.evaluate_node("x"),
            Err(BuildError::DepthLimit { .. })
        ));
        assert_eq!(*resolver.evaluate_node("y").unwrap(), 1.0);
    }

    #[test]
    fn test_unknown_kind_after_arguments() {
        let tree = ConstructionTree::new("top")
            .with_node("leaf", node("num", vec![Argument::literal(1.0)]))
            .with_node("top", node("nope", vec![Argument::reference("leaf")]));
        let registry = arithmetic();
        let mut resolver = Resolver::new(&tree, &registry);

        match resolver.evaluate_node("top") {
            Err(BuildError::UnknownOperation { node, kind }) => {
                assert_eq!(node, "top");
                assert_eq!(kind, "nope");
            }
            other => panic!("expected unknown operation, got {:?}", other.map(|s| *s)),
        }
        // The reached child stays cached
        assert!(resolver.cache().contains("leaf"));
        assert!(resolver.evaluate_node("top").is_err());
        assert_eq!(resolver.stats().invocations_of("num"), 1);
    }

    #[test]
    fn test_validator_failure_aborts() {
        let tree = ConstructionTree::new("neg")
            .with_node("neg", node("num", vec![Argument::literal(-1.0)]));
        let registry = arithmetic();
        let positive = |_: &str, value: &f64| -> Result<()> {
            anyhow::ensure!(*value > 0.0, "size must be positive, got {}", value);
            Ok(())
        };

        let mut resolver = Resolver::new(&tree, &registry).with_validator(&positive);
        match resolver.evaluate_node("neg") {
            Err(BuildError::Validation { node, .. }) => assert_eq!(node, "neg"),
            other => panic!("expected validation error, got {:?}", other.map(|s| *s)),
        }
        assert!(resolver.cache().is_empty());
    }
}
