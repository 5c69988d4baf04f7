// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build orchestration

use super::cache::BuildStats;
use super::resolver::Resolver;
use super::validate::ShapeValidator;
use crate::config::BuildConfig;
use crate::error::BuildResult;
use crate::registry::OperationRegistry;
use crate::tree::ConstructionTree;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shape of the root together with the counters of its build
#[derive(Debug)]
pub struct BuildOutput<S> {
    pub shape: Arc<S>,
    pub stats: BuildStats,
}

/// Runs builds of construction trees against a registry.
///
/// Every call to `execute` gets its own cache, so one executor can serve
/// successive or concurrent builds without them seeing each other's shapes.
pub struct Executor<S> {
    registry: Arc<OperationRegistry<S>>,
    validator: Option<Arc<dyn ShapeValidator<S>>>,
    max_depth: Option<usize>,
}

impl<S> Executor<S> {
    pub fn new(registry: OperationRegistry<S>) -> Self {
        Self::with_registry(Arc::new(registry))
    }

    pub fn with_registry(registry: Arc<OperationRegistry<S>>) -> Self {
        Self {
            registry,
            validator: None,
            max_depth: None,
        }
    }

    /// Attach a postcondition checked on every built shape
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: ShapeValidator<S> + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Fail builds nesting deeper than `max_depth`; unlimited by default
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Apply `config`: its depth limit, and `validator` when
    /// `validate_results` is set
    pub fn configure<V>(mut self, config: &BuildConfig, validator: V) -> Self
    where
        V: ShapeValidator<S> + 'static,
    {
        self.max_depth = config.max_depth;
        if config.validate_results {
            self = self.with_validator(validator);
        }
        self
    }

    pub fn registry(&self) -> &OperationRegistry<S> {
        &self.registry
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Build the root of `tree`
    pub fn execute(&self, tree: &ConstructionTree) -> BuildResult<Arc<S>> {
        self.execute_with_stats(tree).map(|output| output.shape)
    }

    #[instrument(level = "debug", skip_all, fields(root = tree.root()))]
    pub fn execute_with_stats(&self, tree: &ConstructionTree) -> BuildResult<BuildOutput<S>> {
        let mut resolver = Resolver::new(tree, &self.registry);
        if let Some(max_depth) = self.max_depth {
            resolver = resolver.with_max_depth(max_depth);
        }
        if let Some(validator) = &self.validator {
            resolver = resolver.with_validator(validator.as_ref());
        }

        let shape = resolver.evaluate_node(tree.root())?;
        let stats = resolver.into_stats();
        debug!(
            evaluated = stats.evaluated_nodes,
            cache_hits = stats.cache_hits,
            "build finished"
        );
        Ok(BuildOutput { shape, stats })
    }

    /// Load a structured tree and build it
    pub fn execute_value(&self, value: serde_json::Value) -> BuildResult<Arc<S>> {
        let tree = ConstructionTree::from_value(value)?;
        self.execute(&tree)
    }

    /// Parse a JSON tree and build it
    pub fn execute_str(&self, source: &str) -> BuildResult<Arc<S>> {
        let tree = ConstructionTree::from_json(source)?;
        self.execute(&tree)
    }

    /// Build independent trees in parallel, one cache per tree
    pub fn execute_many(&self, trees: &[ConstructionTree]) -> Vec<BuildResult<Arc<S>>>
    where
        S: Send + Sync,
    {
        trees.par_iter().map(|tree| self.execute(tree)).collect()
    }
}

impl<S> std::fmt::Debug for Executor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .field("validator", &self.validator.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
