// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-build result cache and statistics

use ahash::AHashMap;
use std::sync::Arc;

/// Shapes built so far in one build, keyed by node name.
///
/// Each name is written at most once. A cache lives exactly as long as the
/// build that created it.
#[derive(Debug)]
pub struct ResultCache<S> {
    shapes: AHashMap<String, Arc<S>>,
}

impl<S> ResultCache<S> {
    pub fn new() -> Self {
        Self {
            shapes: AHashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<S>> {
        self.shapes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Store the shape for `name` and return the shared handle.
    ///
    /// A second insert for the same name keeps the first shape.
    pub fn insert(&mut self, name: &str, shape: S) -> Arc<S> {
        Arc::clone(
            self.shapes
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(shape)),
        )
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl<S> Default for ResultCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters collected during one build
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Nodes whose operation was invoked
    pub evaluated_nodes: usize,
    /// References served from the cache
    pub cache_hits: usize,
    /// Deepest nesting reached, root = 1
    pub max_depth: usize,
    /// Invocations per operation kind
    pub invocations: AHashMap<String, usize>,
}

impl BuildStats {
    pub fn invocations_of(&self, kind: &str) -> usize {
        self.invocations.get(kind).copied().unwrap_or(0)
    }

    /// Share of references served from the cache, in percent
    pub fn hit_rate(&self) -> f32 {
        let lookups = self.cache_hits + self.evaluated_nodes;
        if lookups == 0 {
            0.0
        } else {
            (self.cache_hits as f32 / lookups as f32) * 100.0
        }
    }

    pub(crate) fn record_invocation(&mut self, kind: &str) {
        self.evaluated_nodes += 1;
        *self.invocations.entry(kind.to_string()).or_insert(0) += 1;
    }
}
