// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation registry
//!
//! Maps operation kinds to their implementations. Registration is validated
//! up front; during a build the registry is only read.

mod operation;

pub use operation::{Operation, OperationKind, Value};

use crate::error::RegistryError;
use ahash::AHashMap;
use anyhow::Result;
use std::sync::Arc;

/// Validated mapping from operation kind to implementation
pub struct OperationRegistry<S> {
    operations: AHashMap<OperationKind, Arc<dyn Operation<S>>>,
}

impl<S> OperationRegistry<S> {
    pub fn new() -> Self {
        Self {
            operations: AHashMap::new(),
        }
    }

    /// Register an implementation under `kind`.
    ///
    /// Fails if `kind` is not a valid identifier or is already taken.
    pub fn register<O>(&mut self, kind: &str, operation: O) -> Result<(), RegistryError>
    where
        O: Operation<S> + 'static,
    {
        self.register_shared(kind, Arc::new(operation))
    }

    pub fn register_shared(
        &mut self,
        kind: &str,
        operation: Arc<dyn Operation<S>>,
    ) -> Result<(), RegistryError> {
        let kind = OperationKind::parse(kind)?;
        if self.operations.contains_key(&kind) {
            return Err(RegistryError::DuplicateOperation(kind.to_string()));
        }
        self.operations.insert(kind, operation);
        Ok(())
    }

    /// Builder-style registration
    pub fn with<O>(mut self, kind: &str, operation: O) -> Result<Self, RegistryError>
    where
        O: Operation<S> + 'static,
    {
        self.register(kind, operation)?;
        Ok(self)
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Operation<S>> {
        self.operations.get(kind).map(|op| op.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.operations.contains_key(kind)
    }

    /// Invoke `kind` directly; `None` if it is not registered
    pub fn invoke(&self, kind: &str, arguments: &[Value<S>]) -> Option<Result<S>> {
        self.get(kind).map(|op| op.invoke(arguments))
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.operations.keys().map(OperationKind::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<S> Default for OperationRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for OperationRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
