// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation contract and resolved argument values

use crate::error::RegistryError;
use crate::tree::{Literal, ROOT_KEY};
use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::Arc;

/// A resolved argument: literal data or a shape built by another node
#[derive(Debug)]
pub enum Value<S> {
    Literal(Literal),
    Shape(Arc<S>),
}

// Manual impl: cloning only bumps the Arc, so `S: Clone` is not required
impl<S> Clone for Value<S> {
    fn clone(&self) -> Self {
        match self {
            Value::Literal(literal) => Value::Literal(literal.clone()),
            Value::Shape(shape) => Value::Shape(Arc::clone(shape)),
        }
    }
}

impl<S> Value<S> {
    pub fn as_literal(&self) -> Result<&Literal> {
        match self {
            Value::Literal(literal) => Ok(literal),
            Value::Shape(_) => Err(anyhow!("expected literal data, got a shape")),
        }
    }

    pub fn as_shape(&self) -> Result<&S> {
        match self {
            Value::Shape(shape) => Ok(shape.as_ref()),
            Value::Literal(literal) => Err(anyhow!(
                "expected a shape, got literal {}",
                literal.value()
            )),
        }
    }

    /// The shared handle, for operations that keep the input alive
    pub fn shape_handle(&self) -> Option<&Arc<S>> {
        match self {
            Value::Shape(shape) => Some(shape),
            Value::Literal(_) => None,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Value::Shape(_))
    }
}

/// Implementation of one operation kind.
///
/// Receives the node's arguments with every reference already replaced by
/// the referenced shape, in parameter order.
pub trait Operation<S>: Send + Sync {
    fn invoke(&self, arguments: &[Value<S>]) -> Result<S>;
}

impl<S, F> Operation<S> for F
where
    F: Fn(&[Value<S>]) -> Result<S> + Send + Sync,
{
    fn invoke(&self, arguments: &[Value<S>]) -> Result<S> {
        self(arguments)
    }
}

/// Validated operation kind identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKind(String);

impl OperationKind {
    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`, except the reserved `root` key
    pub fn parse(name: &str) -> Result<Self, RegistryError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || name == ROOT_KEY {
            return Err(RegistryError::InvalidOperationName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for OperationKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_validation() {
        assert!(OperationKind::parse("makeBox").is_ok());
        assert!(OperationKind::parse("_private2").is_ok());

        for bad in ["", "root", "2d", "make box", "fuse!", "ü"] {
            assert_eq!(
                OperationKind::parse(bad),
                Err(RegistryError::InvalidOperationName(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_value_accessors() {
        let shape: Value<u32> = Value::Shape(Arc::new(7));
        let literal: Value<u32> = Value::Literal(Literal::new(json!(2.5)));

        assert_eq!(*shape.as_shape().unwrap(), 7);
        assert!(shape.as_literal().is_err());
        assert_eq!(literal.as_literal().unwrap().as_f64().unwrap(), 2.5);
        assert!(literal.as_shape().is_err());
    }

    #[test]
    fn test_closures_are_operations() {
        let double = |args: &[Value<f64>]| -> Result<f64> { Ok(args[0].as_shape()? * 2.0) };
        let result = Operation::<f64>::invoke(&double, &[Value::Shape(Arc::new(4.0))]).unwrap();
        assert_eq!(result, 8.0);
    }
}
