// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for construction tree builds

use thiserror::Error;

/// Failure of a single build. Every variant aborts the build it occurred in
/// and leaves the executor usable for the next one.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("construction tree has no root")]
    MissingRoot,

    #[error("cannot find definition of '{name}' in construction tree")]
    UndefinedReference { name: String },

    #[error("node '{node}' uses unknown operation '{kind}'")]
    UnknownOperation { node: String, kind: String },

    #[error("operation '{kind}' failed while building '{node}': {source}")]
    OperationExecution {
        node: String,
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("shape built for '{node}' failed validation: {source}")]
    Validation {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("nesting deeper than {limit} levels while building '{node}'")]
    DepthLimit { node: String, limit: usize },

    #[error("invalid construction tree: {reason}")]
    InvalidTree { reason: String },

    #[error("failed to parse construction tree: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BuildError {
    /// Name of the node the error is about, if it concerns one
    pub fn node(&self) -> Option<&str> {
        match self {
            BuildError::UndefinedReference { name } => Some(name),
            BuildError::UnknownOperation { node, .. }
            | BuildError::OperationExecution { node, .. }
            | BuildError::Validation { node, .. }
            | BuildError::DepthLimit { node, .. } => Some(node),
            BuildError::Cycle { path } => path.last().map(String::as_str),
            BuildError::MissingRoot | BuildError::InvalidTree { .. } | BuildError::Parse(_) => {
                None
            }
        }
    }
}

/// Rejected operation registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation '{0}' is already registered")]
    DuplicateOperation(String),

    #[error("invalid operation name '{0}'")]
    InvalidOperationName(String),
}

pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = BuildError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cycle detected: a -> b -> a");
        assert_eq!(err.node(), Some("a"));
    }

    #[test]
    fn test_operation_error_keeps_cause() {
        let err = BuildError::OperationExecution {
            node: "c1".into(),
            kind: "makeCylinder".into(),
            source: anyhow::anyhow!("radius must be positive"),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("radius must be positive"));
        assert!(err.to_string().contains("makeCylinder"));
    }
}
