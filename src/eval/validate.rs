// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Optional postcondition checks on built shapes

use anyhow::Result;

/// Check run on every shape right after it is built.
///
/// Only runs when attached to an executor. A failed check aborts the build.
pub trait ShapeValidator<S>: Send + Sync {
    fn validate(&self, node: &str, shape: &S) -> Result<()>;
}

impl<S, F> ShapeValidator<S> for F
where
    F: Fn(&str, &S) -> Result<()> + Send + Sync,
{
    fn validate(&self, node: &str, shape: &S) -> Result<()> {
        self(node, shape)
    }
}
