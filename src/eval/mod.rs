// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction tree evaluation
//!
//! The [`Executor`] runs one build per call. Each build owns a [`Resolver`]
//! holding the result cache, so nothing survives from one build to the next.

mod cache;
mod executor;
mod resolver;
mod validate;

pub use cache::{BuildStats, ResultCache};
pub use executor::{BuildOutput, Executor};
pub use resolver::Resolver;
pub use validate::ShapeValidator;
