// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Node definitions and their arguments

use anyhow::{anyhow, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Opaque literal parameter, passed to operations unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Literal(serde_json::Value);

impl Literal {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.0
            .as_f64()
            .ok_or_else(|| anyhow!("expected a number, got {}", self.0))
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.0
            .as_bool()
            .ok_or_else(|| anyhow!("expected a boolean, got {}", self.0))
    }

    /// Numeric sequence of any length
    pub fn as_numbers(&self) -> Result<Vec<f64>> {
        let items = self
            .0
            .as_array()
            .ok_or_else(|| anyhow!("expected a sequence of numbers, got {}", self.0))?;
        items
            .iter()
            .map(|item| {
                item.as_f64()
                    .ok_or_else(|| anyhow!("expected a number inside {}, got {}", self.0, item))
            })
            .collect()
    }

    /// Coordinate pair or triple; a missing z defaults to 0
    pub fn as_point3(&self) -> Result<Point3<f64>> {
        let v = self.as_vector3()?;
        Ok(Point3::from(v))
    }

    pub fn as_vector3(&self) -> Result<Vector3<f64>> {
        match self.as_numbers()?.as_slice() {
            [x, y] => Ok(Vector3::new(*x, *y, 0.0)),
            [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
            other => Err(anyhow!(
                "expected 2 or 3 coordinates, got {} in {}",
                other.len(),
                self.0
            )),
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<[f64; 3]> for Literal {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value.to_vec())
    }
}

/// A node parameter: either literal data or the name of another node.
///
/// In the JSON form every top-level string is a reference. Strings nested
/// inside sequences stay literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Reference(String),
    Literal(Literal),
}

impl Argument {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal(value.into())
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Argument::Reference(name) => Some(name),
            Argument::Literal(_) => None,
        }
    }
}

/// One named entry of a construction tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Vec<Argument>,
}

impl NodeDefinition {
    pub fn new(kind: impl Into<String>, parameters: Vec<Argument>) -> Self {
        Self {
            kind: kind.into(),
            parameters,
        }
    }

    /// Names this node refers to directly, in parameter order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().filter_map(Argument::as_reference)
    }
}
