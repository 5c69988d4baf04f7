// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory by [`BuildConfig::load`]
pub const CONFIG_FILE: &str = "polyframe-csg.toml";

/// Settings for builds run through the executor and the reference kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Check every built shape with the kernel's postcondition
    pub validate_results: bool,
    /// Maximum nesting of node references; unlimited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Tessellation segments for curved primitives
    pub segments: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            validate_results: false,
            max_depth: None,
            segments: 32,
        }
    }
}

impl BuildConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: BuildConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `polyframe-csg.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `POLYFRAME_CSG_*` variables; unparsable values are ignored
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(validate) = lookup("POLYFRAME_CSG_VALIDATE") {
            self.validate_results = matches!(
                validate.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(depth) = lookup("POLYFRAME_CSG_MAX_DEPTH").and_then(|v| v.trim().parse().ok()) {
            self.max_depth = Some(depth);
        }

        if let Some(segments) = lookup("POLYFRAME_CSG_SEGMENTS").and_then(|v| v.trim().parse().ok()) {
            self.segments = segments;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
