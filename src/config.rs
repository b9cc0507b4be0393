//! `build.yaml` configuration document

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::lint::Linter;
use crate::pkgs::PkgSet;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "build.yaml";

/// Top-level build configuration.
///
/// Unknown keys are ignored and every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Packages excluded from discovery, and so from every target.
    pub exclude: Vec<String>,

    /// Lint target settings. Absent means linting with defaults.
    pub lint: Option<Linter>,
}

impl BuildConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse a configuration document. An empty document is the default config.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        if let Some(linter) = &config.lint {
            linter.timeout()?;
        }
        Ok(config)
    }

    pub fn excluded_packages(&self) -> PkgSet {
        self.exclude.iter().cloned().collect()
    }

    pub fn linter(&self) -> Linter {
        self.lint.clone().unwrap_or_default()
    }
}
