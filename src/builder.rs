//! Build driver: setup, package discovery and target execution

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::config::BuildConfig;
use crate::pkgs::{self, PkgSet};

/// Resolved locations and overrides for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub config_file: PathBuf,
    pub output_dir: PathBuf,
    pub project_dir: PathBuf,
    pub max_parallel: Option<usize>,
}

/// A loaded configuration plus the packages it applies to.
#[derive(Debug)]
pub struct Builder {
    config: BuildConfig,
    packages: PkgSet,
    project_dir: PathBuf,
    output_dir: PathBuf,
    max_parallel: Option<usize>,
}

impl Builder {
    /// Load the configuration and discover the project's packages.
    pub fn new(options: &BuildOptions) -> Result<Self> {
        let config = BuildConfig::load(&options.config_file)?;
        let packages = pkgs::discover(&options.project_dir, &config.excluded_packages())
            .with_context(|| {
                format!(
                    "Failed to discover packages in {}",
                    options.project_dir.display()
                )
            })?;
        info!(packages = packages.len(), "loaded build configuration");

        Ok(Self {
            config,
            packages,
            project_dir: options.project_dir.clone(),
            output_dir: options.output_dir.clone(),
            max_parallel: options.max_parallel,
        })
    }

    pub fn packages(&self) -> &PkgSet {
        &self.packages
    }

    /// Run every target. Prints the time taken whether or not it succeeds.
    pub fn execute(&self) -> Result<()> {
        let start = Instant::now();
        println!("{}", "=== Build started ===".bold());

        let result = self.config.linter().execute(
            &self.packages,
            &self.project_dir,
            &self.output_dir,
            self.max_parallel,
        );

        println!("Time Taken: {:?}", start.elapsed());
        result
    }
}

/// Make paths absolute and give the build a fresh, empty output directory.
///
/// Anything already in the output directory is removed.
pub fn prepare(options: &BuildOptions) -> Result<BuildOptions> {
    let output_dir = absolute(&options.output_dir)?;
    let config_file = absolute(&options.config_file)?;

    if output_dir.exists() {
        fs::remove_dir_all(&output_dir).with_context(|| {
            format!("Failed to clear output directory: {}", output_dir.display())
        })?;
    }
    fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    Ok(BuildOptions {
        config_file,
        output_dir,
        project_dir: options.project_dir.clone(),
        max_parallel: options.max_parallel,
    })
}

/// Set up, load and run a full build.
pub fn build(options: &BuildOptions) -> Result<()> {
    let options = prepare(options)?;
    Builder::new(&options)?.execute()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path: {}", path.display()))
}
