//! Lint target
//!
//! Runs the linter once per discovered package, all packages in parallel,
//! through a [`TaskSet`] labelled `lint`.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::pkgs::PkgSet;
use crate::tasks::{TaskCommand, TaskSet};

/// Label of the lint task set; also part of every lint output file name.
pub const LINT_LABEL: &str = "lint";

/// Linter binary used when the configuration does not override the command.
pub const LINT_PROGRAM: &str = "gometalinter";

/// Checks enabled on every run.
pub const DEFAULT_LINT_ARGS: &[&str] = &[
    "--disable-all",
    "--enable=golint",
    "--enable=vet",
    "--enable=gofmt",
];

/// `lint` section of `build.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Linter {
    pub disabled: bool,

    /// Packages that are discovered but not linted.
    pub exclude: Vec<String>,

    /// Extra linter arguments, appended after the defaults.
    pub extra_lints: Vec<String>,

    /// Per-package limit such as `90s` or `5m`. Empty means no limit.
    pub timeout: String,

    /// Replacement for the default linter invocation, as an argv list.
    pub command: Option<Vec<String>>,

    /// Maximum packages linted at once. Absent means all at once.
    pub max_parallel: Option<usize>,
}

impl Linter {
    /// Parsed `timeout`, `None` when unset.
    pub fn timeout(&self) -> Result<Option<Duration>> {
        let raw = self.timeout.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_duration::parse(raw)
            .map(Some)
            .with_context(|| format!("Invalid lint timeout: '{raw}'"))
    }

    /// Lint every package not excluded, from `project_dir`, capturing output
    /// under `out_dir`.
    ///
    /// Prints the per-package status report after the run, pass or fail.
    /// `max_parallel` overrides the configured limit.
    pub fn execute(
        &self,
        packages: &PkgSet,
        project_dir: &Path,
        out_dir: &Path,
        max_parallel: Option<usize>,
    ) -> Result<()> {
        if self.disabled {
            info!("lint disabled, skipping");
            return Ok(());
        }

        let mut ts = self.build_taskset(packages, project_dir, out_dir, max_parallel)?;
        let result = ts.run();
        ts.print_status();
        result.context("lint failed")
    }

    /// Build, but do not run, the lint task set.
    pub fn build_taskset(
        &self,
        packages: &PkgSet,
        project_dir: &Path,
        out_dir: &Path,
        max_parallel: Option<usize>,
    ) -> Result<TaskSet> {
        let base = self.base_command()?;
        self.check_program(&base[0]);

        let limit = max_parallel.or(self.max_parallel).unwrap_or(0);
        let mut ts = TaskSet::new(LINT_LABEL, out_dir, None)
            .with_max_parallel(limit)
            .with_timeout(self.timeout()?);

        let excluded: PkgSet = self.exclude.iter().cloned().collect();
        for pkg in packages.iter() {
            if excluded.contains(pkg) {
                debug!(package = %pkg, "package excluded from lint");
                continue;
            }
            ts.add(pkg, self.make_command(&base, pkg, project_dir));
        }
        Ok(ts)
    }

    fn base_command(&self) -> Result<Vec<String>> {
        match &self.command {
            Some(argv) if argv.is_empty() => bail!("lint command must not be empty"),
            Some(argv) => Ok(argv.clone()),
            None => Ok(std::iter::once(LINT_PROGRAM)
                .chain(DEFAULT_LINT_ARGS.iter().copied())
                .map(String::from)
                .collect()),
        }
    }

    fn make_command(&self, base: &[String], pkg: &str, project_dir: &Path) -> TaskCommand {
        TaskCommand::new(&base[0])
            .args(&base[1..])
            .args(&self.extra_lints)
            .arg(package_target(pkg))
            .current_dir(project_dir)
    }

    fn check_program(&self, program: &str) {
        if which::which(program).is_err() {
            warn!(program, "lint program not found on PATH; every lint task will fail");
        }
    }
}

/// Linter argument selecting a package and everything below it.
pub fn package_target(pkg: &str) -> String {
    if pkg.is_empty() {
        ".".to_string()
    } else {
        format!("./{pkg}/...")
    }
}
