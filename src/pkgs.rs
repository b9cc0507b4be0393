//! Package discovery
//!
//! A package is a top-level directory of the project holding at least one Go
//! source file anywhere beneath it. Source files directly in the project root
//! form the root package, named by the empty string.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory that is never searched, whatever the caller excludes.
pub const VENDOR_DIR: &str = "vendor";

/// Extension of the source files that make a directory a package.
pub const SOURCE_EXTENSION: &str = "go";

/// Set of package names, relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgSet(BTreeSet<String>);

impl PkgSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pkg: impl Into<String>) {
        self.0.insert(pkg.into());
    }

    pub fn contains(&self, pkg: &str) -> bool {
        self.0.contains(pkg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Packages in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PkgSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a PkgSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Find every package under `project_dir`.
///
/// Directories named in `excluded`, the vendor directory, and hidden
/// directories are not descended into at any depth.
pub fn discover(project_dir: &Path, excluded: &PkgSet) -> Result<PkgSet> {
    let mut pkgs = PkgSet::new();

    let walker = WalkDir::new(project_dir)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, excluded));

    for entry in walker {
        let entry = entry
            .with_context(|| format!("Failed to walk project: {}", project_dir.display()))?;

        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(project_dir).with_context(|| {
            format!(
                "Path {} is outside project {}",
                entry.path().display(),
                project_dir.display()
            )
        })?;
        pkgs.add(package_of(relative));
    }

    debug!(
        project = %project_dir.display(),
        packages = pkgs.len(),
        "discovered packages"
    );
    Ok(pkgs)
}

fn is_skipped_dir(entry: &DirEntry, excluded: &PkgSet) -> bool {
    // The project root itself is always searched.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == VENDOR_DIR || name.starts_with('.') || excluded.contains(&name)
}

fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Package a source file belongs to: its first path component, or the root
/// package for files directly in the project root.
fn package_of(relative: &Path) -> String {
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), Some(_)) => first.to_string_lossy().into_owned(),
        _ => String::new(),
    }
}
