//! Shared test helpers for building fake projects

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Test helper: Create a project tree with one Go file per package.
///
/// An empty package name puts `main.go` in the project root.
pub fn init_project(packages: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for pkg in packages {
        write_go_file(temp_dir.path(), pkg);
    }
    temp_dir
}

pub fn write_go_file(root: &Path, pkg: &str) {
    let dir = root.join(pkg);
    fs::create_dir_all(&dir).expect("Failed to create package directory");
    let file = if pkg.is_empty() { "main.go" } else { "lib.go" };
    fs::write(dir.join(file), "package x\n").expect("Failed to write Go file");
}

/// Test helper: Write a build.yaml whose linter is a shell script.
///
/// The script sees the package target (`./pkg/...` or `.`) as `$1`.
pub fn write_config(root: &Path, script: &str, extra: &str) {
    let script = script.replace('\'', "''");
    let content = format!(
        "lint:\n  command: [sh, -c, '{script}', lint]\n{extra}"
    );
    fs::write(root.join("build.yaml"), content).expect("Failed to write build.yaml");
}
