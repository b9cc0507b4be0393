//! Lint target over discovered packages

use std::fs;

use arnold::lint::Linter;
use arnold::pkgs::{discover, PkgSet};
use arnold::tasks::{TaskError, TaskSetError};
use tempfile::TempDir;

use super::helpers::{init_project, write_go_file};

fn sh_linter(script: &str) -> Linter {
    Linter {
        command: Some(
            ["sh", "-c", script, "lint"]
                .map(String::from)
                .to_vec(),
        ),
        ..Linter::default()
    }
}

#[test]
fn test_discovered_packages_each_get_a_task() {
    let project = init_project(&["", "api", "store"]);
    write_go_file(project.path(), "vendor/dep");
    write_go_file(project.path(), ".hidden");

    let packages = discover(project.path(), &PkgSet::new()).unwrap();
    assert_eq!(packages.list(), ["", "api", "store"]);

    let out = TempDir::new().unwrap();
    let linter = sh_linter(r#"echo "checked $1""#);
    let mut ts = linter
        .build_taskset(&packages, project.path(), out.path(), None)
        .unwrap();
    ts.run().unwrap();

    assert_eq!(
        fs::read_to_string(out.path().join("lint.out")).unwrap(),
        "checked .\n"
    );
    assert_eq!(
        fs::read_to_string(out.path().join("api_lint.out")).unwrap(),
        "checked ./api/...\n"
    );
    assert_eq!(
        fs::read_to_string(out.path().join("store_lint.out")).unwrap(),
        "checked ./store/...\n"
    );
    assert!(!out.path().join("vendor_lint.out").exists());
}

#[test]
fn test_commands_run_from_project_dir() {
    let project = init_project(&["api"]);
    let out = TempDir::new().unwrap();
    let packages = discover(project.path(), &PkgSet::new()).unwrap();

    // Resolves only when the working directory is the project root.
    let linter = sh_linter(r#"ls "${1%/...}/lib.go""#);
    linter
        .execute(&packages, project.path(), out.path(), None)
        .unwrap();
}

#[test]
fn test_lint_exclusions_skip_tasks_but_not_discovery() {
    let project = init_project(&["api", "legacy"]);
    let out = TempDir::new().unwrap();
    let packages = discover(project.path(), &PkgSet::new()).unwrap();
    assert!(packages.contains("legacy"));

    let linter = Linter {
        exclude: vec!["legacy".to_string()],
        ..sh_linter("exit 0")
    };
    let ts = linter
        .build_taskset(&packages, project.path(), out.path(), None)
        .unwrap();
    let names: Vec<_> = ts.tasks().iter().map(|t| t.name()).collect();
    assert_eq!(names, ["api"]);
}

#[test]
fn test_failure_identifies_package_in_status() {
    let project = init_project(&["api", "broken"]);
    let out = TempDir::new().unwrap();
    let packages = discover(project.path(), &PkgSet::new()).unwrap();

    let linter = sh_linter(
        r#"if [ "$1" = ./broken/... ]; then echo "broken/lib.go:1: exported func lacks comment"; exit 1; fi"#,
    );
    let mut ts = linter
        .build_taskset(&packages, project.path(), out.path(), None)
        .unwrap();
    assert_eq!(ts.run(), Err(TaskSetError::Failed));

    let mut report = Vec::new();
    ts.write_status(&mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.contains("[lint]: package api completed: succeeded"));
    assert!(report.contains("[lint]: package broken completed: failed"));
    assert!(report.contains("broken/lib.go:1: exported func lacks comment"));
}

#[test]
fn test_timeout_from_config_is_enforced() {
    let project = init_project(&["slow"]);
    let out = TempDir::new().unwrap();
    let packages = discover(project.path(), &PkgSet::new()).unwrap();

    let linter = Linter {
        timeout: "1s".to_string(),
        ..sh_linter("sleep 30")
    };
    let mut ts = linter
        .build_taskset(&packages, project.path(), out.path(), None)
        .unwrap();
    assert!(ts.run().is_err());
    assert!(matches!(
        ts.tasks()[0].error(),
        Some(TaskError::TimedOut(_))
    ));
}

#[test]
fn test_bounded_parallelism_lints_everything() {
    let names = ["a", "b", "c", "d", "e"];
    let project = init_project(&names);
    let out = TempDir::new().unwrap();
    let packages = discover(project.path(), &PkgSet::new()).unwrap();

    sh_linter("exit 0")
        .execute(&packages, project.path(), out.path(), Some(2))
        .unwrap();
    for name in names {
        assert!(out.path().join(format!("{name}_lint.out")).exists());
    }
}
