//! Full build: setup, config loading, discovery and lint

use std::fs;

use arnold::builder::{build, prepare, BuildOptions, Builder};

use super::helpers::{init_project, write_config};

fn options(root: &std::path::Path) -> BuildOptions {
    BuildOptions {
        config_file: root.join("build.yaml"),
        output_dir: root.join("build"),
        project_dir: root.to_path_buf(),
        max_parallel: None,
    }
}

#[test]
fn test_build_succeeds_when_every_package_passes() {
    let project = init_project(&["", "api"]);
    write_config(project.path(), "exit 0", "");

    build(&options(project.path())).unwrap();

    let out = project.path().join("build");
    assert!(out.join("lint.out").exists());
    assert!(out.join("api_lint.out").exists());
}

#[test]
fn test_build_fails_when_a_package_fails() {
    let project = init_project(&["api", "store"]);
    write_config(project.path(), r#"[ "$1" != ./store/... ]"#, "");

    let err = build(&options(project.path())).unwrap_err();
    assert_eq!(format!("{err:#}"), "lint failed: taskset failed");
}

#[test]
fn test_disabled_lint_builds_without_running() {
    let project = init_project(&["api"]);
    write_config(project.path(), "exit 1", "  disabled: true\n");

    build(&options(project.path())).unwrap();
    assert_eq!(
        fs::read_dir(project.path().join("build")).unwrap().count(),
        0
    );
}

#[test]
fn test_top_level_exclude_hides_package_from_lint() {
    let project = init_project(&["api", "generated"]);
    write_config(
        project.path(),
        r#"[ "$1" != ./generated/... ]"#,
        "exclude: [generated]\n",
    );

    build(&options(project.path())).unwrap();
    assert!(!project.path().join("build/generated_lint.out").exists());
}

#[test]
fn test_malformed_config_aborts_before_any_task() {
    let project = init_project(&["api"]);
    fs::write(project.path().join("build.yaml"), "lint: [not, a, map").unwrap();

    let opts = prepare(&options(project.path())).unwrap();
    let err = Builder::new(&opts).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    assert_eq!(fs::read_dir(&opts.output_dir).unwrap().count(), 0);
}

#[test]
fn test_build_clears_previous_output() {
    let project = init_project(&["api"]);
    write_config(project.path(), "exit 0", "");
    let out = project.path().join("build");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("removed_lint.out"), "old").unwrap();

    build(&options(project.path())).unwrap();
    assert!(!out.join("removed_lint.out").exists());
    assert!(out.join("api_lint.out").exists());
}
