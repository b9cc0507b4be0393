//! Integration tests for arnold
//!
//! These tests drive discovery, the lint target and the build driver end to
//! end against throwaway Go-shaped project trees, with `sh` standing in for
//! the real linter.

pub mod build_flow;
pub mod helpers;
pub mod lint_flow;
