//! Concurrent task execution
//!
//! A [`TaskSet`] owns a group of external commands, runs them all in
//! parallel, and reduces their outcomes to a single pass/fail result.
//!
//! # Output capture
//!
//! Each task writes its stdout and stderr to `{out_dir}/{name}_{label}.out`
//! and `.err` (`{label}.out` / `.err` for the root package), truncating any
//! previous run's files. The set's status report replays the captured output
//! of failed tasks.
//!
//! # Failure semantics
//!
//! - There is no fail-fast: every task runs to completion.
//! - A task fails if its output files cannot be created, if the command cannot
//!   be started, if it exits unsuccessfully, or if it exceeds the timeout.
//! - `run` reports only an aggregate failure; per-task detail lives on the
//!   tasks themselves.

mod error;
mod notifier;
mod task;
mod taskset;


pub use error::{TaskError, TaskSetError};
pub use notifier::{CompletionGroup, CompletionToken};
pub use task::{output_stem, Task, TaskCommand};
pub use taskset::{RunState, TaskSet};
