//! Error types for task execution

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Aggregate result of running a task set.
///
/// Deliberately carries no per-task detail: callers that need to know which
/// task failed print the set's status report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskSetError {
    #[error("taskset already executed")]
    AlreadyExecuted,

    #[error("taskset failed")]
    Failed,
}

/// Terminal error recorded on a single task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The stdout/stderr capture file could not be created. The command was never started.
    #[error("failed to create output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),

    #[error("command exited with {0}")]
    Exit(ExitStatus),

    #[error("command killed after {0:?} timeout")]
    TimedOut(Duration),
}
