//! Concurrent execution of a group of tasks

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::TaskSetError;
use super::notifier::CompletionToken;
use super::task::{Task, TaskCommand};

/// Lifecycle of a [`TaskSet`]. `run` is only legal from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Finished,
}

/// A named group of commands run in parallel and judged together.
///
/// Every task runs to completion even when others fail, so a single run
/// reports on all of them. The set succeeds only if every task does.
#[derive(Debug)]
pub struct TaskSet {
    name: String,
    out_dir: PathBuf,
    tasks: Vec<Task>,
    max_parallel: Option<usize>,
    timeout: Option<Duration>,
    notifier: Option<CompletionToken>,
    state: RunState,
}

impl TaskSet {
    /// Create an empty task set.
    ///
    /// `name` is the label of every task in the set and part of each output
    /// file name. If `notifier` is given it is completed once, when `run` finishes.
    ///
    /// Dropping a set that was never run also completes its notifier, so a
    /// waiter on the group is released rather than blocked forever. The
    /// waiter cannot tell that case from a finished run; check [`done`](Self::done)
    /// on the set itself if that matters.
    pub fn new(
        name: impl Into<String>,
        out_dir: impl Into<PathBuf>,
        notifier: Option<CompletionToken>,
    ) -> Self {
        Self {
            name: name.into(),
            out_dir: out_dir.into(),
            tasks: Vec::with_capacity(16),
            max_parallel: None,
            timeout: None,
            notifier,
            state: RunState::Pending,
        }
    }

    /// Bound the number of tasks running at once. `0` means unbounded.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = (max_parallel > 0).then_some(max_parallel);
        self
    }

    /// Kill any task still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a command under `name`. Must be called before [`run`](Self::run).
    ///
    /// Names must be unique within the set or the tasks' output files collide.
    pub fn add(&mut self, name: impl Into<String>, command: TaskCommand) {
        let name = name.into();
        if self.state != RunState::Pending {
            warn!(taskset = %self.name, task = %name, "ignoring task added after run");
            return;
        }
        self.tasks.push(Task::new(
            name,
            self.name.clone(),
            &self.out_dir,
            command,
            self.timeout,
        ));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether `run` has completed.
    pub fn done(&self) -> bool {
        self.state == RunState::Finished
    }

    /// Run every task in parallel and wait for all of them.
    ///
    /// Returns [`TaskSetError::Failed`] if any task failed, without saying
    /// which; use [`print_status`](Self::print_status) for details. A second
    /// call returns [`TaskSetError::AlreadyExecuted`] and runs nothing.
    pub fn run(&mut self) -> Result<(), TaskSetError> {
        if self.state != RunState::Pending {
            return Err(TaskSetError::AlreadyExecuted);
        }
        self.state = RunState::Running;

        let workers = self.worker_count();
        debug!(
            taskset = %self.name,
            tasks = self.tasks.len(),
            workers,
            "running taskset"
        );

        {
            let _finish = FinishGuard {
                state: &mut self.state,
                notifier: self.notifier.take(),
            };
            run_pool(&mut self.tasks, workers);
        }

        let failed = self.tasks.iter().filter(|t| !t.succeeded()).count();
        info!(
            taskset = %self.name,
            passed = self.tasks.len() - failed,
            failed,
            "taskset finished"
        );

        if failed == 0 {
            Ok(())
        } else {
            Err(TaskSetError::Failed)
        }
    }

    fn worker_count(&self) -> usize {
        match self.max_parallel {
            Some(limit) => limit.min(self.tasks.len()),
            None => self.tasks.len(),
        }
    }

    /// Print the status of every task, in the order they were added.
    pub fn print_status(&self) {
        for task in &self.tasks {
            task.print_status();
        }
    }

    pub fn write_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for task in &self.tasks {
            task.write_status(out)?;
        }
        Ok(())
    }
}

/// Marks the set finished and fires the notifier, even if a worker panicked.
struct FinishGuard<'a> {
    state: &'a mut RunState,
    notifier: Option<CompletionToken>,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        *self.state = RunState::Finished;
        if let Some(token) = self.notifier.take() {
            token.complete();
        }
    }
}

/// Run every task on a pool of `workers` threads and return once all are done.
///
/// Workers pull tasks from a shared queue until it is drained; the scope end
/// is the join barrier.
fn run_pool(tasks: &mut [Task], workers: usize) {
    if tasks.is_empty() || workers == 0 {
        return;
    }

    let (tx, rx) = mpsc::channel::<&mut Task>();
    for task in tasks.iter_mut() {
        // The receiver outlives this loop, so sending cannot fail.
        let _ = tx.send(task);
    }
    drop(tx);

    let queue = Mutex::new(rx);
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap_or_else(|e| e.into_inner()).recv();
                match next {
                    Ok(task) => task.run(),
                    Err(_) => break,
                }
            });
        }
    });
}
