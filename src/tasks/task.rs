//! A single external command with captured output

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::error::TaskError;

/// Program, arguments and working directory of a task's command.
///
/// Kept as plain data rather than a `std::process::Command` so the command
/// line can be rendered for logs and the process built fresh when the task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl TaskCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Convenience for `sh -c <script>`.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Shell-quoted rendering of the command, for display only.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| shell_escape::escape(Cow::Borrowed(part.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the process. On Unix it leads its own process group so a
    /// timeout kill also reaches anything it spawned.
    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// File stem shared by a task's `.out` and `.err` files.
///
/// Tasks with an empty name (the root package) use the label alone.
pub fn output_stem(name: &str, label: &str) -> String {
    if name.is_empty() {
        label.to_string()
    } else {
        format!("{name}_{label}")
    }
}

/// One command run by a [`TaskSet`](super::TaskSet).
///
/// Created by `TaskSet::add`, run exactly once by a worker during
/// `TaskSet::run`, and read-only afterwards.
#[derive(Debug)]
pub struct Task {
    name: String,
    label: String,
    command: TaskCommand,
    timeout: Option<Duration>,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    exit_status: Option<ExitStatus>,
    error: Option<TaskError>,
}

impl Task {
    pub(crate) fn new(
        name: String,
        label: String,
        out_dir: &Path,
        command: TaskCommand,
        timeout: Option<Duration>,
    ) -> Self {
        let stem = output_stem(&name, &label);
        Self {
            stdout_path: out_dir.join(format!("{stem}.out")),
            stderr_path: out_dir.join(format!("{stem}.err")),
            name,
            label,
            command,
            timeout,
            exit_status: None,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as shown in status text; the root package is `.`.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "."
        } else {
            &self.name
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn command(&self) -> &TaskCommand {
        &self.command
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    /// Terminal error, `None` until the task has run or if it succeeded.
    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_ref()
    }

    /// Exit status of the process, `None` if it never ran to completion.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// True only if the process ran and exited successfully.
    ///
    /// A task with no recorded exit status counts as failed.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.exit_status.is_some_and(|s| s.success())
    }

    /// Run the command to completion with output redirected to the task's files.
    ///
    /// Never returns an error; the outcome is recorded on the task.
    pub fn run(&mut self) {
        let start = Instant::now();
        debug!(
            task = %self.display_name(),
            label = %self.label,
            command = %self.command.command_line(),
            "starting task"
        );

        let result = self.execute();
        let elapsed = start.elapsed();

        match result {
            Ok(status) => {
                self.exit_status = Some(status);
                if !status.success() {
                    self.error = Some(TaskError::Exit(status));
                }
            }
            Err(e) => self.error = Some(e),
        }

        debug!(
            task = %self.display_name(),
            label = %self.label,
            succeeded = self.succeeded(),
            elapsed_ms = elapsed.as_millis() as u64,
            "task finished"
        );
    }

    fn execute(&self) -> Result<ExitStatus, TaskError> {
        let stdout = create_output_file(&self.stdout_path)?;
        let stderr = create_output_file(&self.stderr_path)?;

        // Kept so a timeout note can be appended after the child is gone.
        let mut stderr_note = stderr.try_clone().ok();

        let mut child = self
            .command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| TaskError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(TaskError::Wait);
        };

        match child.wait_timeout(timeout).map_err(TaskError::Wait)? {
            Some(status) => Ok(status),
            None => {
                warn!(
                    task = %self.display_name(),
                    label = %self.label,
                    timeout = ?timeout,
                    "task timed out, killing"
                );
                kill_child_process(&mut child);
                if let Some(file) = stderr_note.as_mut() {
                    let _ = writeln!(file, "\n[Process killed after {timeout:?} timeout]");
                }
                Err(TaskError::TimedOut(timeout))
            }
        }
    }

    /// Print this task's status report to stdout.
    pub fn print_status(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let _ = self.write_status(&mut out);
    }

    /// Write this task's status report.
    ///
    /// A failed task also dumps its captured stdout and stderr between markers.
    /// Capture files that cannot be read are skipped.
    pub fn write_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.succeeded() {
            return writeln!(out, "{}", self.message("completed: succeeded"));
        }

        writeln!(out, "{}", self.message("completed: failed"))?;
        writeln!(out, "{}", self.message("===stdout begin==="))?;
        dump_file(&self.stdout_path, out)?;
        writeln!(out, "{}", self.message("===stdout end==="))?;

        writeln!(out, "{}", self.message("===stderr begin==="))?;
        dump_file(&self.stderr_path, out)?;
        writeln!(out, "{}", self.message("===stderr end==="))
    }

    fn message(&self, text: &str) -> String {
        format!(
            "[{}]: package {} {}",
            self.label,
            self.display_name(),
            text
        )
    }
}

fn create_output_file(path: &Path) -> Result<File, TaskError> {
    File::create(path).map_err(|source| TaskError::OutputFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy a capture file into `out`, ending on a newline so the closing marker
/// starts its own line.
fn dump_file<W: Write>(path: &Path, out: &mut W) -> io::Result<()> {
    let Ok(content) = fs::read(path) else {
        return Ok(());
    };
    out.write_all(&content)?;
    if !content.is_empty() && !content.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Kill a child and its whole process group, then reap it.
///
/// Errors are ignored since the processes may already have exited.
fn kill_child_process(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
