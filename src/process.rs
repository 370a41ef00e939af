//! External process execution
//!
//! `ProcessHandle` owns one child process end to end: it builds the command
//! line, environment and working directory, spawns the process with piped
//! stdout/stderr, drains both pipes concurrently for the duration of the
//! wait (so the child can never deadlock on pipe back-pressure), applies an
//! optional wait timeout, and exposes the outcome plus the captured output.
//!
//! Both drain tasks are joined before `run()`, `wait()` or `kill()`
//! returns: no background activity is observable to callers afterwards.

use std::ffi::OsString;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::common::ExitCode;
use crate::results::TimeStats;

/// Handler invoked for each EOL-stripped output line.
pub type LineHandler = Box<dyn FnMut(&[u8]) + Send>;

/// Outcome of one process execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The process was never spawned (or spawning failed).
    NotStarted,
    /// The process did not terminate within the wait timeout.
    TimedOut,
    /// The process terminated with the given exit code.
    Completed(i32),
}

impl ProcessStatus {
    /// Exit code, when the process terminated.
    pub fn return_code(self) -> Option<i32> {
        match self {
            ProcessStatus::Completed(code) => Some(code),
            _ => None,
        }
    }

    /// Whether the process terminated with exit code 0.
    pub fn is_success(self) -> bool {
        self == ProcessStatus::Completed(0)
    }
}

/// One external process: command line, execution, captured output.
pub struct ProcessHandle {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
    stdout_handler: Option<LineHandler>,
    stderr_handler: Option<LineHandler>,
    exit_on_error: Option<ExitCode>,

    /// Execution outcome.
    pub status: ProcessStatus,
    /// Captured standard output, raw bytes in original order.
    pub stdout: Vec<u8>,
    /// Captured standard error, raw bytes in original order.
    pub stderr: Vec<u8>,
    /// Time statistics.
    pub time: TimeStats,

    child: Option<Child>,
    stdout_drain: Option<JoinHandle<Vec<u8>>>,
    stderr_drain: Option<JoinHandle<Vec<u8>>>,
}

impl ProcessHandle {
    /// New handle for the given program. Pure builder, no side effects
    /// until `run()` or `start()`.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            stdout_handler: None,
            stderr_handler: None,
            exit_on_error: None,
            status: ProcessStatus::NotStarted,
            stdout: Vec::new(),
            stderr: Vec::new(),
            time: TimeStats::default(),
            child: None,
            stdout_drain: None,
            stderr_drain: None,
        }
    }

    /// Append one command line argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several command line arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an extra environment variable, over the inherited environment.
    pub fn env(mut self, name: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Install a handler called on each stdout line (EOL stripped).
    pub fn on_stdout_line(mut self, handler: LineHandler) -> Self {
        self.stdout_handler = Some(handler);
        self
    }

    /// Install a handler called on each stderr line (EOL stripped).
    pub fn on_stderr_line(mut self, handler: LineHandler) -> Self {
        self.stderr_handler = Some(handler);
        self
    }

    /// Terminate the *calling* process with the given exit code on any
    /// abnormal outcome (spawn failure, timeout, non-zero exit).
    ///
    /// For top-level command wrappers only; the campaign orchestrator never
    /// sets this, since it must survive individual case failures.
    pub fn exit_on_error(mut self, code: ExitCode) -> Self {
        self.exit_on_error = Some(code);
        self
    }

    /// Run the process to completion or cancellation.
    ///
    /// Blocks (asynchronously) up to `timeout`; `None` waits indefinitely.
    /// On timeout the process is force-killed and both drains are joined
    /// before returning. On spawn failure the drains never start.
    pub async fn run(&mut self, timeout: Option<Duration>) -> ProcessStatus {
        self.start().await;
        if self.child.is_none() {
            return self.status;
        }

        if self.wait(timeout).await == ProcessStatus::TimedOut {
            self.kill().await;
            self.abort_on_error(&format!("{self}: timeout"));
        }
        self.status
    }

    /// Launch the process without waiting for it.
    ///
    /// Use `wait()` or `kill()` afterwards. On spawn failure the status
    /// stays `NotStarted` and no drain is running.
    pub async fn start(&mut self) {
        tracing::debug!("Executing {}", self);
        self.time.set_start_time();
        self.status = ProcessStatus::NotStarted;
        self.stdout.clear();
        self.stderr.clear();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (name, value) in &self.env {
            command.env(name, value);
        }
        if let Some(cwd) = &self.cwd {
            tracing::debug!("  cwd: '{}'", cwd.display());
            command.current_dir(cwd);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.time.set_end_time();
                self.abort_on_error(&format!("Error while executing {self}: {err}"));
                return;
            }
        };

        match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => {
                self.stdout_drain = Some(tokio::spawn(drain(
                    stdout,
                    "stdout",
                    self.stdout_handler.take(),
                )));
                self.stderr_drain = Some(tokio::spawn(drain(
                    stderr,
                    "stderr",
                    self.stderr_handler.take(),
                )));
                self.child = Some(child);
            }
            _ => {
                // Pipes were requested at spawn; not getting them back is a
                // runtime defect, treated like a spawn failure.
                self.time.set_end_time();
                self.abort_on_error(&format!("{self}: no stdio pipes"));
            }
        }
    }

    /// Wait for the process to terminate.
    ///
    /// On timeout, reports `TimedOut` without killing the process: the
    /// caller decides. On termination, both drains are joined so the
    /// captured buffers are final.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> ProcessStatus {
        let Some(child) = self.child.as_mut() else {
            return self.status;
        };

        if let Some(limit) = timeout {
            tracing::debug!(
                "Waiting for {} to terminate within {:.3} seconds",
                display_program(&self.program),
                limit.as_secs_f64()
            );
        } else {
            tracing::debug!(
                "Waiting for {} to terminate...",
                display_program(&self.program)
            );
        }

        let waited = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    self.status = ProcessStatus::TimedOut;
                    return self.status;
                }
            },
            None => child.wait().await,
        };

        self.status = match waited {
            // Terminated by a signal on Unix: no exit code to report.
            Ok(exit_status) => ProcessStatus::Completed(exit_status.code().unwrap_or(-1)),
            Err(err) => {
                tracing::debug!("Wait failed for {}: {}", self, err);
                ProcessStatus::Completed(-1)
            }
        };
        self.time.set_end_time();
        self.child = None;
        self.join_drains().await;

        if !self.status.is_success() {
            self.abort_on_error(&format!(
                "{} failed: status={:?}, stderr={}",
                self,
                self.status,
                String::from_utf8_lossy(&self.stderr)
            ));
        }
        self.status
    }

    /// Force-terminate the process, then join both drains so the captured
    /// buffers are final and consistent.
    pub async fn kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(err) = child.kill().await {
                tracing::debug!("Failed to kill {}: {}", self, err);
            }
        }
        self.child = None;
        if self.time.start.is_some() && self.time.end.is_none() {
            self.time.set_end_time();
        }
        self.join_drains().await;
    }

    /// Whether the process is currently running.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn join_drains(&mut self) {
        if let Some(handle) = self.stdout_drain.take() {
            match handle.await {
                Ok(captured) => self.stdout = captured,
                Err(err) => tracing::error!("stdout drain failed: {}", err),
            }
        }
        if let Some(handle) = self.stderr_drain.take() {
            match handle.await {
                Ok(captured) => self.stderr = captured,
                Err(err) => tracing::error!("stderr drain failed: {}", err),
            }
        }
    }

    /// Log and terminate the calling process when the exit-on-error policy
    /// is active; no-op otherwise.
    fn abort_on_error(&self, message: &str) {
        if let Some(code) = self.exit_on_error {
            tracing::error!("{}", message);
            std::process::exit(code as i32);
        }
    }
}

impl std::fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut line = display_program(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if line.len() > 61 {
            // Truncation must land on a char boundary.
            let mut end = 61;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            line.truncate(end);
            line.push_str("...");
        }
        write!(f, "$({line})")
    }
}

fn display_program(program: &OsString) -> String {
    program.to_string_lossy().into_owned()
}

/// Drain one output pipe to EOF.
///
/// Appends raw bytes to the returned buffer, and hands each EOL-stripped
/// line to the handler when one is installed (any handler panic is caught
/// and logged); without a handler, lines are traced at debug level.
async fn drain<R>(stream: R, name: &'static str, mut handler: Option<LineHandler>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut captured = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                captured.extend_from_slice(&line);
                let stripped = strip_eol(&line);
                match handler.as_mut() {
                    Some(handler) => {
                        if catch_unwind(AssertUnwindSafe(|| handler(stripped))).is_err() {
                            tracing::error!(
                                "{} line handler panicked on {:?}",
                                name,
                                String::from_utf8_lossy(stripped)
                            );
                        }
                    }
                    None => {
                        tracing::debug!("  {}: {:?}", name, String::from_utf8_lossy(stripped))
                    }
                }
            }
            Err(err) => {
                tracing::debug!("{} read error: {}", name, err);
                break;
            }
        }
    }
    captured
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}
