// setkit-aio/src/process.rs
use std::process::{ExitStatus, Stdio};

use setkit_common::error::{Result, SetkitError};
use setkit_common::CancelToken;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// How a process should be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Create the process directly from the executable path.
    Direct,
    /// Go through the platform's document/association launcher, which is what
    /// gives scripts their interpreter and installers their elevation prompt.
    ShellExecute,
}

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub program: String,
    /// Free-form argument string exactly as written in the catalog.
    pub args: String,
    pub wait: bool,
    pub capture: bool,
    pub mode: LaunchMode,
}

impl ProcessRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: String::new(),
            wait: true,
            capture: true,
            mode: LaunchMode::Direct,
        }
    }

    pub fn args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// Shell-execute requests never capture output.
    pub fn shell_execute(mut self) -> Self {
        self.mode = LaunchMode::ShellExecute;
        self.capture = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// `None` when the process was started without waiting.
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.status.map_or(true, |s| s.success())
    }

    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Splits a free-form argument string the way a POSIX shell would, falling
/// back to whitespace splitting for strings shlex rejects (unbalanced quotes).
pub fn split_args(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    shlex::split(trimmed)
        .unwrap_or_else(|| trimmed.split_whitespace().map(str::to_string).collect())
}

/// Splits `"program rest of args"` on the first run of whitespace.
pub fn split_command(command: &str) -> (String, String) {
    let trimmed = command.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((program, rest)) => (program.to_string(), rest.trim_start().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

fn build_command(request: &ProcessRequest) -> Command {
    let mut cmd = match request.mode {
        LaunchMode::Direct => {
            let mut cmd = Command::new(&request.program);
            push_args(&mut cmd, &request.args);
            cmd
        }
        LaunchMode::ShellExecute => shell_execute_command(request),
    };
    cmd.stdin(Stdio::null());
    if request.capture {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
    }
    // Only a process we wait on is owned by us; detached launches must outlive the handle.
    cmd.kill_on_drop(request.wait);
    cmd
}

#[cfg(windows)]
fn push_args(cmd: &mut Command, args: &str) {
    // Windows programs parse their own command line; pass it through untouched.
    if !args.trim().is_empty() {
        cmd.raw_arg(args);
    }
}

#[cfg(not(windows))]
fn push_args(cmd: &mut Command, args: &str) {
    cmd.args(split_args(args));
}

#[cfg(windows)]
fn shell_execute_command(request: &ProcessRequest) -> Command {
    let mut cmd = Command::new("cmd.exe");
    cmd.raw_arg("/C start \"\"");
    if request.wait {
        cmd.raw_arg("/WAIT");
    }
    cmd.raw_arg(format!("\"{}\"", request.program));
    if !request.args.trim().is_empty() {
        cmd.raw_arg(&request.args);
    }
    cmd
}

#[cfg(target_os = "macos")]
fn shell_execute_command(request: &ProcessRequest) -> Command {
    let mut cmd = Command::new("open");
    if request.wait {
        cmd.arg("-W");
    }
    cmd.arg(&request.program);
    let args = split_args(&request.args);
    if !args.is_empty() {
        cmd.arg("--args").args(args);
    }
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn shell_execute_command(request: &ProcessRequest) -> Command {
    // xdg-open returns immediately and never runs programs, so executables and
    // anything waited on are started directly.
    if request.wait || is_executable_file(&request.program) {
        let mut cmd = Command::new(&request.program);
        cmd.args(split_args(&request.args));
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(&request.program);
        cmd
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn is_executable_file(path: &str) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Runs an external process according to `request`.
///
/// Waited processes are killed if `cancel` fires before they exit. A non-zero
/// exit status is reported in the outcome, not as an error; only failing to
/// start (or cancellation) is an `Err`.
pub async fn run_process(request: &ProcessRequest, cancel: &CancelToken) -> Result<ProcessOutcome> {
    info!("Executing: \"{}\" {}", request.program, request.args);
    debug!(
        "Process request: mode={:?} wait={} capture={}",
        request.mode, request.wait, request.capture
    );

    let mut cmd = build_command(request);
    let child = cmd.spawn().map_err(|e| {
        error!("Failed to run process \"{}\": {}", request.program, e);
        SetkitError::CommandExecError(format!("Failed to start '{}': {}", request.program, e))
    })?;

    if !request.wait {
        debug!("Started \"{}\" without waiting (pid {:?})", request.program, child.id());
        return Ok(ProcessOutcome::default());
    }

    let output = tokio::select! {
        res = child.wait_with_output() => res.map_err(|e| {
            SetkitError::CommandExecError(format!("Failed waiting for '{}': {}", request.program, e))
        })?,
        _ = cancel.cancelled() => {
            warn!("Cancelled while waiting for \"{}\"; process killed.", request.program);
            return Err(SetkitError::Cancelled);
        }
    };

    let outcome = ProcessOutcome {
        status: Some(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    if !outcome.stdout.is_empty() {
        info!("Output: {}", outcome.stdout);
    }
    if !outcome.stderr.is_empty() {
        warn!("Error output: {}", outcome.stderr);
    }
    if outcome.success() {
        debug!("\"{}\" finished successfully.", request.program);
    } else {
        warn!(
            "\"{}\" exited with status {}",
            request.program, output.status
        );
    }
    Ok(outcome)
}
