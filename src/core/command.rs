//! Execution of the external device-management tool.
//!
//! [`CommandRunner`] is the seam between the collection pipeline and the
//! host: production code uses [`SystemRunner`], which spawns real processes
//! through `tokio::process`, while tests substitute call-counting stubs.

use std::{
    env,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, trace};

/// Failures of a single external command invocation.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Cannot find '{command}' in PATH")]
    ExecutableNotFound { command: String },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' failed ({status}): {output}")]
    ExecutionFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Invalid JSON output from '{command}': {output}")]
    InvalidOutput { command: String, output: String },

    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Runs external commands and captures their output.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` with `args` and returns its combined output.
    ///
    /// The two streams are not interleaved: all of stdout comes first and
    /// stderr is appended after it. A non-zero exit carries the same combined
    /// text in [`CommandError::ExecutionFailed`].
    async fn run(&self, command: &str, args: &[&str]) -> Result<String, CommandError>;

    /// Like [`run`](Self::run), but also requires the output to be valid JSON.
    async fn run_json(&self, command: &str, args: &[&str]) -> Result<Value, CommandError> {
        let output = self.run(command, args).await?;
        serde_json::from_str(&output).map_err(|e| {
            trace!("JSON parse error for '{}': {}", command_line(command, args), e);
            CommandError::InvalidOutput {
                command: command_line(command, args),
                output,
            }
        })
    }
}

/// Joins a command and its arguments for log and error messages.
pub fn command_line(command: &str, args: &[&str]) -> String {
    std::iter::once(command)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves `command` to an executable file.
///
/// Names containing a `/` are checked as paths; anything else is searched
/// for in the directories of `PATH`.
pub fn lookup(command: &str) -> Result<PathBuf, CommandError> {
    let not_found = || CommandError::ExecutableNotFound {
        command: command.to_string(),
    };

    if command.contains('/') {
        let path = Path::new(command);
        return is_executable(path)
            .then(|| path.to_path_buf())
            .ok_or_else(not_found);
    }

    let paths = env::var_os("PATH").ok_or_else(not_found)?;
    env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// [`CommandRunner`] backed by real child processes.
///
/// Every invocation is bounded by `timeout`; a child still running when
/// the timeout expires is killed.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &str, args: &[&str]) -> Result<String, CommandError> {
        let executable = lookup(command)?;
        let cmdline = command_line(command, args);
        debug!("Running '{}'", cmdline);

        let child = Command::new(&executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| CommandError::Timeout {
                command: cmdline.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| CommandError::Spawn {
                command: cmdline.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(CommandError::ExecutionFailed {
                command: cmdline,
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(combined)
    }
}
