//! Command Runner
//!
//! Runs external build tools (`zipalign`, `apksigner`) with captured output,
//! a hard timeout and extra environment variables. Secrets are handed to
//! tools through the environment so they never appear in argument lists or
//! logs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Command runner configuration
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Kill the process after this long
    pub timeout: Duration,
    /// Working directory
    pub working_directory: Option<PathBuf>,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            working_directory: None,
        }
    }
}

/// Result of running a command
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code if the process exited normally
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last non-empty line of stderr (or stdout), for error messages
    pub fn summary(&self) -> String {
        [&self.stderr, &self.stdout]
            .iter()
            .flat_map(|s| s.lines().rev())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no output")
            .to_string()
    }
}

/// Command runner errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Binary '{0}' not found. Install it or add it to PATH.")]
    BinaryNotFound(String),

    #[error("Failed to launch {binary}: {source}")]
    LaunchFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} timed out after {}s", .timeout.as_secs())]
    TimedOut { binary: String, timeout: Duration },

    #[error("{binary} exited with {}: {summary}", display_code(.exit_code))]
    Failed {
        binary: String,
        exit_code: Option<i32>,
        summary: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| format!("code {}", c)).unwrap_or_else(|| "a signal".to_string())
}

/// Command runner for external tools
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    /// Environment variables to add
    env_additions: HashMap<String, String>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_additions.insert(key.into(), value.into());
        self
    }

    /// Find a binary in PATH
    pub fn which(binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }

    /// Resolve `binary` as a path if it exists, otherwise through PATH
    pub fn resolve(binary: &str) -> Result<PathBuf, CommandError> {
        let path = Path::new(binary);
        if path.components().count() > 1 && path.exists() {
            return Ok(path.to_path_buf());
        }
        Self::which(binary).ok_or_else(|| CommandError::BinaryNotFound(binary.to_string()))
    }

    /// Run a command to completion and capture its output.
    ///
    /// A non-zero exit is not an error here; use [`CommandRunner::run_checked`]
    /// for that.
    pub async fn run<S: AsRef<str>>(
        &self,
        binary: &str,
        args: &[S],
        options: &CommandOptions,
    ) -> Result<CommandResult, CommandError> {
        let binary_path = Self::resolve(binary)?;
        tracing::debug!(
            "Running {} {}",
            binary_path.display(),
            args.iter().map(|a| a.as_ref()).collect::<Vec<_>>().join(" ")
        );

        let mut cmd = Command::new(&binary_path);
        cmd.args(args.iter().map(|a| a.as_ref()))
            .envs(&self.env_additions)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &options.working_directory {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let child = cmd.spawn().map_err(|source| CommandError::LaunchFailed {
            binary: binary.to_string(),
            source,
        })?;

        let output = match tokio::time::timeout(options.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(CommandError::LaunchFailed {
                    binary: binary.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(CommandError::TimedOut {
                    binary: binary.to_string(),
                    timeout: options.timeout,
                })
            }
        };

        let result = CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            elapsed: start.elapsed(),
        };
        tracing::debug!("{} finished with {:?} in {:?}", binary, result.exit_code, result.elapsed);
        Ok(result)
    }

    /// Like [`CommandRunner::run`], but a non-zero exit is an error
    pub async fn run_checked<S: AsRef<str>>(
        &self,
        binary: &str,
        args: &[S],
        options: &CommandOptions,
    ) -> Result<CommandResult, CommandError> {
        let result = self.run(binary, args, options).await?;
        if result.success() {
            Ok(result)
        } else {
            Err(CommandError::Failed {
                binary: binary.to_string(),
                exit_code: result.exit_code,
                summary: result.summary(),
            })
        }
    }
}
