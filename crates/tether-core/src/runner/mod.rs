//! External command execution.
//!
//! Everything this tool does to the outside world goes through one
//! [`CommandRunner`] seam: a spawned child process, awaited to completion,
//! with stdout and stderr captured into a single combined string. The
//! [`Exec`] wrapper layers the failure policy on top — log-and-fail,
//! fail silently, or hand a non-zero exit back to the caller for commands
//! whose exit status is a signal rather than an error.

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to spawn; bare names resolve via PATH
    pub program: String,
    /// Arguments passed verbatim
    pub args: Vec<String>,
    /// Payload written to the child's stdin before waiting, if any
    pub stdin: Option<String>,
}

impl Invocation {
    /// Create an invocation of `program` with the given arguments.
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    /// Attach a stdin payload, written to the child before waiting.
    #[must_use]
    pub fn with_stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Exit code, or -1 when the child was terminated by a signal
    pub exit_code: i32,
    /// Combined stdout/stderr output
    pub output: String,
}

impl Capture {
    /// Whether the command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns external commands and waits for their captured result.
///
/// Implementations return `Err` only when the child cannot be spawned or
/// awaited; a non-zero exit is a normal [`Capture`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn the command, wait for it to exit, and capture its output.
    async fn invoke(&self, invocation: &Invocation) -> Result<Capture>;
}

/// Production runner spawning real child processes via tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn invoke(&self, invocation: &Invocation) -> Result<Capture> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            command: invocation.to_string(),
            source,
        })?;

        if let Some(payload) = &invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(payload.as_bytes()).await?;
            }
            // stdin handle dropped here, closing the pipe
        }

        let output = child.wait_with_output().await?;

        let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
        merged.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Capture {
            exit_code: output.status.code().unwrap_or(-1),
            output: merged,
        })
    }
}

/// Failure-policy wrapper around a [`CommandRunner`].
#[derive(Clone)]
pub struct Exec {
    runner: Arc<dyn CommandRunner>,
}

impl Exec {
    /// Create an `Exec` over the given runner.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Create an `Exec` spawning real child processes.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    /// Run a command; a non-zero exit logs the command line and captured
    /// output, then fails with [`Error::CommandFailed`].
    pub async fn run(&self, invocation: Invocation) -> Result<String> {
        self.run_inner(invocation, true).await
    }

    /// Run a command; a non-zero exit fails without the log line. Used
    /// where the caller reports failure in its own terms.
    pub async fn run_quiet(&self, invocation: Invocation) -> Result<String> {
        self.run_inner(invocation, false).await
    }

    /// Run a command whose exit status is a signal, not an error: the
    /// capture is returned either way. Used for existence probes and for
    /// toggles that must tolerate "already in that state".
    pub async fn run_tolerant(&self, invocation: Invocation) -> Result<Capture> {
        let capture = self.runner.invoke(&invocation).await?;
        if !capture.success() {
            debug!(command = %invocation, code = capture.exit_code, "tolerated non-zero exit");
        }
        Ok(capture)
    }

    async fn run_inner(&self, invocation: Invocation, log_failure: bool) -> Result<String> {
        let capture = self.runner.invoke(&invocation).await?;
        if capture.success() {
            debug!(command = %invocation, "command succeeded");
            return Ok(capture.output);
        }

        if log_failure {
            error!(
                command = %invocation,
                code = capture.exit_code,
                output = %capture.output,
                "command failed"
            );
        }

        Err(Error::CommandFailed {
            command: invocation.to_string(),
            code: capture.exit_code,
            output: capture.output,
        })
    }
}

impl fmt::Debug for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exec").finish_non_exhaustive()
    }
}
