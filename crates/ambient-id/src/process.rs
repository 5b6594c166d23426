//! Subprocess execution for CLI-agent providers

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

/// Captured result of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Whether the process exited successfully
    pub success: bool,
    /// Captured standard output, lossily decoded as UTF-8
    pub stdout: String,
}

impl CommandOutput {
    /// A successful exit with the given output
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
        }
    }

    /// A failed exit with the given code and output
    pub fn failure(code: i32, stdout: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: stdout.into(),
        }
    }
}

/// Future returned by [`CommandRunner::run`]
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = io::Result<CommandOutput>> + Send + 'a>>;

/// Runs a program and captures its standard output
///
/// A non-zero exit is not an error: it is reported through
/// [`CommandOutput::success`]. Errors are reserved for failing to start the
/// process and for exceeding `timeout`, which yields
/// [`io::ErrorKind::TimedOut`].
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, waiting at most `timeout`
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
        timeout: Duration,
    ) -> CommandFuture<'a>;
}

/// Runs commands with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
        timeout: Duration,
    ) -> CommandFuture<'a> {
        Box::pin(run_command(program, args, timeout))
    }
}

async fn run_command(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> io::Result<CommandOutput> {
    let child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    // Dropping the pending future on timeout kills the child.
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} did not finish within {:?}", program.display(), timeout),
            )
        })??;

    Ok(CommandOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}
