//! Builder for executing external tool commands with timeout and
//! cancellation support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use stickerforge_core::{Error, Result};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Default command timeout: 2 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// The child is killed if the returned future is dropped, so an abandoned
/// request never leaves a transcoder running.
///
/// # Example
///
/// ```no_run
/// use stickerforge_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> stickerforge_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .args(["-hide_banner", "-y", "-i", "in.webm", "-frames:v", "1", "out.png"])
///     .execute()
///     .await?;
/// println!("{}", output.stderr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::Transcode`] if spawning fails, the process times out, or it
    ///   exits with a non-zero status (message is the captured stderr, or a
    ///   generic description when stderr is empty).
    pub async fn execute(&self) -> Result<ToolOutput> {
        self.run(None).await
    }

    /// Like [`execute`](Self::execute), but returns [`Error::Cancelled`] as
    /// soon as `cancel` fires. The child process is killed in that case.
    pub async fn execute_cancellable(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        self.run(Some(cancel)).await
    }

    async fn run(&self, cancel: Option<&CancellationToken>) -> Result<ToolOutput> {
        let program_name = self.program_name();
        tracing::debug!(tool = %program_name, args = ?self.args, "spawning tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(program_name.clone())
            } else {
                Error::transcode(program_name.clone(), format!("failed to spawn: {e}"))
            }
        })?;

        let wait = tokio::time::timeout(self.timeout, child.wait_with_output());
        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(tool = %program_name, "tool cancelled");
                        return Err(Error::Cancelled);
                    }
                    r = wait => r,
                }
            }
            None => wait.await,
        };

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    let diagnostic = tool_output.stderr.trim();
                    let message = if diagnostic.is_empty() {
                        format!(
                            "exited with status {} and produced no diagnostic output",
                            output.status
                        )
                    } else {
                        format!("exited with status {}: {diagnostic}", output.status)
                    };
                    return Err(Error::transcode(program_name, message));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::transcode(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            // The child is owned by the dropped future; kill_on_drop reaps it.
            Err(_elapsed) => Err(Error::transcode(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}
