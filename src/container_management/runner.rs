//! Process execution seam between the workflows and the operating system.

use log::{debug, warn};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::container_management::command::ToolCommand;
use crate::container_management::types::{CommandOutput, Echo};
use crate::error_handling::types::ContainerError;

/// Runs a [`ToolCommand`] to completion and reports its exit code and output.
///
/// Implementations must not interpret the exit status; callers decide what
/// counts as failure.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, command: &ToolCommand, echo: Echo)
        -> Result<CommandOutput, ContainerError>;
}

/// Spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &ToolCommand,
        echo: Echo,
    ) -> Result<CommandOutput, ContainerError> {
        debug!("Running `{}`", command);

        let spawn_failed = |source: std::io::Error| ContainerError::SpawnFailed {
            command: command.to_string(),
            source,
        };

        let mut cmd = command.to_tokio();
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match echo {
            Echo::Silent => {
                let out = cmd.output().await.map_err(spawn_failed)?;
                CommandOutput {
                    code: out.status.code(),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                }
            }
            Echo::Terminal => {
                let mut child = cmd.spawn().map_err(spawn_failed)?;
                let stdout = child.stdout.take();
                let stderr = child.stderr.take();

                // Drain both pipes while waiting so a chatty child never blocks
                let (stdout, stderr, status) = tokio::join!(
                    tee(stdout, tokio::io::stdout()),
                    tee(stderr, tokio::io::stderr()),
                    child.wait()
                );
                let status = status.map_err(spawn_failed)?;
                CommandOutput {
                    code: status.code(),
                    stdout,
                    stderr,
                }
            }
        };

        debug!("`{}` finished with code {:?}", command, output.code);
        Ok(output)
    }
}

/// Copies `source` to `sink` as it arrives and returns everything read.
async fn tee<R, W>(source: Option<R>, mut sink: W) -> String
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(mut source) = source else {
        return String::new();
    };

    let mut captured = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                captured.extend_from_slice(&buf[..n]);
                if let Err(e) = sink.write_all(&buf[..n]).await {
                    debug!("Unable to mirror child output to terminal: {}", e);
                }
                if let Err(e) = sink.flush().await {
                    debug!("Unable to flush mirrored child output: {}", e);
                }
            }
            Err(e) => {
                warn!("Failed reading child output: {}", e);
                break;
            }
        }
    }
    String::from_utf8_lossy(&captured).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[tokio::test]
    async fn test_silent_run_captures_output() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&cmd, Echo::Silent).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_terminal_run_captures_while_streaming() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo streamed; echo warn >&2"]);
        let output = SystemRunner.run(&cmd, Echo::Terminal).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "streamed");
        assert_eq!(output.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let cmd = ToolCommand::new("/nonexistent/lxc-ls");
        match SystemRunner.run(&cmd, Echo::Silent).await {
            Err(ContainerError::SpawnFailed { command, .. }) => {
                assert_eq!(command, "/nonexistent/lxc-ls")
            }
            other => panic!("Expected SpawnFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tee_without_pipe_is_empty() {
        let captured = tee(None::<&[u8]>, tokio::io::sink()).await;
        assert!(captured.is_empty());
    }

    /// Accepts every write, fails every flush.
    struct UnflushableTerminal(Vec<u8>);

    impl AsyncWrite for UnflushableTerminal {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.0.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "terminal closed",
            )))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_tee_keeps_capturing_when_terminal_flush_fails() {
        let mut terminal = UnflushableTerminal(Vec::new());
        let captured = tee(Some(&b"line one\nline two\n"[..]), &mut terminal).await;
        assert_eq!(captured, "line one\nline two\n");
        assert_eq!(terminal.0, b"line one\nline two\n");
    }
}
