//! gdb process client
//!
//! Spawns gdb in quiet text mode and turns its interactive prompt into a
//! blocking request/response channel.

use std::os::fd::OwnedFd;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{Error, Result};

use super::codec::{self, PromptFramer};
use super::transcript::Transcript;
use super::DebuggerIo;

/// Live gdb session
pub struct GdbClient {
    /// Debugger subprocess
    child: Child,
    /// Buffered writer for debugger stdin
    writer: BufWriter<ChildStdin>,
    /// Raw output chunks from the merged stdout/stderr pipe
    output_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Splits output at prompt markers
    framer: PromptFramer,
    /// Bound on each wait for the prompt
    timeout: Duration,
    /// Optional durable log of the session
    transcript: Option<Transcript>,
    /// Launch command line, for reporting
    cmdline: String,
}

impl GdbClient {
    /// Launch gdb against `program` and wait for its first prompt
    ///
    /// The configured setup commands are sent before returning.
    pub async fn spawn(
        config: &Config,
        program: &Path,
        args: &[String],
        transcript: Option<Transcript>,
    ) -> Result<Self> {
        let gdb_path = config.debugger_path()?;

        let mut launch_args: Vec<String> = config.debugger.args.clone();
        launch_args.extend(["-q", "-nx", "--args"].map(String::from));
        launch_args.push(program.to_string_lossy().into_owned());
        launch_args.extend(args.iter().cloned());

        let cmdline = std::iter::once(gdb_path.display().to_string())
            .chain(launch_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(cmdline = %cmdline, "Launching debugger");

        // stdout and stderr share one pipe so gdb's error notices stay in
        // order with the prompt that follows them
        let (output, output_writer) = std::io::pipe().map_err(|e| {
            Error::DebuggerStartFailed(format!("Failed to create output pipe: {e}"))
        })?;
        let stderr_writer = output_writer.try_clone().map_err(|e| {
            Error::DebuggerStartFailed(format!("Failed to create output pipe: {e}"))
        })?;

        // The command holds the parent's copies of the write end; it must be
        // dropped before reading or EOF never arrives
        let mut child = {
            let mut command = Command::new(&gdb_path);
            command
                .args(&launch_args)
                .stdin(Stdio::piped())
                .stdout(output_writer)
                .stderr(stderr_writer)
                .kill_on_drop(true);
            command.spawn().map_err(|e| {
                Error::DebuggerStartFailed(format!("Failed to start {}: {}", gdb_path.display(), e))
            })?
        };

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::DebuggerStartFailed("Failed to get debugger stdin".to_string()))?;
        let output = pipe::Receiver::from_owned_fd(OwnedFd::from(output)).map_err(|e| {
            Error::DebuggerStartFailed(format!("Failed to read debugger output: {e}"))
        })?;

        let (tx, output_rx) = mpsc::unbounded_channel();
        tokio::spawn(codec::pump(output, tx));

        let mut client = Self {
            child,
            writer: BufWriter::new(stdin),
            output_rx,
            framer: PromptFramer::new(config.debugger.prompt.clone()),
            timeout: Duration::from_secs(config.timeouts.prompt_secs),
            transcript,
            cmdline,
        };

        let banner = client.wait_for_prompt().await?;
        tracing::debug!(banner = %banner.trim(), "Debugger ready");

        for setup in &config.session.setup_commands {
            client.command(setup).await?;
        }

        Ok(client)
    }

    /// Block until the prompt marker is seen, bounded by the timeout
    ///
    /// On timeout whatever partial output has arrived is drained into the
    /// error instead of being discarded.
    async fn wait_for_prompt(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(response) = self.framer.next_response() {
                return Ok(response);
            }

            match tokio::time::timeout_at(deadline, self.output_rx.recv()).await {
                Ok(Some(chunk)) => {
                    if let Some(transcript) = self.transcript.as_mut() {
                        transcript.record_output(&chunk);
                    }
                    self.framer.push(&chunk);
                }
                Ok(None) => {
                    return Err(Error::DebuggerExited {
                        partial: self.framer.drain(),
                    });
                }
                Err(_) => {
                    while let Ok(chunk) = self.output_rx.try_recv() {
                        if let Some(transcript) = self.transcript.as_mut() {
                            transcript.record_output(&chunk);
                        }
                        self.framer.push(&chunk);
                    }
                    return Err(Error::ProtocolTimeout {
                        secs: self.timeout.as_secs(),
                        partial: self.framer.drain(),
                    });
                }
            }
        }
    }

    /// Kill the target and ask the debugger to exit
    ///
    /// Best effort: the debugger may already be gone.
    pub async fn close(mut self) {
        for line in ["kill", "quit"] {
            if let Some(transcript) = self.transcript.as_mut() {
                transcript.record_command(line);
            }
            let sent = async {
                self.writer.write_all(format!("{line}\n").as_bytes()).await?;
                self.writer.flush().await
            }
            .await;
            if sent.is_err() {
                break;
            }
        }

        match tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "Debugger exited"),
            _ => {
                let _ = self.child.kill().await;
            }
        }
    }
}

#[async_trait]
impl DebuggerIo for GdbClient {
    async fn command(&mut self, text: &str) -> Result<String> {
        tracing::debug!(command = %text, "gdb >>>");
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record_command(text);
        }

        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let response = self.wait_for_prompt().await?;
        tracing::trace!(response = %response, "gdb <<<");
        Ok(response)
    }

    fn cmdline(&self) -> String {
        self.cmdline.clone()
    }
}
