// src/exec/child.rs

//! Real process backend built on `tokio::process`.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RunOptions;
use crate::engine::Environment;
use crate::exec::backend::{BoxFuture, ChildProcess, PollOutcome, ProcessBackend};

/// Lines buffered between the stdout reader task and `poll_line`.
const STDOUT_CHANNEL_CAPACITY: usize = 64;

/// Spawns `program [args...]` with piped stdio.
#[derive(Debug, Clone)]
pub struct TokioBackend {
    program: String,
    args: Vec<String>,
    teardown_timeout: Option<Duration>,
}

impl TokioBackend {
    pub fn new(program: impl Into<String>, options: &RunOptions) -> Self {
        Self {
            program: program.into(),
            args: options.program_args.clone(),
            teardown_timeout: options.teardown_timeout,
        }
    }
}

impl ProcessBackend for TokioBackend {
    type Child = SupervisedChild;

    fn program(&self) -> &str {
        &self.program
    }

    fn start(&mut self, env: &Environment) -> io::Result<SupervisedChild> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let pid = child.id();

        let stdin = child.stdin.take();
        let (tx, rx) = mpsc::channel::<String>(STDOUT_CHANNEL_CAPACITY);
        let stdout_task = child.stdout.take().map(|out| spawn_stdout_reader(pid, out, tx));
        let stderr_task = child.stderr.take().map(|err| spawn_stderr_drain(pid, err));

        info!(
            program = %self.program,
            pid = ?pid,
            vars = env.len(),
            "started child process"
        );

        Ok(SupervisedChild {
            child,
            pid,
            stdin,
            stdout_rx: Some(rx),
            stdout_task,
            stderr_task,
            teardown_timeout: self.teardown_timeout,
            reaped: false,
        })
    }
}

/// Forward stdout lines into the channel, in the order the child wrote them.
///
/// Lines that are not valid UTF-8 are decoded lossily so one bad byte never
/// stops the echo. Dropping the sender at the end signals end-of-stream to
/// `poll_line`.
fn spawn_stdout_reader(
    pid: Option<u32>,
    stdout: ChildStdout,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            match read_text_line(&mut reader, &mut buf).await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        pid = ?pid,
                        error = %e,
                        "stdout read failed; no further output will be echoed"
                    );
                    break;
                }
            }
        }
        debug!(pid = ?pid, "stdout reader ended");
    })
}

/// Always consume stderr so the child never blocks on a full pipe; log at debug.
fn spawn_stderr_drain(pid: Option<u32>, stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        while let Ok(Some(line)) = read_text_line(&mut reader, &mut buf).await {
            debug!(pid = ?pid, "stderr: {}", line);
        }
    })
}

/// Read one `\n`-terminated line, dropping the `\n` / `\r\n` terminator.
///
/// Returns `None` at end of stream. A final line without a terminator is
/// still returned.
pub async fn read_text_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// A child started by [`TokioBackend`].
///
/// Dropping it closes every pipe; only [`ChildProcess::teardown`] reaps the
/// process.
#[derive(Debug)]
pub struct SupervisedChild {
    child: Child,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdout_rx: Option<mpsc::Receiver<String>>,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
    teardown_timeout: Option<Duration>,
    reaped: bool,
}

impl SupervisedChild {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn close_pipes(&mut self) {
        drop(self.stdin.take());

        if let Some(task) = self.stdout_task.take() {
            task.abort();
        }
        drop(self.stdout_rx.take());

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }

    async fn reap(&mut self) -> io::Result<()> {
        let status = match self.teardown_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!(
                        pid = ?self.pid,
                        timeout_ms = limit.as_millis() as u64,
                        "child did not exit after its pipes closed; killing it"
                    );
                    self.child.kill().await?;
                    self.child.wait().await?
                }
            },
            None => self.child.wait().await?,
        };

        info!(
            pid = ?self.pid,
            exit_code = ?status.code(),
            success = status.success(),
            "child process exited"
        );
        Ok(())
    }
}

impl ChildProcess for SupervisedChild {
    fn send<'a>(&'a mut self, line: &'a str) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let stdin = self.stdin.as_mut().ok_or_else(|| {
                io::Error::new(io::ErrorKind::BrokenPipe, "child stdin is closed")
            })?;

            let mut buf = String::with_capacity(line.len() + 1);
            buf.push_str(line);
            buf.push('\n');

            stdin.write_all(buf.as_bytes()).await?;
            stdin.flush().await
        })
    }

    fn poll_line(&mut self, timeout: Duration) -> BoxFuture<'_, PollOutcome> {
        Box::pin(async move {
            let Some(rx) = self.stdout_rx.as_mut() else {
                return PollOutcome::EndOfStream;
            };

            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(line)) => PollOutcome::Line(line),
                Ok(None) => PollOutcome::EndOfStream,
                Err(_) => PollOutcome::Timeout,
            }
        })
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    fn teardown(&mut self) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(async move {
            self.close_pipes();
            if self.reaped {
                return Ok(());
            }
            self.reap().await?;
            self.reaped = true;
            Ok(())
        })
    }
}

impl Drop for SupervisedChild {
    fn drop(&mut self) {
        self.close_pipes();
    }
}
