// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The interpreter talks to a `ProcessBackend` instead of spawning
//! `tokio::process::Command`s itself, so tests can swap in a fake child
//! that never touches the OS.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use crate::engine::Environment;

/// Boxed future returned by the `ChildProcess` methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of waiting for one line of child output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A complete line (without its terminator).
    Line(String),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The child closed its stdout.
    EndOfStream,
}

/// Starts child processes.
pub trait ProcessBackend: Send {
    type Child: ChildProcess;

    /// Human-readable program name for diagnostics.
    fn program(&self) -> &str;

    /// Spawn a new child with exactly `env` as its environment.
    fn start(&mut self, env: &Environment) -> io::Result<Self::Child>;
}

/// A live child with piped stdin, stdout and stderr.
pub trait ChildProcess: Send {
    /// Write `line` plus a newline to stdin and flush.
    fn send<'a>(&'a mut self, line: &'a str) -> BoxFuture<'a, io::Result<()>>;

    /// Wait up to `timeout` for the next stdout line.
    fn poll_line(&mut self, timeout: Duration) -> BoxFuture<'_, PollOutcome>;

    /// Non-blocking check whether the process has already exited.
    fn has_exited(&mut self) -> bool;

    /// Close stdin, stdout and stderr (in that order) and reap the process.
    ///
    /// Calling this more than once is a no-op.
    fn teardown(&mut self) -> BoxFuture<'_, io::Result<()>>;
}
