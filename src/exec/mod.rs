// src/exec/mod.rs

//! Process supervision layer.
//!
//! - [`backend`] defines the `ProcessBackend` / `ChildProcess` traits the
//!   interpreter is written against, so tests can provide a fake child.
//! - [`child`] is the production backend: `tokio::process::Command` with
//!   piped stdio, a stdout reader task feeding a bounded channel, and a
//!   stderr drain task.

pub mod backend;
pub mod child;

pub use backend::{BoxFuture, ChildProcess, PollOutcome, ProcessBackend};
pub use child::{SupervisedChild, TokioBackend};
