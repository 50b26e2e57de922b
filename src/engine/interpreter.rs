// src/engine/interpreter.rs

use std::fmt;
use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RunOptions;
use crate::engine::{CoreCommand, Environment, InterpreterCore};
use crate::errors::{Result, TesterError};
use crate::exec::{ChildProcess, PollOutcome, ProcessBackend};
use crate::script::{ScriptLine, ScriptReader};

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Script lines read, including comments and skipped lines.
    pub lines: usize,
    pub restarts: usize,
    /// Lines written to a child's stdin.
    pub sent: usize,
    /// Lines that had no live child to go to.
    pub dropped: usize,
    /// Child stdout lines copied to the transcript.
    pub echoed: usize,
    /// Malformed directives that were skipped.
    pub warnings: usize,
}

/// Runs a script against children started by `B`, writing the transcript
/// to `W`.
///
/// This is the IO shell around [`InterpreterCore`]. It owns at most one
/// child at a time; a RESTART fully tears down the previous child before
/// the next one is spawned.
pub struct Interpreter<B: ProcessBackend, W: Write> {
    core: InterpreterCore,
    backend: B,
    child: Option<B::Child>,
    out: W,
    poll_timeout: Duration,
    report: RunReport,
}

impl<B: ProcessBackend, W: Write> fmt::Debug for Interpreter<B, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("core", &self.core)
            .field("program", &self.backend.program())
            .field("child_live", &self.child.is_some())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend, W: Write> Interpreter<B, W> {
    pub fn new(backend: B, out: W, options: &RunOptions) -> Self {
        Self {
            core: InterpreterCore::new(),
            backend,
            child: None,
            out,
            poll_timeout: options.poll_timeout,
            report: RunReport::default(),
        }
    }

    pub fn env(&self) -> &Environment {
        self.core.env()
    }

    pub fn has_live_child(&self) -> bool {
        self.child.is_some()
    }

    pub fn report(&self) -> RunReport {
        self.report
    }

    /// Give back the transcript writer.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the whole script, top to bottom.
    ///
    /// Whatever happens, a live child is torn down before this returns.
    /// Fatal errors (spawn or write failures) stop the run; malformed
    /// directives are logged and skipped.
    pub async fn run(&mut self, mut script: ScriptReader) -> Result<RunReport> {
        info!(
            program = %self.backend.program(),
            base_dir = %script.base_dir().display(),
            "script run started"
        );

        let outcome = self.run_lines(&mut script).await;
        let cleanup = self.teardown_child().await;

        if let Err(err) = self.out.flush() {
            debug!(error = %err, "flushing transcript failed");
        }

        match (outcome, cleanup) {
            (Err(err), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(error = %cleanup_err, "teardown after failed run also failed");
                }
                Err(err)
            }
            (Ok(()), Err(cleanup_err)) => Err(TesterError::IoError(cleanup_err)),
            (Ok(()), Ok(())) => {
                info!(report = ?self.report, "script run finished");
                Ok(self.report)
            }
        }
    }

    async fn run_lines(&mut self, script: &mut ScriptReader) -> Result<()> {
        while let Some(line) = script.next_line().await? {
            self.report.lines += 1;
            let command = self.core.step(&line);
            self.execute(&line, command).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, line: &ScriptLine, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Nothing => {}
            CoreCommand::SkipMode(on) => {
                debug!(line = line.number, on, "skip mode changed");
                writeln!(self.out, "skip mode {}", if on { "on" } else { "off" })?;
            }
            CoreCommand::Restart(env) => self.restart(line, env).await?,
            CoreCommand::Send(text) => self.send(line, &text).await?,
            CoreCommand::Delay(duration) => {
                writeln!(self.out, "D: {:?}", duration.as_secs_f64())?;
                self.out.flush()?;
                debug!(line = line.number, ?duration, "delaying");
                tokio::time::sleep(duration).await;
            }
            CoreCommand::Malformed(reason) => {
                self.report.warnings += 1;
                let err = TesterError::ScriptFormat {
                    line: line.number,
                    reason,
                };
                warn!(text = %line.text, "{err}; skipping directive");
            }
        }
        Ok(())
    }

    async fn restart(&mut self, line: &ScriptLine, env: Environment) -> Result<()> {
        self.teardown_child().await?;

        let child = self
            .backend
            .start(&env)
            .map_err(|source| TesterError::Spawn {
                line: line.number,
                directive: line.text.clone(),
                program: self.backend.program().to_string(),
                source,
            })?;

        self.child = Some(child);
        self.report.restarts += 1;
        debug!(line = line.number, vars = env.len(), "child restarted");
        Ok(())
    }

    async fn send(&mut self, line: &ScriptLine, text: &str) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            self.report.dropped += 1;
            debug!(line = line.number, "no live child; dropping line");
            return Ok(());
        };

        writeln!(self.out, "> {text}")?;
        self.out.flush()?;

        child
            .send(text)
            .await
            .map_err(|source| TesterError::Write {
                line: line.number,
                directive: text.to_string(),
                source,
            })?;
        self.report.sent += 1;

        self.drain_output().await
    }

    /// Echo whatever the child prints, one line per poll, until a poll
    /// times out, stdout closes, or the child exits.
    async fn drain_output(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        loop {
            match child.poll_line(self.poll_timeout).await {
                PollOutcome::Line(output) => {
                    writeln!(self.out, "< {}", output.trim())?;
                    self.report.echoed += 1;
                    if child.has_exited() {
                        break;
                    }
                }
                PollOutcome::Timeout | PollOutcome::EndOfStream => break,
            }
        }

        self.out.flush()?;
        Ok(())
    }

    async fn teardown_child(&mut self) -> std::io::Result<()> {
        match self.child.take() {
            Some(mut child) => child.teardown().await,
            None => Ok(()),
        }
    }
}
