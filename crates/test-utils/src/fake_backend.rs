use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tester::engine::Environment;
use tester::exec::{BoxFuture, ChildProcess, PollOutcome, ProcessBackend};

/// Everything the fake backend observed, shared with the test.
#[derive(Debug, Default)]
pub struct FakeLog {
    /// Environment snapshot passed to each start, in order.
    pub starts: Vec<Environment>,
    /// Lines received by each child, indexed like `starts`.
    pub received: Vec<Vec<String>>,
    pub teardowns: usize,
    /// Every `poll_line` result, across all children, in order.
    pub polls: Vec<PollOutcome>,
    /// Children currently started and not torn down.
    pub live: usize,
    /// Highest value `live` ever reached.
    pub max_live: usize,
}

pub type SharedLog = Arc<Mutex<FakeLog>>;

/// A backend whose children behave like `cat`:
/// every line sent comes straight back as output.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    log: SharedLog,
    fail_spawn: bool,
    accept_lines: Option<usize>,
    echo: bool,
    close_stdout_after: Option<usize>,
    exit_after_output: Option<usize>,
}

impl FakeBackend {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            fail_spawn: false,
            accept_lines: None,
            echo: true,
            close_stdout_after: None,
            exit_after_output: None,
        }
    }

    /// Every `start` fails with `NotFound`.
    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// Children "exit" after accepting `n` lines; later sends fail.
    pub fn accept_lines(mut self, n: usize) -> Self {
        self.accept_lines = Some(n);
        self
    }

    /// Children never print anything.
    pub fn silent(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Children close stdout once they have printed `n` lines.
    pub fn close_stdout_after(mut self, n: usize) -> Self {
        self.close_stdout_after = Some(n);
        self
    }

    /// Children exit once they have printed `n` lines.
    pub fn exit_after_output(mut self, n: usize) -> Self {
        self.exit_after_output = Some(n);
        self
    }
}

impl ProcessBackend for FakeBackend {
    type Child = FakeChild;

    fn program(&self) -> &str {
        "fake-cat"
    }

    fn start(&mut self, env: &Environment) -> io::Result<FakeChild> {
        if self.fail_spawn {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }

        let mut log = self.log.lock().unwrap();
        log.starts.push(env.clone());
        log.received.push(Vec::new());
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        let index = log.starts.len() - 1;

        Ok(FakeChild {
            index,
            log: Arc::clone(&self.log),
            pending: VecDeque::new(),
            remaining: self.accept_lines,
            echo: self.echo,
            printed: 0,
            close_stdout_after: self.close_stdout_after,
            exit_after_output: self.exit_after_output,
            torn_down: false,
        })
    }
}

#[derive(Debug)]
pub struct FakeChild {
    index: usize,
    log: SharedLog,
    pending: VecDeque<String>,
    remaining: Option<usize>,
    echo: bool,
    printed: usize,
    close_stdout_after: Option<usize>,
    exit_after_output: Option<usize>,
    torn_down: bool,
}

impl FakeChild {
    fn exited(&self) -> bool {
        self.torn_down || self.exit_after_output.is_some_and(|n| self.printed >= n)
    }

    fn next_output(&mut self) -> PollOutcome {
        if self.close_stdout_after.is_some_and(|n| self.printed >= n) {
            return PollOutcome::EndOfStream;
        }
        match self.pending.pop_front() {
            Some(line) => {
                self.printed += 1;
                PollOutcome::Line(line)
            }
            None => PollOutcome::Timeout,
        }
    }
}

impl ChildProcess for FakeChild {
    fn send<'a>(&'a mut self, line: &'a str) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            if self.exited() || self.remaining == Some(0) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
            }
            if let Some(n) = self.remaining.as_mut() {
                *n -= 1;
            }

            self.log.lock().unwrap().received[self.index].push(line.to_string());
            if self.echo {
                self.pending.push_back(line.to_string());
            }
            Ok(())
        })
    }

    fn poll_line(&mut self, _timeout: Duration) -> BoxFuture<'_, PollOutcome> {
        Box::pin(async move {
            let outcome = self.next_output();
            self.log.lock().unwrap().polls.push(outcome.clone());
            outcome
        })
    }

    fn has_exited(&mut self) -> bool {
        self.exited()
    }

    fn teardown(&mut self) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(async move {
            if !self.torn_down {
                self.torn_down = true;
                let mut log = self.log.lock().unwrap();
                log.live -= 1;
                log.teardowns += 1;
            }
            Ok(())
        })
    }
}
