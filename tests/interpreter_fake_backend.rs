// tests/interpreter_fake_backend.rs
mod common;
use crate::common::{ScriptBuilder, init_tracing, transcript, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tester::config::RunOptions;
use tester::engine::Interpreter;
use tester::errors::TesterError;
use tester::exec::PollOutcome;
use tester_test_utils::fake_backend::{FakeBackend, FakeLog, SharedLog};

type TestResult = Result<(), Box<dyn Error>>;

fn new_log() -> SharedLog {
    Arc::new(Mutex::new(FakeLog::default()))
}

fn interpreter(backend: FakeBackend) -> Interpreter<FakeBackend, Vec<u8>> {
    Interpreter::new(backend, Vec::new(), &RunOptions::default())
}

#[tokio::test]
async fn lines_without_restart_are_dropped() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new().line("hello").line("world").reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.dropped, 2);
    assert_eq!(report.sent, 0);
    assert!(log.lock().unwrap().starts.is_empty());
    assert_eq!(transcript(interp.into_output()), "");
    Ok(())
}

#[tokio::test]
async fn restart_splits_lines_between_children() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new()
        .line("before")
        .restart()
        .line("one")
        .line("two")
        .line("three")
        .restart()
        .line("four")
        .reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.restarts, 2);
    assert_eq!(report.sent, 4);
    assert_eq!(report.dropped, 1);

    let log = log.lock().unwrap();
    assert_eq!(log.received, vec![vec!["one", "two", "three"], vec!["four"]]);
    assert_eq!(log.max_live, 1, "two children were live at once");
    assert_eq!(log.live, 0, "child left running after the script ended");
    assert_eq!(log.teardowns, 2);
    Ok(())
}

#[tokio::test]
async fn transcript_shows_sent_and_echoed_lines() -> TestResult {
    init_tracing();
    let mut interp = interpreter(FakeBackend::new(new_log()));

    let script = ScriptBuilder::new()
        .restart()
        .env("X", "1")
        .line("hello")
        .delay(0.01)
        .restart()
        .line("world")
        .reader();
    let report = with_timeout(interp.run(script)).await?;
    assert_eq!(report.echoed, 2);

    assert_eq!(
        transcript(interp.into_output()),
        "> hello\n< hello\nD: 0.01\n> world\n< world\n"
    );
    Ok(())
}

#[tokio::test]
async fn env_snapshot_is_taken_at_restart() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new()
        .env("A", "first value")
        .restart()
        .env("B", "2")
        .restart()
        .env_clear()
        .env("C", "3")
        .restart()
        .reader();
    with_timeout(interp.run(script)).await?;

    let log = log.lock().unwrap();
    assert_eq!(log.starts.len(), 3);

    assert_eq!(log.starts[0].get("A"), Some("first value"));
    assert_eq!(log.starts[0].get("B"), None);

    assert_eq!(log.starts[1].get("A"), Some("first value"));
    assert_eq!(log.starts[1].get("B"), Some("2"));

    assert_eq!(log.starts[2].len(), 1);
    assert_eq!(log.starts[2].get("C"), Some("3"));
    Ok(())
}

#[tokio::test]
async fn skip_block_disables_everything_but_its_terminator() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new()
        .restart()
        .start_skip()
        .restart()
        .env("SKIPPED", "yes")
        .line("not sent")
        .line("ENV BROKEN")
        .line("DELAY forever")
        .end_skip()
        .line("sent")
        .reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.restarts, 1);
    assert_eq!(report.warnings, 0);
    assert!(interp.env().is_empty());

    let log = log.lock().unwrap();
    assert_eq!(log.received, vec![vec!["sent"]]);
    Ok(())
}

#[tokio::test]
async fn malformed_directives_are_skipped_with_a_warning() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new()
        .line("ENV ONLYONEFIELD")
        .line("DELAY soon")
        .restart()
        .line("still running")
        .reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.warnings, 2);
    assert_eq!(report.sent, 1);
    assert_eq!(log.lock().unwrap().received, vec![vec!["still running"]]);
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_fatal_and_names_the_line() {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()).failing_spawn());

    let script = ScriptBuilder::new()
        .comment("starts here")
        .restart()
        .line("never sent")
        .reader();

    match with_timeout(interp.run(script)).await {
        Err(TesterError::Spawn {
            line,
            directive,
            program,
            ..
        }) => {
            assert_eq!(line, 2);
            assert_eq!(directive, "RESTART");
            assert_eq!(program, "fake-cat");
        }
        other => panic!("expected Spawn error, got {other:?}"),
    }

    assert_eq!(interp.report().lines, 2);
}

#[tokio::test]
async fn write_failure_stops_the_run_and_tears_down_the_child() {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()).accept_lines(1));

    let script = ScriptBuilder::new()
        .restart()
        .line("accepted")
        .line("rejected")
        .line("never reached")
        .reader();

    let err = with_timeout(interp.run(script))
        .await
        .expect_err("writing to an exited child must fail");

    assert!(err.is_fatal());
    match err {
        TesterError::Write {
            line, directive, ..
        } => {
            assert_eq!(line, 3);
            assert_eq!(directive, "rejected");
        }
        other => panic!("expected Write error, got {other:?}"),
    }

    assert!(!interp.has_live_child());
    let log = log.lock().unwrap();
    assert_eq!(log.received, vec![vec!["accepted"]]);
    assert_eq!(log.live, 0);
}

#[tokio::test]
async fn silent_child_does_not_stall_the_run() -> TestResult {
    init_tracing();
    let mut interp = interpreter(FakeBackend::new(new_log()).silent());

    let script = ScriptBuilder::new()
        .restart()
        .line("a")
        .line("b")
        .reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.sent, 2);
    assert_eq!(report.echoed, 0);
    assert_eq!(transcript(interp.into_output()), "> a\n> b\n");
    Ok(())
}

#[tokio::test]
async fn skip_mode_changes_appear_in_the_transcript() -> TestResult {
    init_tracing();
    let mut interp = interpreter(FakeBackend::new(new_log()));

    let script = ScriptBuilder::new().start_skip().line("x").end_skip().reader();
    with_timeout(interp.run(script)).await?;

    assert_eq!(
        transcript(interp.into_output()),
        "skip mode on\nskip mode off\n"
    );
    Ok(())
}

#[tokio::test]
async fn drain_stops_at_end_of_stream() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()).close_stdout_after(1));

    let script = ScriptBuilder::new()
        .restart()
        .line("a")
        .line("b")
        .reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.sent, 2);
    assert_eq!(report.echoed, 1);
    assert_eq!(transcript(interp.into_output()), "> a\n< a\n> b\n");

    let log = log.lock().unwrap();
    assert_eq!(log.received, vec![vec!["a", "b"]]);
    assert_eq!(
        log.polls,
        vec![
            PollOutcome::Line("a".to_string()),
            PollOutcome::EndOfStream,
            PollOutcome::EndOfStream,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn drain_stops_once_the_child_has_exited() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()).exit_after_output(1));

    let script = ScriptBuilder::new().restart().line("bye").reader();
    let report = with_timeout(interp.run(script)).await?;

    assert_eq!(report.echoed, 1);
    // No second poll after the exit was noticed.
    assert_eq!(log.lock().unwrap().polls, vec![PollOutcome::Line("bye".to_string())]);
    Ok(())
}

#[tokio::test]
async fn drain_stops_on_the_first_timeout() -> TestResult {
    init_tracing();
    let log = new_log();
    let mut interp = interpreter(FakeBackend::new(log.clone()));

    let script = ScriptBuilder::new().restart().line("x").line("y").reader();
    with_timeout(interp.run(script)).await?;

    assert_eq!(
        log.lock().unwrap().polls,
        vec![
            PollOutcome::Line("x".to_string()),
            PollOutcome::Timeout,
            PollOutcome::Line("y".to_string()),
            PollOutcome::Timeout,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn delays_are_printed_as_floats() -> TestResult {
    init_tracing();
    let mut interp = interpreter(FakeBackend::new(new_log()));

    let script = ScriptBuilder::new()
        .restart()
        .line("DELAY 3")
        .line("padded")
        .reader();
    with_timeout(interp.run(script)).await?;

    assert_eq!(
        transcript(interp.into_output()),
        "D: 3.0\n> padded\n< padded\n"
    );
    Ok(())
}
