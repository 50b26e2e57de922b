// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod script;

use std::io::Write;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::resolve_options;
use crate::engine::{CoreCommand, Interpreter, InterpreterCore, RunReport};
use crate::errors::Result;
use crate::exec::TokioBackend;
use crate::script::ScriptReader;
use crate::script::reader::stdin_base_dir;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (`--config` file + CLI overrides)
/// - the script source (file or stdin)
/// - the tokio process backend
/// - the interpreter, writing its transcript to stdout
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let config = resolve_options(&args)?;
    let options = config.run_options();
    debug!(?options, "resolved run options");

    let script = match &args.script {
        Some(path) => ScriptReader::open(path).await?,
        None => {
            info!("reading script from stdin");
            ScriptReader::stdin(stdin_base_dir())
        }
    };

    if args.dry_run {
        return dry_run(script, std::io::stdout()).await;
    }

    let backend = TokioBackend::new(&args.program, &options);
    let mut interpreter = Interpreter::new(backend, std::io::stdout(), &options);
    interpreter.run(script).await
}

/// Walk the script through the pure core only and print the resulting
/// commands. No process is started and DELAYs are not slept.
pub async fn dry_run<W: Write>(mut script: ScriptReader, mut out: W) -> Result<RunReport> {
    let mut core = InterpreterCore::new();
    let mut report = RunReport::default();

    writeln!(out, "tester dry-run (base dir {})", script.base_dir().display())?;

    while let Some(line) = script.next_line().await? {
        report.lines += 1;
        let n = line.number;
        match core.step(&line) {
            CoreCommand::Nothing => {}
            CoreCommand::SkipMode(on) => {
                writeln!(out, "{n:>4}: skip mode {}", if on { "on" } else { "off" })?;
            }
            CoreCommand::Restart(env) => {
                report.restarts += 1;
                let vars: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
                writeln!(out, "{n:>4}: RESTART env [{}]", vars.join(", "))?;
            }
            CoreCommand::Send(text) => {
                if report.restarts == 0 {
                    report.dropped += 1;
                    writeln!(out, "{n:>4}: drop {text} (no child yet)")?;
                } else {
                    report.sent += 1;
                    writeln!(out, "{n:>4}: send {text}")?;
                }
            }
            CoreCommand::Delay(duration) => {
                writeln!(out, "{n:>4}: delay {}s", duration.as_secs_f64())?;
            }
            CoreCommand::Malformed(reason) => {
                report.warnings += 1;
                writeln!(out, "{n:>4}: skipped: {reason}")?;
            }
        }
    }

    out.flush()?;
    debug!(?report, "dry-run complete (no execution)");
    Ok(report)
}
