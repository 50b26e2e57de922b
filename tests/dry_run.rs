// tests/dry_run.rs
mod common;
use crate::common::{ScriptBuilder, init_tracing, transcript};

use std::error::Error;

use tester::dry_run;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn dry_run_lists_commands_without_starting_anything() -> TestResult {
    init_tracing();
    let script = ScriptBuilder::new()
        .line("early")
        .env("VOICE", "alex")
        .restart()
        .line("tts_say hi")
        .delay(2.0)
        .line("ENV BROKEN")
        .start_skip()
        .restart()
        .end_skip();

    let mut out = Vec::new();
    let report = dry_run(script.reader(), &mut out).await?;

    assert_eq!(report.lines, 9);
    assert_eq!(report.restarts, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.warnings, 1);

    let out = transcript(out);
    assert!(out.starts_with("tester dry-run (base dir /scripts)\n"), "{out}");
    assert!(out.contains("   1: drop early (no child yet)"), "{out}");
    assert!(out.contains("   3: RESTART env [VOICE=alex]"), "{out}");
    assert!(out.contains("   4: send tts_say hi"), "{out}");
    assert!(out.contains("   5: delay 2s"), "{out}");
    assert!(out.contains("   6: skipped: ENV needs a key and a value"), "{out}");
    assert!(out.contains("   7: skip mode on"), "{out}");
    assert!(out.contains("   9: skip mode off"), "{out}");
    Ok(())
}

/// Sanity-check that demos/smoke.script is classified the way its comments describe.
#[tokio::test]
async fn demo_smoke_script_is_well_formed() -> TestResult {
    init_tracing();
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let script = tester::script::ScriptReader::open(manifest_dir.join("demos/smoke.script")).await?;

    let mut out = Vec::new();
    let report = dry_run(script, &mut out).await?;

    assert_eq!(report.restarts, 2);
    assert_eq!(report.sent, 3);
    assert_eq!(report.dropped, 0);
    assert_eq!(report.warnings, 0);

    let out = transcript(out);
    assert!(!out.contains("tts_play"), "skipped line leaked: {out}");
    assert!(out.contains("delay 1.5s"), "{out}");
    Ok(())
}
