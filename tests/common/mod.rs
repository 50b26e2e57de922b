#![allow(dead_code)]

pub use tester_test_utils::builders::ScriptBuilder;
pub use tester_test_utils::{init_tracing, with_timeout};

/// Transcript bytes as a `String`.
pub fn transcript(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("transcript is valid UTF-8")
}
