#![allow(dead_code)]

use std::path::PathBuf;

use tester::script::ScriptReader;

/// Builder for script text, one directive per call.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    lines: Vec<String>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: &str) -> Self {
        self.lines.push(text.to_string());
        self
    }

    pub fn comment(self, text: &str) -> Self {
        self.line(&format!("# {text}"))
    }

    pub fn env(self, key: &str, value: &str) -> Self {
        self.line(&format!("ENV {key} {value}"))
    }

    pub fn env_clear(self) -> Self {
        self.line("ENVCLEAR")
    }

    pub fn restart(self) -> Self {
        self.line("RESTART")
    }

    pub fn delay(self, secs: f64) -> Self {
        self.line(&format!("DELAY {secs}"))
    }

    pub fn start_skip(self) -> Self {
        self.line("START_SKIP")
    }

    pub fn end_skip(self) -> Self {
        self.line("END_SKIP")
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    /// In-memory reader with `/scripts` as the `$SD` directory.
    pub fn reader(&self) -> ScriptReader {
        ScriptReader::from_text(self.build(), PathBuf::from("/scripts"))
    }
}
