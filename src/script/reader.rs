// src/script/reader.rs

//! Streaming script loader.
//!
//! Lines are read lazily so a script piped through stdin can be typed
//! interactively. Each line is trimmed and has `$SD` replaced before the
//! interpreter sees it.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::debug;

use crate::errors::Result;

/// Placeholder replaced by the script's base directory.
pub const SCRIPT_DIR_TOKEN: &str = "$SD";

/// One line of a script, ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source.
    pub number: usize,
    pub text: String,
}

type BoxedSource = Box<dyn AsyncRead + Send + Unpin>;

pub struct ScriptReader {
    lines: Lines<BufReader<BoxedSource>>,
    base_dir: PathBuf,
    next_number: usize,
}

impl std::fmt::Debug for ScriptReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptReader")
            .field("base_dir", &self.base_dir)
            .field("next_number", &self.next_number)
            .finish_non_exhaustive()
    }
}

impl ScriptReader {
    /// Read from any async source; `$SD` expands to `base_dir`.
    pub fn new(source: impl AsyncRead + Send + Unpin + 'static, base_dir: PathBuf) -> Self {
        let boxed: BoxedSource = Box::new(source);
        Self {
            lines: BufReader::new(boxed).lines(),
            base_dir,
            next_number: 1,
        }
    }

    /// Open a script file. `$SD` expands to the file's absolute directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let base_dir = script_dir(path)?;
        debug!(script = %path.display(), base_dir = %base_dir.display(), "opened script");
        Ok(Self::new(file, base_dir))
    }

    /// Read the script from standard input.
    pub fn stdin(base_dir: PathBuf) -> Self {
        Self::new(tokio::io::stdin(), base_dir)
    }

    /// In-memory script, mostly for tests and dry runs.
    pub fn from_text(text: impl Into<String>, base_dir: PathBuf) -> Self {
        Self::new(Cursor::new(text.into().into_bytes()), base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Next prepared line, or `None` at end of input.
    pub async fn next_line(&mut self) -> Result<Option<ScriptLine>> {
        let Some(raw) = self.lines.next_line().await? else {
            return Ok(None);
        };

        let number = self.next_number;
        self.next_number += 1;

        Ok(Some(ScriptLine {
            number,
            text: prepare_line(&raw, &self.base_dir),
        }))
    }
}

/// Trim surrounding whitespace and expand `$SD`.
pub fn prepare_line(raw: &str, base_dir: &Path) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(SCRIPT_DIR_TOKEN) {
        trimmed.replace(SCRIPT_DIR_TOKEN, &base_dir.to_string_lossy())
    } else {
        trimmed.to_string()
    }
}

/// Absolute directory containing `script`.
pub fn script_dir(script: &Path) -> Result<PathBuf> {
    let absolute = std::fs::canonicalize(script)?;
    Ok(match absolute.parent() {
        Some(parent) => parent.to_path_buf(),
        None => absolute,
    })
}

/// Base directory used when the script comes from stdin.
pub fn stdin_base_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
