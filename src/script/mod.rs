// src/script/mod.rs

//! Script input: streaming loader and directive classification.

pub mod directive;
pub mod reader;

pub use directive::{Directive, FormatError, classify};
pub use reader::{SCRIPT_DIR_TOKEN, ScriptLine, ScriptReader};
