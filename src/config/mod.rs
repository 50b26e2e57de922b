// src/config/mod.rs

//! Run configuration for tester.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and layer CLI overrides on top (`loader.rs`).
//! - Validate timing values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_options};
pub use model::{ConfigFile, RawConfigFile, RunOptions, RunSection};
