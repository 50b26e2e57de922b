// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TesterError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TesterError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.poll_timeout_ms == 0 {
        return Err(TesterError::ConfigError(
            "[run].poll_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.run.teardown_timeout_ms == Some(0) {
        return Err(TesterError::ConfigError(
            "[run].teardown_timeout_ms must be >= 1 when set (got 0)".to_string(),
        ));
    }

    Ok(())
}

