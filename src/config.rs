use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BlackjackResult;
use crate::learner::LearnerConfig;
use crate::table::TableConfig;

/// Settings file read by `--config`. Missing sections and fields fall back
/// to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table: TableConfig,
    pub learner: LearnerConfig,
}

impl Config {
    pub fn load(path: &Path) -> BlackjackResult<Config> {
        let config: Config = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.table.validate()?;
        log::debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> BlackjackResult<Config> {
        match path {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }

    pub fn to_json(&self) -> BlackjackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
