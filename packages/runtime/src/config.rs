use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "trellis.config.json";

/// Runtime configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// CSP nonce written onto generated `<style>` blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Prefix for generated identities and stash sequences
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_id_prefix() -> String {
    "trellis".to_string()
}

impl RuntimeConfig {
    /// Load config from a directory, falling back to defaults when no file exists
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(RuntimeConfig::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Token parsing relies on the prefix being purely alphabetic
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_prefix.is_empty() || !self.id_prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidPrefix(self.id_prefix.clone()));
        }
        Ok(())
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            nonce: None,
            id_prefix: default_id_prefix(),
        }
    }
}
