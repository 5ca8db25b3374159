use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid plugin configuration")]
    InvalidJson(#[from] serde_json::Error),
}

/// Which click-intent shapes the pass looks for besides `addEventListener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// JSX `onClick` attributes.
    React,
    /// Compiled `createVNode`-family calls with an `onClick` prop.
    #[default]
    Vue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginConfig {
    pub framework: Framework,
}

impl PluginConfig {
    /// Parse the JSON string handed over by the host. An empty string means
    /// "no config".
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}
