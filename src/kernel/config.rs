use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::ConfigError;
use super::time::TICK_MS;

/// When the post-commit phase must hold its queue back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCommitPolicy {
    /// Defer post-commit tasks while some module holds an orientation override
    /// and no priority action is pending. Those tasks then run at tick-start.
    #[default]
    DeferWhileOverride,
    /// Never defer because of an override; only a pending tick-start
    /// priority action blocks the phase.
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub post_commit_policy: PostCommitPolicy,
    /// Freeze orientation changes while the agent has a modal screen open.
    pub suppress_while_modal_open: bool,
    /// Report the computed shadow instead of the last transmitted orientation.
    pub report_server_shadow: bool,
    pub world_change_clears_priority: bool,
    pub tick_ms: u64,
    pub demo_ticks: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            post_commit_policy: PostCommitPolicy::default(),
            suppress_while_modal_open: true,
            report_server_shadow: false,
            world_change_clears_priority: true,
            tick_ms: TICK_MS,
            demo_ticks: 40,
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let config: KernelConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Reads the file named by `VANTAGE_CONFIG`, or falls back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("VANTAGE_CONFIG") {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }
}
