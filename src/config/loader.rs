use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::types::Config;

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).context("failed to parse YAML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.listeners.is_empty() {
            anyhow::bail!("at least one listener must be defined");
        }

        let mut listener_names = std::collections::HashSet::new();
        for listener in &self.listeners {
            if !listener_names.insert(&listener.name) {
                anyhow::bail!("duplicate listener name: {}", listener.name);
            }
        }

        if self.store.capacity == 0 {
            anyhow::bail!("ledger capacity must be positive");
        }

        info!("configuration validated successfully");
        Ok(())
    }
}
