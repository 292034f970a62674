//! Tool settings loaded from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings shared by all subcommands.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
  /// Run `verify` on every tree read from disk and refuse invalid ones.
  #[serde(default = "default_verify_on_load")]
  pub verify_on_load: bool,
  /// Simplify trees before writing them back out.
  #[serde(default)]
  pub simplify: bool,
}

fn default_verify_on_load() -> bool {
  true
}

impl Default for ToolConfig {
  fn default() -> Self {
    Self {
      verify_on_load: default_verify_on_load(),
      simplify: false,
    }
  }
}

impl ToolConfig {
  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: ToolConfig =
      toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
    Ok(config)
  }
}
