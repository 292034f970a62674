//! Tree configuration loaded from TOML.
//!
//! ```toml
//! resolution = 0.05
//! center = [0.0, 0.0, 1.5]
//! halfwidth = 8.0
//! simplify_on_insert = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::space::Space;

/// Construction parameters for a `Tree`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
  /// Edge length of the finest cells.
  pub resolution: f64,
  /// Initial root center; the origin when omitted.
  #[serde(default)]
  pub center: Option<Vec<f64>>,
  /// Initial root halfwidth; half the resolution when omitted.
  #[serde(default)]
  pub halfwidth: Option<f64>,
  /// Collapse agreeing siblings during insertion.
  #[serde(default)]
  pub simplify_on_insert: bool,
}

impl TreeConfig {
  /// Config with only a resolution.
  pub fn with_resolution(resolution: f64) -> Self {
    Self {
      resolution,
      center: None,
      halfwidth: None,
      simplify_on_insert: false,
    }
  }

  /// Load and validate configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, TreeError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_toml(&content)
  }

  /// Parse and validate configuration from TOML text.
  pub fn from_toml(content: &str) -> Result<Self, TreeError> {
    let config: TreeConfig =
      toml::from_str(content).map_err(|err| TreeError::Config(err.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Range checks. Does not check the center's dimension, see
  /// [`TreeConfig::center_point`].
  pub fn validate(&self) -> Result<(), TreeError> {
    if !(self.resolution.is_finite() && self.resolution > 0.0) {
      return Err(TreeError::Config(format!(
        "resolution must be positive, got {}",
        self.resolution
      )));
    }
    if let Some(halfwidth) = self.halfwidth {
      if !(halfwidth.is_finite() && halfwidth > 0.0) {
        return Err(TreeError::Config(format!(
          "halfwidth must be positive, got {}",
          halfwidth
        )));
      }
    }
    if let Some(center) = &self.center {
      if center.iter().any(|c| !c.is_finite()) {
        return Err(TreeError::Config("center must be finite".to_string()));
      }
    }
    Ok(())
  }

  /// Root center for a tree over `P`.
  pub fn center_point<P: Space>(&self) -> Result<P, TreeError> {
    match &self.center {
      None => Ok(P::ZERO),
      Some(components) => P::from_components(components).ok_or_else(|| {
        TreeError::Config(format!(
          "center has {} components, expected {}",
          components.len(),
          P::DIM
        ))
      }),
    }
  }
}
