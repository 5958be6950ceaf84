//! Network configuration.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error loading a [`NetworkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration was not valid TOML or did not match the expected schema.
    #[error("invalid network configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The module library name was empty.
    #[error("the module library name must not be empty")]
    EmptyModuleLibrary,
}

/// Settings controlling how a [`Network`](crate::Network) views its database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whether the module hierarchy is exposed.
    ///
    /// When disabled, only the flat netlist is visible and every flat
    /// instance is a direct child of the top instance.
    pub hierarchy: bool,
    /// The character separating path components in hierarchical names.
    pub path_divider: char,
    /// The name of the synthetic library holding one cell per instantiated module.
    pub module_library: ArcStr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hierarchy: false,
            path_divider: '/',
            module_library: arcstr::literal!("modules"),
        }
    }
}

impl NetworkConfig {
    /// Parses a configuration from a TOML document.
    ///
    /// Missing fields take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        if config.module_library.is_empty() {
            return Err(ConfigError::EmptyModuleLibrary);
        }
        Ok(config)
    }

    /// A flat configuration with default settings.
    #[inline]
    pub fn flat() -> Self {
        Self::default()
    }

    /// A hierarchical configuration with default settings.
    pub fn hierarchical() -> Self {
        Self {
            hierarchy: true,
            ..Default::default()
        }
    }
}
