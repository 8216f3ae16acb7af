//! # shape-config
//!
//! Layered configuration loading for shape using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SHAPE_*` prefix, `__` as separator)
//! 2. Project-level `.shape/config.toml`
//! 3. User-level `~/.config/shape/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `SHAPE_ENGINE__KEY_MODE` -> `engine.key_mode` and
//! `SHAPE_OUTPUT__PRETTY` -> `output.pretty`.
//!
//! ```no_run
//! use shape_config::ShapeConfig;
//!
//! let config = ShapeConfig::load_with_dotenv().expect("config");
//! let catalog = config.engine.catalog();
//! assert!(catalog.is_empty());
//! ```

mod engine;
mod error;
mod output;

pub use engine::EngineConfig;
pub use error::ConfigError;
pub use output::OutputConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted `output.indent`.
const MAX_INDENT: usize = 16;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShapeConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ShapeConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; use [`load_with_dotenv`](Self::load_with_dotenv) for that.
    ///
    /// # Errors
    ///
    /// `ConfigError::Figment` if a source fails to parse or extract, or
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load `.env` from the current directory, then [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load).
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env is not an error.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary provider chain.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".shape/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("SHAPE_").split("__"))
    }

    /// # Errors
    ///
    /// `ConfigError::InvalidValue` for the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.indent > MAX_INDENT {
            return Err(ConfigError::InvalidValue {
                field: "output.indent".into(),
                reason: format!("must be at most {MAX_INDENT}, got {}", self.output.indent),
            });
        }
        if self
            .engine
            .manifest
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "engine.manifest".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("shape").join("config.toml"))
    }
}
