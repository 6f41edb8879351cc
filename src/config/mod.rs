//! Harness settings.
//!
//! Sources are merged with priority (lowest first):
//! 1. Default values (hardcoded)
//! 2. Config file passed explicitly or named by `E2E_CONFIG_PATH`
//! 3. Environment variables prefixed with `E2E__` (highest priority)
//!

mod probe;
mod runtime;
mod teardown;
pub use probe::*;
pub use runtime::*;
pub use teardown::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_PATH_ENV;
use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Container image, network and port layout of the nodes under test
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Membership probe bounds
    #[serde(default)]
    pub probe: ProbeConfig,
    /// End-of-scenario cleanup behaviour
    #[serde(default)]
    pub teardown: TeardownConfig,
}

impl Settings {
    /// Defaults merged with `E2E_CONFIG_PATH` (if set) and `E2E__*` variables
    pub fn new() -> Result<Self> {
        Self::load(None)
    }

    /// Load settings, layering `config_path` (or `E2E_CONFIG_PATH` when no
    /// path is given) and then environment variables over the defaults.
    ///
    /// The merged result is validated before it is returned.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates every section
    /// # Errors
    /// Returns `Error::InvalidConfig` naming the first rule violated
    pub fn validate(&self) -> Result<()> {
        self.runtime.validate()?;
        self.probe.validate()?;
        Ok(())
    }
}
