//! Layered configuration: defaults, then YAML, then environment, then CLI flags.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use setting_options::SettingOptionsConfig;

use crate::logging::LoggingConfig;

/// Prefix of environment overrides; `__` separates nesting levels,
/// e.g. `SETTING_OPTIONS__API__BASE_URL`.
pub const ENV_PREFIX: &str = "SETTING_OPTIONS__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api: SettingOptionsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// # Errors
    /// Fails if the YAML file is unreadable or any layer does not fit the schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    pub fn apply_cli_overrides(&mut self, base_url: Option<&str>) {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url.to_owned();
        }
    }

    /// # Errors
    /// Fails if the configuration cannot be rendered.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration")
    }
}
