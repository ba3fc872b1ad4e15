//! Configuration for the setting-options store and its REST transport.

use serde::{Deserialize, Serialize};
use setting_options_sdk::SettingsError;
use std::time::Duration;

/// Setting-options configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingOptionsConfig {
    /// Origin of the REST API, e.g. `https://shop.example.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix of the per-group settings endpoints.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Path of the settings-groups listing, which lives outside `namespace`.
    #[serde(default = "default_groups_path")]
    pub groups_path: String,

    /// Lock namespace for all locks taken by the store.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout", with = "humantime_duration")]
    pub request_timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_owned()
}

fn default_namespace() -> String {
    "/wc-admin".to_owned()
}

fn default_groups_path() -> String {
    "/wc/v3/settings".to_owned()
}

fn default_store_name() -> String {
    "wc/admin/setting-options".to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("setting-options/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SettingOptionsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            namespace: default_namespace(),
            groups_path: default_groups_path(),
            store_name: default_store_name(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl SettingOptionsConfig {
    /// # Errors
    /// Returns [`SettingsError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.base_url.trim().is_empty() {
            return Err(SettingsError::config("base_url must not be empty"));
        }
        if !self.namespace.starts_with('/') {
            return Err(SettingsError::config(format!(
                "namespace must start with '/', got '{}'",
                self.namespace
            )));
        }
        if !self.groups_path.starts_with('/') {
            return Err(SettingsError::config(format!(
                "groups_path must start with '/', got '{}'",
                self.groups_path
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(SettingsError::config("request_timeout must be greater than zero"));
        }
        Ok(())
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
