//! Resolver bodies: lazily fill the cache from the REST API on first read.

use scope_locks::LockMode;
use setting_options_sdk::{Setting, SettingsError, SettingsGroup};

use super::fetch::ApiRequest;
use super::locking::{group_scope, setting_scope};
use super::reducer::SettingOptionsAction;
use super::store::SettingOptionsStore;

impl SettingOptionsStore {
    /// Failures are left to the caller; no error is recorded in state.
    pub(crate) async fn fetch_groups(&self) -> Result<(), SettingsError> {
        let path = self.endpoints().groups();
        tracing::debug!(%path, "fetching settings groups");
        let groups: Vec<SettingsGroup> = self
            .request_json(ApiRequest::get(path))
            .await
            .inspect_err(|error| tracing::warn!(%error, "failed to fetch settings groups"))?;
        self.dispatch(SettingOptionsAction::ReceiveGroups { groups });
        Ok(())
    }

    pub(crate) async fn fetch_settings(&self, group_id: &str) -> Result<(), SettingsError> {
        let _lock = self.lock(group_scope(group_id), LockMode::Shared).await;
        tracing::debug!(group_id, "fetching settings");

        let request = ApiRequest::get(self.endpoints().group(group_id));
        match self.request_json::<Vec<Setting>>(request).await {
            Ok(settings) => {
                self.dispatch(SettingOptionsAction::ReceiveSettings {
                    group_id: group_id.to_owned(),
                    settings,
                });
                Ok(())
            }
            Err(error) => {
                tracing::warn!(group_id, %error, "failed to fetch settings");
                self.dispatch(SettingOptionsAction::SetError {
                    group_id: group_id.to_owned(),
                    setting_id: None,
                    error: Some(error.clone()),
                });
                Err(error)
            }
        }
    }

    pub(crate) async fn fetch_setting(
        &self,
        group_id: &str,
        setting_id: &str,
    ) -> Result<(), SettingsError> {
        let _lock = self
            .lock(setting_scope(group_id, setting_id), LockMode::Shared)
            .await;
        tracing::debug!(group_id, setting_id, "fetching setting");

        let request = ApiRequest::get(self.endpoints().setting(group_id, setting_id));
        match self.request_json::<Setting>(request).await {
            Ok(setting) => {
                self.dispatch(SettingOptionsAction::ReceiveSettings {
                    group_id: group_id.to_owned(),
                    settings: vec![setting],
                });
                Ok(())
            }
            Err(error) => {
                tracing::warn!(group_id, setting_id, %error, "failed to fetch setting");
                self.dispatch(SettingOptionsAction::SetError {
                    group_id: group_id.to_owned(),
                    setting_id: Some(setting_id.to_owned()),
                    error: Some(error.clone()),
                });
                Err(error)
            }
        }
    }
}
