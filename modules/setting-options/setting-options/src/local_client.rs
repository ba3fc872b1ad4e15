use async_trait::async_trait;
use setting_options_sdk::{
    ReadOptions, Setting, SettingOptionsApi, SettingUpdates, SettingValue, SettingsError,
    SettingsGroup,
};

use crate::domain::store::SettingOptionsStore;

/// In-process [`SettingOptionsApi`] backed by a [`SettingOptionsStore`].
///
/// Reads wait for resolution and then answer from the store's selectors.
#[derive(Clone)]
pub struct LocalClient {
    store: SettingOptionsStore,
}

impl LocalClient {
    #[must_use]
    pub fn new(store: SettingOptionsStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &SettingOptionsStore {
        &self.store
    }
}

#[async_trait]
impl SettingOptionsApi for LocalClient {
    async fn get_groups(&self) -> Result<Vec<SettingsGroup>, SettingsError> {
        let groups = self.store.resolve_groups().await?;
        Ok(groups.as_ref().clone())
    }

    async fn get_settings(
        &self,
        group_id: &str,
        options: ReadOptions,
    ) -> Result<Vec<Setting>, SettingsError> {
        let settings = self.store.resolve_settings(group_id, options).await?;
        Ok(settings
            .values()
            .map(|setting| setting.as_ref().clone())
            .collect())
    }

    async fn get_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<Setting>, SettingsError> {
        let setting = self
            .store
            .resolve_setting(group_id, setting_id, options)
            .await?;
        Ok(setting.map(|setting| setting.as_ref().clone()))
    }

    async fn get_setting_value(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<SettingValue>, SettingsError> {
        self.store
            .resolve_setting_value(group_id, setting_id, options)
            .await
    }

    async fn edit_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        self.store.edit_setting(group_id, setting_id, value).await
    }

    async fn edit_settings(
        &self,
        group_id: &str,
        updates: SettingUpdates,
    ) -> Result<(), SettingsError> {
        self.store.edit_settings(group_id, updates).await
    }

    fn revert_edited_setting(&self, group_id: &str, setting_id: &str) {
        self.store.revert_edited_setting(group_id, setting_id);
    }

    fn revert_edited_settings_group(&self, group_id: &str) {
        self.store.revert_edited_settings_group(group_id);
    }

    async fn save_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<Setting, SettingsError> {
        self.store.save_setting(group_id, setting_id, value).await
    }

    async fn save_settings_group(
        &self,
        group_id: &str,
        updates: SettingUpdates,
    ) -> Result<Vec<Setting>, SettingsError> {
        self.store.save_settings_group(group_id, updates).await
    }

    async fn save_edited_setting(
        &self,
        group_id: &str,
        setting_id: &str,
    ) -> Result<Option<Setting>, SettingsError> {
        self.store.save_edited_setting(group_id, setting_id).await
    }

    async fn save_edited_settings_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Setting>, SettingsError> {
        self.store.save_edited_settings_group(group_id).await
    }
}
