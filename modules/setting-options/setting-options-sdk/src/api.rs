//! `SettingOptionsApi` trait definition.
//!
//! Reads resolve remote data on first use and then answer from the local
//! cache; writes go through optimistic local edits and remote persistence.

use async_trait::async_trait;

use crate::errors::SettingsError;
use crate::models::{ReadOptions, Setting, SettingUpdates, SettingValue, SettingsGroup};

/// Public API trait for the setting-options store.
///
/// Setting order follows the order in which the server reported them.
#[async_trait]
pub trait SettingOptionsApi: Send + Sync {
    /// All settings groups, fetched once and then served from cache.
    async fn get_groups(&self) -> Result<Vec<SettingsGroup>, SettingsError>;

    /// Settings of one group, optionally with pending edits applied.
    async fn get_settings(
        &self,
        group_id: &str,
        options: ReadOptions,
    ) -> Result<Vec<Setting>, SettingsError>;

    /// One setting, optionally with its pending edit applied.
    async fn get_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<Setting>, SettingsError>;

    /// One setting's value, optionally the pending edit instead of the canonical value.
    async fn get_setting_value(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<SettingValue>, SettingsError>;

    /// Records a local edit. Editing back to the canonical value discards the edit.
    async fn edit_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<(), SettingsError>;

    /// Records several local edits at once. The whole batch is rejected if any entry is invalid.
    async fn edit_settings(
        &self,
        group_id: &str,
        updates: SettingUpdates,
    ) -> Result<(), SettingsError>;

    /// Drops the pending edit and error of one setting.
    fn revert_edited_setting(&self, group_id: &str, setting_id: &str);

    /// Drops all pending edits and errors of a group.
    fn revert_edited_settings_group(&self, group_id: &str);

    /// Persists one value and returns the setting as stored by the server.
    async fn save_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<Setting, SettingsError>;

    /// Persists several values in one batch request.
    ///
    /// A batch where only some entries fail returns
    /// [`SettingsError::PartialBatch`]; the succeeded entries are committed.
    async fn save_settings_group(
        &self,
        group_id: &str,
        updates: SettingUpdates,
    ) -> Result<Vec<Setting>, SettingsError>;

    /// Persists the pending edit of one setting. `Ok(None)` when there is nothing to save.
    async fn save_edited_setting(
        &self,
        group_id: &str,
        setting_id: &str,
    ) -> Result<Option<Setting>, SettingsError>;

    /// Persists every pending edit of a group. Returns an empty list when there is nothing to save.
    async fn save_edited_settings_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Setting>, SettingsError>;
}
