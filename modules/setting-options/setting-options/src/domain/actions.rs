//! Action creators: local edits, reverts, and remote saves.
//!
//! Every save holds an exclusive lock on its scope and a saving flag for the
//! duration of the request. Both are guards, so they are undone on every
//! exit path, in the order saving flag first, then lock.

use scope_locks::LockMode;
use serde_json::json;
use setting_options_sdk::{
    BatchUpdateEntry, BatchUpdateRequest, BatchUpdateResponse, ReadOptions, Setting,
    SettingFailure, SettingUpdate, SettingUpdates, SettingValue, SettingsError,
};

use super::fetch::ApiRequest;
use super::locking::{SavingFlag, group_scope, setting_scope};
use super::reducer::SettingOptionsAction;
use super::selectors::get_setting_value;
use super::store::{ResolverKey, SettingOptionsStore};

impl SettingOptionsStore {
    /// Records a local edit once the canonical value is known.
    ///
    /// # Errors
    /// Fails without dispatching if the setting could not be resolved.
    pub async fn edit_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        self.ensure_resolved(&ResolverKey::setting(group_id, setting_id))
            .await?;
        self.dispatch(SettingOptionsAction::EditSetting {
            group_id: group_id.to_owned(),
            setting_id: setting_id.to_owned(),
            value,
        });
        Ok(())
    }

    /// Records several local edits in one state update.
    ///
    /// # Errors
    /// Rejects the whole batch with [`SettingsError::Validation`] before
    /// anything is dispatched if an entry has an empty id.
    pub async fn edit_settings(
        &self,
        group_id: &str,
        updates: impl Into<SettingUpdates>,
    ) -> Result<(), SettingsError> {
        let updates = updates.into();
        updates.validate()?;
        self.ensure_resolved(&ResolverKey::settings(group_id))
            .await?;
        self.dispatch(SettingOptionsAction::EditSettings {
            group_id: group_id.to_owned(),
            updates: updates.into_vec(),
        });
        Ok(())
    }

    pub fn revert_edited_setting(&self, group_id: &str, setting_id: &str) {
        self.dispatch(SettingOptionsAction::RevertEditedSetting {
            group_id: group_id.to_owned(),
            setting_id: setting_id.to_owned(),
        });
    }

    pub fn revert_edited_settings_group(&self, group_id: &str) {
        self.dispatch(SettingOptionsAction::RevertEditedSettingsGroup {
            group_id: group_id.to_owned(),
        });
    }

    /// Persists one value and commits the server's copy of the setting.
    ///
    /// # Errors
    /// The request error, which is also recorded against the setting.
    pub async fn save_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        value: SettingValue,
    ) -> Result<Setting, SettingsError> {
        let _lock = self
            .lock(setting_scope(group_id, setting_id), LockMode::Exclusive)
            .await;
        let _saving = SavingFlag::raise(self, group_id, Some(setting_id));
        tracing::debug!(group_id, setting_id, "saving setting");

        let request = ApiRequest::put(
            self.endpoints().setting(group_id, setting_id),
            json!({ "value": value }),
        );
        match self.request_json::<Setting>(request).await {
            Ok(setting) => {
                tracing::info!(group_id, setting_id, "setting saved");
                self.dispatch(SettingOptionsAction::ReceiveSettings {
                    group_id: group_id.to_owned(),
                    settings: vec![setting.clone()],
                });
                Ok(setting)
            }
            Err(error) => {
                tracing::error!(group_id, setting_id, %error, "failed to save setting");
                self.dispatch(SettingOptionsAction::SetError {
                    group_id: group_id.to_owned(),
                    setting_id: Some(setting_id.to_owned()),
                    error: Some(error.clone()),
                });
                Err(error)
            }
        }
    }

    /// Persists the given updates in one batch request.
    ///
    /// # Errors
    /// [`SettingsError::PartialBatch`] when the server rejected only some
    /// entries; the others are committed and their edits cleared.
    pub async fn save_settings_group(
        &self,
        group_id: &str,
        updates: impl Into<SettingUpdates>,
    ) -> Result<Vec<Setting>, SettingsError> {
        self.save_batch(group_id, updates.into().into_vec()).await
    }

    /// Saves the pending edit of one setting. `Ok(None)` without a request
    /// when there is no edit.
    ///
    /// # Errors
    /// See [`Self::save_setting`].
    pub async fn save_edited_setting(
        &self,
        group_id: &str,
        setting_id: &str,
    ) -> Result<Option<Setting>, SettingsError> {
        let state = self.state();
        let edited = self.selectors().get_edited_setting_ids(&state, group_id);
        if !edited.iter().any(|id| id == setting_id) {
            return Ok(None);
        }
        let Some(value) =
            get_setting_value(&state, group_id, setting_id, ReadOptions::with_edits()).cloned()
        else {
            return Ok(None);
        };
        self.save_setting(group_id, setting_id, value)
            .await
            .map(Some)
    }

    /// Saves exactly the pending edits of a group. Empty without a request
    /// when there are none.
    ///
    /// # Errors
    /// See [`Self::save_settings_group`].
    pub async fn save_edited_settings_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Setting>, SettingsError> {
        let state = self.state();
        let updates: Vec<SettingUpdate> = self
            .selectors()
            .get_edited_setting_ids(&state, group_id)
            .iter()
            .filter_map(|id| {
                get_setting_value(&state, group_id, id, ReadOptions::with_edits())
                    .map(|value| SettingUpdate::new(id.clone(), value.clone()))
            })
            .collect();
        if updates.is_empty() {
            return Ok(Vec::new());
        }
        self.save_batch(group_id, updates).await
    }

    async fn save_batch(
        &self,
        group_id: &str,
        updates: Vec<SettingUpdate>,
    ) -> Result<Vec<Setting>, SettingsError> {
        let _lock = self.lock(group_scope(group_id), LockMode::Exclusive).await;
        let _saving = SavingFlag::raise(self, group_id, None);
        tracing::debug!(group_id, count = updates.len(), "saving settings batch");

        let result = self.commit_batch(group_id, &updates).await;
        match &result {
            Ok(updated) => {
                tracing::info!(group_id, count = updated.len(), "settings batch saved");
            }
            Err(SettingsError::PartialBatch { setting_errors }) => {
                tracing::warn!(
                    group_id,
                    failed = setting_errors.len(),
                    "settings batch partially failed"
                );
            }
            Err(error) => {
                tracing::error!(group_id, %error, "failed to save settings batch");
                self.dispatch(SettingOptionsAction::SetError {
                    group_id: group_id.to_owned(),
                    setting_id: None,
                    error: Some(error.clone()),
                });
            }
        }
        result
    }

    /// Posts the batch and commits what the server accepted. Rejected entries
    /// get a per-setting error and keep their edit.
    async fn commit_batch(
        &self,
        group_id: &str,
        updates: &[SettingUpdate],
    ) -> Result<Vec<Setting>, SettingsError> {
        let body = serde_json::to_value(BatchUpdateRequest { update: updates })?;
        let response: BatchUpdateResponse = self
            .request_json(ApiRequest::post(self.endpoints().batch(group_id), body))
            .await?;

        let mut updated = Vec::new();
        let mut failures = Vec::new();
        for entry in response.update {
            match entry {
                BatchUpdateEntry::Updated(setting) => updated.push(setting),
                BatchUpdateEntry::Failed { id, error } => {
                    tracing::warn!(group_id, setting_id = %id, %error, "setting rejected");
                    self.dispatch(SettingOptionsAction::SetError {
                        group_id: group_id.to_owned(),
                        setting_id: Some(id.clone()),
                        error: Some(SettingsError::api(error.clone())),
                    });
                    failures.push(SettingFailure { id, error });
                }
            }
        }

        if !updated.is_empty() {
            self.dispatch(SettingOptionsAction::ReceiveSettings {
                group_id: group_id.to_owned(),
                settings: updated.clone(),
            });
        }
        if !failures.is_empty() {
            return Err(SettingsError::PartialBatch {
                setting_errors: failures,
            });
        }
        Ok(updated)
    }
}
