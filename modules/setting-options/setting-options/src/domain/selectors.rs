//! Read functions over [`SettingOptionsState`].
//!
//! Cheap lookups are free functions. Selectors that build derived values live
//! on [`Selectors`], which memoizes by `Arc` identity of their inputs so that
//! unchanged inputs yield the very same `Arc` back.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use setting_options_sdk::{ReadOptions, Setting, SettingValue, SettingsError, SettingsGroup};

use super::state::{ErrorKey, GroupEdits, GroupSettings, SettingOptionsState};

static EMPTY_SETTINGS: LazyLock<Arc<GroupSettings>> =
    LazyLock::new(|| Arc::new(GroupSettings::new()));

static EMPTY_IDS: LazyLock<Arc<Vec<String>>> = LazyLock::new(|| Arc::new(Vec::new()));

#[must_use]
pub fn get_groups(state: &SettingOptionsState) -> &Arc<Vec<SettingsGroup>> {
    &state.groups
}

#[must_use]
pub fn get_group<'a>(state: &'a SettingOptionsState, group_id: &str) -> Option<&'a SettingsGroup> {
    state.groups.iter().find(|group| group.id == group_id)
}

/// The pending edit when `options.include_edits` is set and one exists,
/// otherwise the canonical value.
#[must_use]
pub fn get_setting_value<'a>(
    state: &'a SettingOptionsState,
    group_id: &str,
    setting_id: &str,
    options: ReadOptions,
) -> Option<&'a SettingValue> {
    if options.include_edits
        && let Some(edit) = edit_of(state, group_id, setting_id)
    {
        return Some(edit);
    }
    state
        .settings
        .get(group_id)
        .and_then(|settings| settings.get(setting_id))
        .map(|setting| &setting.value)
}

#[must_use]
pub fn is_setting_edited(state: &SettingOptionsState, group_id: &str, setting_id: &str) -> bool {
    edit_of(state, group_id, setting_id).is_some()
}

#[must_use]
pub fn is_group_saving(state: &SettingOptionsState, group_id: &str) -> bool {
    state
        .is_saving
        .groups
        .get(group_id)
        .copied()
        .unwrap_or(false)
}

#[must_use]
pub fn is_setting_saving(state: &SettingOptionsState, group_id: &str, setting_id: &str) -> bool {
    state
        .is_saving
        .settings
        .get(group_id)
        .and_then(|flags| flags.get(setting_id))
        .copied()
        .unwrap_or(false)
}

/// The group-wide error, set when a whole group request failed.
#[must_use]
pub fn get_group_error<'a>(
    state: &'a SettingOptionsState,
    group_id: &str,
) -> Option<&'a SettingsError> {
    state
        .errors
        .get(group_id)
        .and_then(|errors| errors.get(&ErrorKey::All))
}

#[must_use]
pub fn get_setting_error<'a>(
    state: &'a SettingOptionsState,
    group_id: &str,
    setting_id: &str,
) -> Option<&'a SettingsError> {
    state
        .errors
        .get(group_id)
        .and_then(|errors| errors.get(&ErrorKey::setting(setting_id)))
}

#[must_use]
pub fn has_edits_for_group(state: &SettingOptionsState, group_id: &str) -> bool {
    state
        .edits
        .get(group_id)
        .is_some_and(|edits| !edits.is_empty())
}

fn edit_of<'a>(
    state: &'a SettingOptionsState,
    group_id: &str,
    setting_id: &str,
) -> Option<&'a SettingValue> {
    state
        .edits
        .get(group_id)
        .and_then(|edits| edits.get(setting_id))
}

struct MergedSettings {
    settings: Arc<GroupSettings>,
    edits: Arc<GroupEdits>,
    merged: Arc<GroupSettings>,
}

struct MergedSetting {
    setting: Arc<Setting>,
    edit: SettingValue,
    merged: Arc<Setting>,
}

struct EditedIds {
    edits: Arc<GroupEdits>,
    ids: Arc<Vec<String>>,
}

/// Memoized selectors. One instance is shared by every reader of a store.
///
/// Each cache keeps the last result per group (or per setting) together with
/// the `Arc`s it was computed from, and is reused only while those are the
/// same allocations. An entry is dropped once a read finds nothing left to
/// merge for it.
#[derive(Default)]
pub struct Selectors {
    settings: Mutex<HashMap<String, MergedSettings>>,
    setting: Mutex<HashMap<String, HashMap<String, MergedSetting>>>,
    edited_ids: Mutex<HashMap<String, EditedIds>>,
}

impl Selectors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings of a group.
    ///
    /// A group with no settings yields a shared empty map. Without edits to
    /// apply, the stored group map itself is returned.
    pub fn get_settings(
        &self,
        state: &SettingOptionsState,
        group_id: &str,
        options: ReadOptions,
    ) -> Arc<GroupSettings> {
        let Some(settings) = state.settings.get(group_id) else {
            self.settings.lock().remove(group_id);
            return Arc::clone(&EMPTY_SETTINGS);
        };
        let Some(edits) = state.edits.get(group_id) else {
            self.settings.lock().remove(group_id);
            return Arc::clone(settings);
        };
        if !options.include_edits {
            return Arc::clone(settings);
        }

        let mut cache = self.settings.lock();
        if let Some(memo) = cache.get(group_id)
            && Arc::ptr_eq(&memo.settings, settings)
            && Arc::ptr_eq(&memo.edits, edits)
        {
            return Arc::clone(&memo.merged);
        }

        let merged: GroupSettings = settings
            .iter()
            .map(|(id, setting)| {
                let setting = match edits.get(id) {
                    Some(edit) => with_value(setting, edit),
                    None => Arc::clone(setting),
                };
                (id.clone(), setting)
            })
            .collect();
        let merged = Arc::new(merged);
        cache.insert(
            group_id.to_owned(),
            MergedSettings {
                settings: Arc::clone(settings),
                edits: Arc::clone(edits),
                merged: Arc::clone(&merged),
            },
        );
        merged
    }

    /// One setting, with its pending edit applied when asked to.
    pub fn get_setting(
        &self,
        state: &SettingOptionsState,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Option<Arc<Setting>> {
        let setting = state
            .settings
            .get(group_id)
            .and_then(|settings| settings.get(setting_id));
        let (Some(setting), Some(edit)) = (setting, edit_of(state, group_id, setting_id)) else {
            self.forget_setting(group_id, setting_id);
            return setting.map(Arc::clone);
        };
        if !options.include_edits {
            return Some(Arc::clone(setting));
        }

        let mut cache = self.setting.lock();
        let group = cache.entry(group_id.to_owned()).or_default();
        if let Some(memo) = group.get(setting_id)
            && Arc::ptr_eq(&memo.setting, setting)
            && memo.edit == *edit
        {
            return Some(Arc::clone(&memo.merged));
        }

        let merged = with_value(setting, edit);
        group.insert(
            setting_id.to_owned(),
            MergedSetting {
                setting: Arc::clone(setting),
                edit: edit.clone(),
                merged: Arc::clone(&merged),
            },
        );
        Some(merged)
    }

    /// Ids with pending edits in a group, in edit order.
    pub fn get_edited_setting_ids(
        &self,
        state: &SettingOptionsState,
        group_id: &str,
    ) -> Arc<Vec<String>> {
        let Some(edits) = state.edits.get(group_id) else {
            self.edited_ids.lock().remove(group_id);
            return Arc::clone(&EMPTY_IDS);
        };

        let mut cache = self.edited_ids.lock();
        if let Some(memo) = cache.get(group_id)
            && Arc::ptr_eq(&memo.edits, edits)
        {
            return Arc::clone(&memo.ids);
        }

        let ids = Arc::new(edits.keys().cloned().collect::<Vec<_>>());
        cache.insert(
            group_id.to_owned(),
            EditedIds {
                edits: Arc::clone(edits),
                ids: Arc::clone(&ids),
            },
        );
        ids
    }

    fn forget_setting(&self, group_id: &str, setting_id: &str) {
        let mut cache = self.setting.lock();
        if let Some(group) = cache.get_mut(group_id) {
            group.remove(setting_id);
            if group.is_empty() {
                cache.remove(group_id);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_entries(&self) -> usize {
        self.settings.lock().len()
            + self.setting.lock().values().map(HashMap::len).sum::<usize>()
            + self.edited_ids.lock().len()
    }
}

fn with_value(setting: &Setting, value: &SettingValue) -> Arc<Setting> {
    Arc::new(Setting {
        value: value.clone(),
        ..setting.clone()
    })
}

/// A consistent view over one state snapshot, combining the free selectors
/// with the store's memoized ones.
pub struct Selection<'a> {
    state: Arc<SettingOptionsState>,
    selectors: &'a Selectors,
}

impl<'a> Selection<'a> {
    #[must_use]
    pub fn new(state: Arc<SettingOptionsState>, selectors: &'a Selectors) -> Self {
        Self { state, selectors }
    }

    #[must_use]
    pub fn state(&self) -> &SettingOptionsState {
        &self.state
    }

    #[must_use]
    pub fn groups(&self) -> &Arc<Vec<SettingsGroup>> {
        get_groups(&self.state)
    }

    #[must_use]
    pub fn group(&self, group_id: &str) -> Option<&SettingsGroup> {
        get_group(&self.state, group_id)
    }

    #[must_use]
    pub fn settings(&self, group_id: &str, options: ReadOptions) -> Arc<GroupSettings> {
        self.selectors.get_settings(&self.state, group_id, options)
    }

    #[must_use]
    pub fn setting(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Option<Arc<Setting>> {
        self.selectors
            .get_setting(&self.state, group_id, setting_id, options)
    }

    #[must_use]
    pub fn setting_value(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Option<&SettingValue> {
        get_setting_value(&self.state, group_id, setting_id, options)
    }

    #[must_use]
    pub fn is_setting_edited(&self, group_id: &str, setting_id: &str) -> bool {
        is_setting_edited(&self.state, group_id, setting_id)
    }

    #[must_use]
    pub fn edited_setting_ids(&self, group_id: &str) -> Arc<Vec<String>> {
        self.selectors.get_edited_setting_ids(&self.state, group_id)
    }

    #[must_use]
    pub fn is_group_saving(&self, group_id: &str) -> bool {
        is_group_saving(&self.state, group_id)
    }

    #[must_use]
    pub fn is_setting_saving(&self, group_id: &str, setting_id: &str) -> bool {
        is_setting_saving(&self.state, group_id, setting_id)
    }

    #[must_use]
    pub fn group_error(&self, group_id: &str) -> Option<&SettingsError> {
        get_group_error(&self.state, group_id)
    }

    #[must_use]
    pub fn setting_error(&self, group_id: &str, setting_id: &str) -> Option<&SettingsError> {
        get_setting_error(&self.state, group_id, setting_id)
    }

    #[must_use]
    pub fn has_edits_for_group(&self, group_id: &str) -> bool {
        has_edits_for_group(&self.state, group_id)
    }
}
