//! The only path to state mutation.
//!
//! [`reduce`] is pure: it never mutates its input and returns a state whose
//! untouched branches are shared with the input by reference. Branches it does
//! change are rebuilt, so consumers can compare with `Arc::ptr_eq`.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use setting_options_sdk::{Setting, SettingUpdate, SettingValue, SettingsError, SettingsGroup};

use super::state::{ByGroup, ErrorKey, GroupSettings, SettingOptionsState};

/// Plain update actions folded into the state by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingOptionsAction {
    /// Replaces the group list verbatim.
    ReceiveGroups { groups: Vec<SettingsGroup> },
    /// Upserts authoritative settings and clears their edits and errors.
    ReceiveSettings {
        group_id: String,
        settings: Vec<Setting>,
    },
    EditSetting {
        group_id: String,
        setting_id: String,
        value: SettingValue,
    },
    EditSettings {
        group_id: String,
        updates: Vec<SettingUpdate>,
    },
    /// `setting_id: None` targets the group-level flag.
    SetSaving {
        group_id: String,
        setting_id: Option<String>,
        is_saving: bool,
    },
    /// `setting_id: None` targets the group-wide entry; `error: None` clears.
    SetError {
        group_id: String,
        setting_id: Option<String>,
        error: Option<SettingsError>,
    },
    RevertEditedSetting {
        group_id: String,
        setting_id: String,
    },
    RevertEditedSettingsGroup { group_id: String },
}

/// Folds one action into `state`.
#[must_use]
pub fn reduce(state: &SettingOptionsState, action: SettingOptionsAction) -> SettingOptionsState {
    let mut next = state.clone();
    match action {
        SettingOptionsAction::ReceiveGroups { groups } => {
            next.groups = Arc::new(groups);
        }
        SettingOptionsAction::ReceiveSettings { group_id, settings } => {
            let ids: Vec<String> = settings.iter().map(|setting| setting.id.clone()).collect();
            next.settings = receive_settings(&state.settings, &group_id, settings);
            next.edits = update_group(&state.edits, &group_id, |edits| {
                remove_all(edits, ids.iter().cloned())
            });
            next.errors = update_group(&state.errors, &group_id, |errors| {
                remove_all(errors, ids.iter().cloned().map(ErrorKey::Setting))
            });
        }
        SettingOptionsAction::EditSetting {
            group_id,
            setting_id,
            value,
        } => {
            let canonical = state.settings.get(&group_id).map(Arc::clone);
            next.edits = update_group(&state.edits, &group_id, |edits| {
                apply_edit(edits, canonical.as_deref(), setting_id, value)
            });
        }
        SettingOptionsAction::EditSettings { group_id, updates } => {
            let canonical = state.settings.get(&group_id).map(Arc::clone);
            next.edits = update_group(&state.edits, &group_id, |edits| {
                updates.into_iter().fold(false, |changed, update| {
                    apply_edit(edits, canonical.as_deref(), update.id, update.value) || changed
                })
            });
        }
        SettingOptionsAction::SetSaving {
            group_id,
            setting_id,
            is_saving,
        } => match setting_id {
            None => {
                if state.is_saving.groups.get(&group_id) != Some(&is_saving) {
                    let mut groups = (*state.is_saving.groups).clone();
                    groups.insert(group_id, is_saving);
                    next.is_saving.groups = Arc::new(groups);
                }
            }
            Some(setting_id) => {
                let current = state
                    .is_saving
                    .settings
                    .get(&group_id)
                    .and_then(|flags| flags.get(&setting_id));
                if current != Some(&is_saving) {
                    let mut flags = state
                        .is_saving
                        .settings
                        .get(&group_id)
                        .map(|flags| (**flags).clone())
                        .unwrap_or_default();
                    flags.insert(setting_id, is_saving);
                    let mut settings = (*state.is_saving.settings).clone();
                    settings.insert(group_id, Arc::new(flags));
                    next.is_saving.settings = Arc::new(settings);
                }
            }
        },
        SettingOptionsAction::SetError {
            group_id,
            setting_id,
            error,
        } => {
            next.errors = match (setting_id, error) {
                (None, None) => remove_group(&state.errors, &group_id),
                (None, Some(error)) => update_group(&state.errors, &group_id, |errors| {
                    errors.insert(ErrorKey::All, error);
                    true
                }),
                (Some(setting_id), None) => update_group(&state.errors, &group_id, |errors| {
                    errors.shift_remove(&ErrorKey::Setting(setting_id)).is_some()
                }),
                (Some(setting_id), Some(error)) => {
                    update_group(&state.errors, &group_id, |errors| {
                        errors.insert(ErrorKey::Setting(setting_id), error);
                        true
                    })
                }
            };
        }
        SettingOptionsAction::RevertEditedSetting {
            group_id,
            setting_id,
        } => {
            next.edits = update_group(&state.edits, &group_id, |edits| {
                edits.shift_remove(&setting_id).is_some()
            });
            next.errors = update_group(&state.errors, &group_id, |errors| {
                errors
                    .shift_remove(&ErrorKey::Setting(setting_id))
                    .is_some()
            });
        }
        SettingOptionsAction::RevertEditedSettingsGroup { group_id } => {
            next.edits = remove_group(&state.edits, &group_id);
            next.errors = remove_group(&state.errors, &group_id);
        }
    }
    next
}

fn receive_settings(
    by_group: &Arc<ByGroup<GroupSettings>>,
    group_id: &str,
    settings: Vec<Setting>,
) -> Arc<ByGroup<GroupSettings>> {
    let mut group = by_group
        .get(group_id)
        .map(|group| (**group).clone())
        .unwrap_or_default();
    for setting in settings {
        group.insert(setting.id.clone(), Arc::new(setting));
    }
    let mut next = (**by_group).clone();
    next.insert(group_id.to_owned(), Arc::new(group));
    Arc::new(next)
}

/// Records `value` as an edit unless it equals the canonical value, in which
/// case any existing edit is dropped. Returns whether `edits` changed.
fn apply_edit(
    edits: &mut IndexMap<String, SettingValue>,
    canonical: Option<&GroupSettings>,
    setting_id: String,
    value: SettingValue,
) -> bool {
    let canonical_value = canonical
        .and_then(|settings| settings.get(&setting_id))
        .map(|setting| &setting.value);
    if canonical_value == Some(&value) {
        return edits.shift_remove(&setting_id).is_some();
    }
    if edits.get(&setting_id) == Some(&value) {
        return false;
    }
    edits.insert(setting_id, value);
    true
}

fn remove_all<K, V>(map: &mut IndexMap<K, V>, keys: impl Iterator<Item = K>) -> bool
where
    K: Hash + Eq,
{
    keys.fold(false, |changed, key| map.shift_remove(&key).is_some() || changed)
}

/// Runs `update` on a copy of one group's map and stores it back, pruning the
/// group when it ends up empty. Returns the input unchanged when `update`
/// reports no change.
fn update_group<K, V>(
    by_group: &Arc<ByGroup<IndexMap<K, V>>>,
    group_id: &str,
    update: impl FnOnce(&mut IndexMap<K, V>) -> bool,
) -> Arc<ByGroup<IndexMap<K, V>>>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    let mut group = by_group
        .get(group_id)
        .map(|group| (**group).clone())
        .unwrap_or_default();
    if !update(&mut group) {
        return Arc::clone(by_group);
    }
    let mut next = (**by_group).clone();
    if group.is_empty() {
        next.remove(group_id);
    } else {
        next.insert(group_id.to_owned(), Arc::new(group));
    }
    Arc::new(next)
}

fn remove_group<T>(by_group: &Arc<ByGroup<T>>, group_id: &str) -> Arc<ByGroup<T>> {
    if !by_group.contains_key(group_id) {
        return Arc::clone(by_group);
    }
    let mut next = (**by_group).clone();
    next.remove(group_id);
    Arc::new(next)
}
