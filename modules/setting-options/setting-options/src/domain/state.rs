//! Shape of the store's state tree.
//!
//! Every branch sits behind an `Arc` so that the reducer can copy on write and
//! consumers can detect changes with `Arc::ptr_eq` instead of deep comparison.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use setting_options_sdk::{Setting, SettingValue, SettingsError, SettingsGroup};

/// Canonical settings of one group, in server order.
pub type GroupSettings = IndexMap<String, Arc<Setting>>;

/// Pending edits of one group, in edit order.
pub type GroupEdits = IndexMap<String, SettingValue>;

/// Errors of one group, keyed by setting id or [`ErrorKey::All`].
pub type GroupErrors = IndexMap<ErrorKey, SettingsError>;

/// Per-setting saving flags of one group.
pub type GroupSavingFlags = IndexMap<String, bool>;

/// Outer map keyed by group id.
pub type ByGroup<T> = BTreeMap<String, Arc<T>>;

/// Key of an entry in a group's error map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKey {
    /// Group-wide failure, e.g. the whole batch request failed.
    All,
    Setting(String),
}

impl ErrorKey {
    pub fn setting(id: impl Into<String>) -> Self {
        Self::Setting(id.into())
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Setting(id) => f.write_str(id),
        }
    }
}

/// In-flight saves at group and setting granularity. The two levels are independent.
#[derive(Debug, Clone, Default)]
pub struct SavingState {
    pub groups: Arc<BTreeMap<String, bool>>,
    pub settings: Arc<ByGroup<GroupSavingFlags>>,
}

/// The whole store state.
///
/// Invariant: `edits` and `errors` never hold an empty group map; a group
/// with nothing pending has no key at all.
#[derive(Debug, Clone, Default)]
pub struct SettingOptionsState {
    pub groups: Arc<Vec<SettingsGroup>>,
    pub settings: Arc<ByGroup<GroupSettings>>,
    pub edits: Arc<ByGroup<GroupEdits>>,
    pub errors: Arc<ByGroup<GroupErrors>>,
    pub is_saving: SavingState,
}

impl SettingOptionsState {
    /// True if both states share every branch by reference.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.groups, &other.groups)
            && Arc::ptr_eq(&self.settings, &other.settings)
            && Arc::ptr_eq(&self.edits, &other.edits)
            && Arc::ptr_eq(&self.errors, &other.errors)
            && Arc::ptr_eq(&self.is_saving.groups, &other.is_saving.groups)
            && Arc::ptr_eq(&self.is_saving.settings, &other.is_saving.settings)
    }
}
