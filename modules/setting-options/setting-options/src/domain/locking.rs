//! Lock and saving-flag guards used around every remote read and write.
//!
//! Both guards undo their effect on drop, so the lock is released and the
//! saving flag cleared on every exit path, including cancellation.

use std::sync::Arc;

use scope_locks::{LockHandle, LockManager, LockMode, LockScope};

use super::reducer::SettingOptionsAction;
use super::store::SettingOptionsStore;

const SETTINGS_SCOPE: &str = "settings";

/// `["settings", group]`
#[must_use]
pub fn group_scope(group_id: &str) -> LockScope {
    LockScope::new([SETTINGS_SCOPE, group_id])
}

/// `["settings", group, setting]`
#[must_use]
pub fn setting_scope(group_id: &str, setting_id: &str) -> LockScope {
    group_scope(group_id).child(setting_id)
}

/// An acquired lock, released exactly once when dropped.
pub struct HeldLock {
    manager: Arc<dyn LockManager>,
    handle: Option<LockHandle>,
}

impl HeldLock {
    pub async fn acquire(
        manager: Arc<dyn LockManager>,
        store: &str,
        scope: LockScope,
        mode: LockMode,
    ) -> Self {
        tracing::trace!(store, %scope, %mode, "acquiring lock");
        let handle = manager.acquire(store, &scope, mode).await;
        Self {
            manager,
            handle: Some(handle),
        }
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.manager.release(handle);
        }
    }
}

/// Sets a saving flag on creation and clears it when dropped.
pub struct SavingFlag {
    store: SettingOptionsStore,
    group_id: String,
    setting_id: Option<String>,
}

impl SavingFlag {
    pub fn raise(store: &SettingOptionsStore, group_id: &str, setting_id: Option<&str>) -> Self {
        let flag = Self {
            store: store.clone(),
            group_id: group_id.to_owned(),
            setting_id: setting_id.map(str::to_owned),
        };
        flag.set(true);
        flag
    }

    fn set(&self, is_saving: bool) {
        self.store.dispatch(SettingOptionsAction::SetSaving {
            group_id: self.group_id.clone(),
            setting_id: self.setting_id.clone(),
            is_saving,
        });
    }
}

impl Drop for SavingFlag {
    fn drop(&mut self) {
        self.set(false);
    }
}
