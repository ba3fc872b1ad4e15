//! Store host: owns the state, dispatches actions through the reducer, and
//! runs each resolver at most once per argument tuple.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use scope_locks::{LockManager, LockMode, LockScope};
use serde::de::DeserializeOwned;
use setting_options_sdk::{ReadOptions, Setting, SettingValue, SettingsError, SettingsGroup};
use tokio::sync::{OnceCell, watch};

use super::fetch::{ApiFetch, ApiRequest, Endpoints};
use super::locking::HeldLock;
use super::reducer::{SettingOptionsAction, reduce};
use super::selectors::{Selection, Selectors};
use super::state::{GroupSettings, SettingOptionsState};
use crate::config::SettingOptionsConfig;

/// Argument tuple of a resolver. Each distinct key resolves at most once
/// until invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolverKey {
    Groups,
    Settings(String),
    /// Also covers setting-value reads.
    Setting(String, String),
}

impl ResolverKey {
    pub fn settings(group_id: impl Into<String>) -> Self {
        Self::Settings(group_id.into())
    }

    pub fn setting(group_id: impl Into<String>, setting_id: impl Into<String>) -> Self {
        Self::Setting(group_id.into(), setting_id.into())
    }
}

impl fmt::Display for ResolverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Groups => f.write_str("getGroups()"),
            Self::Settings(group_id) => write!(f, "getSettings({group_id})"),
            Self::Setting(group_id, setting_id) => write!(f, "getSetting({group_id}, {setting_id})"),
        }
    }
}

type Resolution = OnceCell<Result<(), SettingsError>>;

struct StoreInner {
    state: watch::Sender<Arc<SettingOptionsState>>,
    selectors: Selectors,
    resolutions: Mutex<HashMap<ResolverKey, Arc<Resolution>>>,
    fetch: Arc<dyn ApiFetch>,
    locks: Arc<dyn LockManager>,
    endpoints: Endpoints,
    store_name: String,
}

/// The setting-options store. Clones share the same state.
#[derive(Clone)]
pub struct SettingOptionsStore {
    inner: Arc<StoreInner>,
}

impl SettingOptionsStore {
    pub fn new(
        config: &SettingOptionsConfig,
        fetch: Arc<dyn ApiFetch>,
        locks: Arc<dyn LockManager>,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(SettingOptionsState::default()));
        Self {
            inner: Arc::new(StoreInner {
                state,
                selectors: Selectors::new(),
                resolutions: Mutex::new(HashMap::new()),
                fetch,
                locks,
                endpoints: Endpoints::new(&config.namespace, &config.groups_path),
                store_name: config.store_name.clone(),
            }),
        }
    }

    /// Lock namespace used for every lock this store takes.
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.inner.store_name
    }

    /// Folds `action` into the state. Subscribers are notified only if a
    /// branch of the state actually changed.
    pub fn dispatch(&self, action: SettingOptionsAction) {
        self.inner.state.send_if_modified(|current| {
            let next = reduce(current, action);
            if next.same_as(current) {
                return false;
            }
            *current = Arc::new(next);
            true
        });
    }

    #[must_use]
    pub fn state(&self) -> Arc<SettingOptionsState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SettingOptionsState>> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn selectors(&self) -> &Selectors {
        &self.inner.selectors
    }

    /// Selectors over the current snapshot. Does not trigger resolution.
    #[must_use]
    pub fn select(&self) -> Selection<'_> {
        Selection::new(self.state(), &self.inner.selectors)
    }

    // Resolution

    /// Resolves the group list, then returns it.
    ///
    /// # Errors
    /// The resolver's failure, cached until the key is invalidated.
    pub async fn resolve_groups(&self) -> Result<Arc<Vec<SettingsGroup>>, SettingsError> {
        self.ensure_resolved(&ResolverKey::Groups).await?;
        Ok(Arc::clone(&self.state().groups))
    }

    /// # Errors
    /// The resolver's failure, cached until the key is invalidated.
    pub async fn resolve_settings(
        &self,
        group_id: &str,
        options: ReadOptions,
    ) -> Result<Arc<GroupSettings>, SettingsError> {
        self.ensure_resolved(&ResolverKey::settings(group_id)).await?;
        Ok(self.select().settings(group_id, options))
    }

    /// # Errors
    /// The resolver's failure, cached until the key is invalidated.
    pub async fn resolve_setting(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<Arc<Setting>>, SettingsError> {
        self.ensure_resolved(&ResolverKey::setting(group_id, setting_id))
            .await?;
        Ok(self.select().setting(group_id, setting_id, options))
    }

    /// # Errors
    /// The resolver's failure, cached until the key is invalidated.
    pub async fn resolve_setting_value(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Result<Option<SettingValue>, SettingsError> {
        self.ensure_resolved(&ResolverKey::setting(group_id, setting_id))
            .await?;
        Ok(self
            .select()
            .setting_value(group_id, setting_id, options)
            .cloned())
    }

    #[must_use]
    pub fn has_started_resolution(&self, key: &ResolverKey) -> bool {
        self.inner.resolutions.lock().contains_key(key)
    }

    #[must_use]
    pub fn has_finished_resolution(&self, key: &ResolverKey) -> bool {
        self.inner
            .resolutions
            .lock()
            .get(key)
            .is_some_and(|resolution| resolution.initialized())
    }

    /// Forgets the outcome for `key`; the next read resolves again.
    pub fn invalidate_resolution(&self, key: &ResolverKey) {
        self.inner.resolutions.lock().remove(key);
    }

    pub fn invalidate_resolution_for_store(&self) {
        self.inner.resolutions.lock().clear();
    }

    // Triggering reads

    /// Current groups. Starts resolving them in the background on first read.
    #[must_use]
    pub fn groups(&self) -> Arc<Vec<SettingsGroup>> {
        self.trigger(ResolverKey::Groups);
        Arc::clone(&self.state().groups)
    }

    #[must_use]
    pub fn settings(&self, group_id: &str, options: ReadOptions) -> Arc<GroupSettings> {
        self.trigger(ResolverKey::settings(group_id));
        self.select().settings(group_id, options)
    }

    #[must_use]
    pub fn setting(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Option<Arc<Setting>> {
        self.trigger(ResolverKey::setting(group_id, setting_id));
        self.select().setting(group_id, setting_id, options)
    }

    #[must_use]
    pub fn setting_value(
        &self,
        group_id: &str,
        setting_id: &str,
        options: ReadOptions,
    ) -> Option<SettingValue> {
        self.trigger(ResolverKey::setting(group_id, setting_id));
        self.select()
            .setting_value(group_id, setting_id, options)
            .cloned()
    }

    /// Runs the resolver for `key` unless it already ran. Concurrent callers
    /// share one run and all observe its outcome.
    pub(crate) async fn ensure_resolved(&self, key: &ResolverKey) -> Result<(), SettingsError> {
        let resolution = self.resolution(key);
        resolution
            .get_or_init(|| self.run_resolver(key))
            .await
            .clone()
    }

    fn resolution(&self, key: &ResolverKey) -> Arc<Resolution> {
        let mut resolutions = self.inner.resolutions.lock();
        Arc::clone(resolutions.entry(key.clone()).or_default())
    }

    async fn run_resolver(&self, key: &ResolverKey) -> Result<(), SettingsError> {
        match key {
            ResolverKey::Groups => self.fetch_groups().await,
            ResolverKey::Settings(group_id) => self.fetch_settings(group_id).await,
            ResolverKey::Setting(group_id, setting_id) => {
                self.fetch_setting(group_id, setting_id).await
            }
        }
    }

    fn trigger(&self, key: ResolverKey) {
        if self.has_started_resolution(&key) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(%key, "no runtime, skipping background resolution");
            return;
        };
        self.resolution(&key);
        let store = self.clone();
        runtime.spawn(async move {
            if let Err(error) = store.ensure_resolved(&key).await {
                tracing::debug!(%key, %error, "background resolution failed");
            }
        });
    }

    // Collaborators

    pub(crate) fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    pub(crate) async fn lock(&self, scope: LockScope, mode: LockMode) -> HeldLock {
        HeldLock::acquire(
            Arc::clone(&self.inner.locks),
            &self.inner.store_name,
            scope,
            mode,
        )
        .await
    }

    /// Sends `request` and decodes the response body as `T`.
    pub(crate) async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, SettingsError> {
        let body = self.inner.fetch.request(request).await?;
        Ok(serde_json::from_value(body)?)
    }
}
