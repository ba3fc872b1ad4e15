//! Test doubles for the store's collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use scope_locks::{LockHandle, LockManager, LockMode, LockScope, ScopedLockManager};
use serde_json::{Value, json};
use setting_options_sdk::SettingsError;
use tokio::sync::Semaphore;

use super::fetch::{ApiFetch, ApiMethod, ApiRequest};
use super::store::SettingOptionsStore;
use crate::config::SettingOptionsConfig;

type Responder = Box<dyn Fn(&ApiRequest) -> Result<Value, SettingsError> + Send + Sync>;

/// Scripted [`ApiFetch`] that records every request.
pub(crate) struct MockFetch {
    responder: Responder,
    calls: Mutex<Vec<ApiRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockFetch {
    pub(crate) fn new(
        responder: impl Fn(&ApiRequest) -> Result<Value, SettingsError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Holds every response until [`MockFetch::open`] grants a permit.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub(crate) fn open(&self, responses: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(responses);
        }
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Yields until `count` requests were sent.
    pub(crate) async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }
}

#[async_trait]
impl ApiFetch for MockFetch {
    async fn request(&self, request: ApiRequest) -> Result<Value, SettingsError> {
        self.calls.lock().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        (self.responder)(&request)
    }
}

/// Responds by `(method, path)`; anything else is a 404.
pub(crate) fn routes(
    table: Vec<(ApiMethod, &'static str, Result<Value, SettingsError>)>,
) -> impl Fn(&ApiRequest) -> Result<Value, SettingsError> + Send + Sync + 'static {
    move |request| {
        table
            .iter()
            .find(|(method, path, _)| *method == request.method && *path == request.path)
            .map_or_else(
                || {
                    Err(SettingsError::Http {
                        status: 404,
                        body_preview: format!("no route for {} {}", request.method, request.path),
                    })
                },
                |(_, _, response)| response.clone(),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LockEvent {
    Acquired { scope: String, mode: LockMode },
    Released { scope: String, mode: LockMode },
}

/// Real [`ScopedLockManager`] that also logs every acquire and release.
#[derive(Default)]
pub(crate) struct RecordingLocks {
    inner: ScopedLockManager,
    events: Mutex<Vec<LockEvent>>,
}

impl RecordingLocks {
    pub(crate) fn events(&self) -> Vec<LockEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn releases(&self, scope: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, LockEvent::Released { scope: s, .. } if s == scope))
            .count()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.inner.active_count()
    }
}

#[async_trait]
impl LockManager for RecordingLocks {
    async fn acquire(&self, store: &str, scope: &LockScope, mode: LockMode) -> LockHandle {
        let handle = self.inner.acquire(store, scope, mode).await;
        self.events.lock().push(LockEvent::Acquired {
            scope: scope.to_string(),
            mode,
        });
        handle
    }

    fn release(&self, handle: LockHandle) {
        self.events.lock().push(LockEvent::Released {
            scope: handle.scope().to_string(),
            mode: handle.mode(),
        });
        self.inner.release(handle);
    }
}

pub(crate) struct Harness {
    pub(crate) store: SettingOptionsStore,
    pub(crate) fetch: Arc<MockFetch>,
    pub(crate) locks: Arc<RecordingLocks>,
}

pub(crate) fn harness(
    responder: impl Fn(&ApiRequest) -> Result<Value, SettingsError> + Send + Sync + 'static,
) -> Harness {
    harness_with(MockFetch::new(responder))
}

pub(crate) fn harness_with(fetch: MockFetch) -> Harness {
    let fetch = Arc::new(fetch);
    let locks = Arc::new(RecordingLocks::default());
    let store = SettingOptionsStore::new(
        &SettingOptionsConfig::default(),
        Arc::clone(&fetch) as Arc<dyn ApiFetch>,
        Arc::clone(&locks) as Arc<dyn LockManager>,
    );
    Harness {
        store,
        fetch,
        locks,
    }
}

pub(crate) fn setting_json(id: &str, value: Value) -> Value {
    json!({ "id": id, "label": id, "type": "text", "value": value })
}

/// Settings of the `general` group as served by the mock API.
pub(crate) fn general_settings() -> Value {
    json!([
        setting_json("woocommerce_store_address", json!("60 29th Street")),
        setting_json("woocommerce_store_city", json!("San Francisco")),
        setting_json("woocommerce_currency", json!("USD")),
    ])
}

pub(crate) const GENERAL: &str = "/wc-admin/settings/general";
