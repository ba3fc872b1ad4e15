use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::scope::{LockHandle, LockMode, LockScope};

/// Advisory lock capability.
///
/// Implementations must guarantee that an exclusive lock excludes every other
/// lock of the same store on the same scope, on any descendant scope and on
/// any ancestor scope. Shared locks on overlapping scopes may coexist.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Waits until the lock can be granted and returns its handle.
    async fn acquire(&self, store: &str, scope: &LockScope, mode: LockMode) -> LockHandle;

    /// Releases a previously granted lock and wakes up compatible waiters.
    fn release(&self, handle: LockHandle);
}

/// In-process [`LockManager`] with FIFO wake-up of queued requests.
///
/// `ScopedLockManager` is `Clone + Send + Sync`; clones share the same lock table.
#[derive(Clone, Default)]
pub struct ScopedLockManager {
    table: Arc<Mutex<LockTable>>,
}

#[derive(Default)]
struct LockTable {
    next_id: u64,
    active: Vec<ActiveLock>,
    pending: VecDeque<PendingRequest>,
}

struct ActiveLock {
    id: u64,
    store: String,
    scope: LockScope,
    mode: LockMode,
}

struct PendingRequest {
    store: String,
    scope: LockScope,
    mode: LockMode,
    grant: oneshot::Sender<LockHandle>,
}

impl LockTable {
    fn conflicts(&self, store: &str, scope: &LockScope, mode: LockMode) -> bool {
        self.active.iter().any(|lock| {
            lock.store == store
                && (mode.is_exclusive() || lock.mode.is_exclusive())
                && lock.scope.overlaps(scope)
        })
    }

    fn grant(&mut self, store: &str, scope: &LockScope, mode: LockMode) -> LockHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(ActiveLock {
            id,
            store: store.to_owned(),
            scope: scope.clone(),
            mode,
        });
        LockHandle::new(id, store, scope.clone(), mode)
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|lock| lock.id != id);
        self.active.len() != before
    }

    /// Grants every queued request that no longer conflicts, in arrival order.
    fn drain_pending(&mut self) {
        let mut waiting = VecDeque::with_capacity(self.pending.len());
        while let Some(request) = self.pending.pop_front() {
            if request.grant.is_closed() {
                continue;
            }
            if self.conflicts(&request.store, &request.scope, request.mode) {
                waiting.push_back(request);
                continue;
            }
            let handle = self.grant(&request.store, &request.scope, request.mode);
            let id = handle.id;
            tracing::trace!(store = %request.store, scope = %request.scope, mode = %request.mode, id, "queued lock granted");
            if request.grant.send(handle).is_err() {
                // Waiter vanished between the closed-check and the send.
                self.remove(id);
            }
        }
        self.pending = waiting;
    }
}

impl ScopedLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently granted locks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.table.lock().active.len()
    }

    /// Number of requests waiting for a conflicting lock to be released.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.table
            .lock()
            .pending
            .iter()
            .filter(|request| !request.grant.is_closed())
            .count()
    }

    fn grant_or_enqueue(
        &self,
        store: &str,
        scope: &LockScope,
        mode: LockMode,
    ) -> Result<LockHandle, oneshot::Receiver<LockHandle>> {
        let mut table = self.table.lock();
        if !table.conflicts(store, scope, mode) {
            let handle = table.grant(store, scope, mode);
            tracing::trace!(store, %scope, %mode, id = handle.id, "lock granted");
            return Ok(handle);
        }

        let (grant, receiver) = oneshot::channel();
        table.pending.push_back(PendingRequest {
            store: store.to_owned(),
            scope: scope.clone(),
            mode,
            grant,
        });
        tracing::trace!(store, %scope, %mode, "lock request queued");
        Err(receiver)
    }
}

/// Receiving end of a queued request. If the acquiring future is dropped after
/// the grant was sent but before it was observed, the lock is released here.
struct PendingGrant<'a> {
    receiver: oneshot::Receiver<LockHandle>,
    manager: &'a ScopedLockManager,
}

impl Drop for PendingGrant<'_> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Ok(handle) = self.receiver.try_recv() {
            self.manager.release(handle);
        }
    }
}

#[async_trait]
impl LockManager for ScopedLockManager {
    async fn acquire(&self, store: &str, scope: &LockScope, mode: LockMode) -> LockHandle {
        loop {
            let receiver = match self.grant_or_enqueue(store, scope, mode) {
                Ok(handle) => return handle,
                Err(receiver) => receiver,
            };
            let mut pending = PendingGrant {
                receiver,
                manager: self,
            };
            if let Ok(handle) = (&mut pending.receiver).await {
                return handle;
            }
        }
    }

    fn release(&self, handle: LockHandle) {
        let mut table = self.table.lock();
        if !table.remove(handle.id) {
            tracing::warn!(store = %handle.store, scope = %handle.scope, id = handle.id, "release of unknown lock ignored");
            return;
        }
        tracing::trace!(store = %handle.store, scope = %handle.scope, id = handle.id, "lock released");
        table.drain_pending();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    const STORE: &str = "test-store";

    fn group() -> LockScope {
        LockScope::new(["settings", "general"])
    }

    fn setting() -> LockScope {
        group().child("store_name")
    }

    async fn try_acquire(
        locks: &ScopedLockManager,
        scope: &LockScope,
        mode: LockMode,
    ) -> Option<LockHandle> {
        tokio::time::timeout(Duration::from_millis(20), locks.acquire(STORE, scope, mode))
            .await
            .ok()
    }

    #[tokio::test]
    async fn test_shared_locks_coexist() {
        let locks = ScopedLockManager::new();
        let first = locks.acquire(STORE, &group(), LockMode::Shared).await;
        let second = try_acquire(&locks, &group(), LockMode::Shared).await;
        let nested = try_acquire(&locks, &setting(), LockMode::Shared).await;

        assert!(second.is_some());
        assert!(nested.is_some());
        assert_eq!(locks.active_count(), 3);

        locks.release(first);
        locks.release(second.unwrap());
        locks.release(nested.unwrap());
        assert_eq!(locks.active_count(), 0);
    }

    #[tokio::test]
    async fn test_exclusive_excludes_same_scope() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        assert!(try_acquire(&locks, &group(), LockMode::Shared).await.is_none());
        assert!(try_acquire(&locks, &group(), LockMode::Exclusive).await.is_none());

        locks.release(held);
        assert!(try_acquire(&locks, &group(), LockMode::Shared).await.is_some());
    }

    #[tokio::test]
    async fn test_group_exclusive_excludes_nested_setting() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        assert!(try_acquire(&locks, &setting(), LockMode::Shared).await.is_none());

        locks.release(held);
        assert!(try_acquire(&locks, &setting(), LockMode::Shared).await.is_some());
    }

    #[tokio::test]
    async fn test_setting_lock_blocks_group_exclusive() {
        let locks = ScopedLockManager::new();
        let _held = locks.acquire(STORE, &setting(), LockMode::Shared).await;

        assert!(try_acquire(&locks, &group(), LockMode::Exclusive).await.is_none());
        assert!(try_acquire(&locks, &group(), LockMode::Shared).await.is_some());
    }

    #[tokio::test]
    async fn test_sibling_scopes_and_stores_are_independent() {
        let locks = ScopedLockManager::new();
        let _held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        let sibling = LockScope::new(["settings", "products"]);
        assert!(try_acquire(&locks, &sibling, LockMode::Exclusive).await.is_some());

        let other_store = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire("other-store", &group(), LockMode::Exclusive),
        )
        .await;
        assert!(other_store.is_ok());
    }

    #[tokio::test]
    async fn test_queued_request_granted_on_release() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(STORE, &setting(), LockMode::Exclusive).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        assert_eq!(locks.pending_count(), 1);

        locks.release(held);
        let handle = tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter should be woken")
            .unwrap();
        assert_eq!(handle.scope(), &setting());
        assert_eq!(locks.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_release_wakes_all_compatible_waiters() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let locks = locks.clone();
                tokio::spawn(async move { locks.acquire(STORE, &setting(), LockMode::Shared).await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;

        locks.release(held);
        for reader in readers {
            tokio::time::timeout(Duration::from_millis(100), reader)
                .await
                .expect("reader should be woken")
                .unwrap();
        }
        assert_eq!(locks.active_count(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_leak() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Exclusive).await;

        assert!(try_acquire(&locks, &group(), LockMode::Exclusive).await.is_none());

        locks.release(held);
        assert_eq!(locks.active_count(), 0);
        assert!(try_acquire(&locks, &group(), LockMode::Exclusive).await.is_some());
    }

    #[tokio::test]
    async fn test_release_of_unknown_handle_is_ignored() {
        let locks = ScopedLockManager::new();
        let held = locks.acquire(STORE, &group(), LockMode::Shared).await;

        locks.release(LockHandle::new(999, STORE, group(), LockMode::Shared));
        assert_eq!(locks.active_count(), 1);

        locks.release(held);
        assert_eq!(locks.active_count(), 0);
    }
}
