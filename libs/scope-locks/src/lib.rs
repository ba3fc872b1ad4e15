#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]

//! Advisory locks scoped by hierarchical paths.
//!
//! A lock is requested for a *store* (a namespace, usually the name of the
//! data store doing the I/O) and a *scope*: a path such as
//! `["settings", "general"]` or `["settings", "general", "store_name"]`.
//!
//! - Shared locks on overlapping scopes coexist.
//! - An exclusive lock excludes every other lock on the same scope, on any
//!   scope nested under it, and on any scope it is nested under.
//!
//! The [`LockManager`] trait is the capability consumers depend on;
//! [`ScopedLockManager`] is the in-process implementation.
//!
//! ```ignore
//! use scope_locks::{LockManager, LockMode, LockScope, ScopedLockManager};
//!
//! let locks = ScopedLockManager::new();
//! let scope = LockScope::new(["settings", "general"]);
//! let handle = locks.acquire("my-store", &scope, LockMode::Exclusive).await;
//! // ... remote write ...
//! locks.release(handle);
//! ```

mod manager;
mod scope;

pub use manager::{LockManager, ScopedLockManager};
pub use scope::{LockHandle, LockMode, LockScope};
