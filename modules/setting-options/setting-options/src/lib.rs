#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Setting Options store
//!
//! A normalized client-side cache of remote settings groups with optimistic
//! local edits, save-state tracking, per-setting and per-group errors, and
//! advisory locking around every remote read and write.
//!
//! The public contract is defined in `setting-options-sdk` and re-exported here.
//!
//! ```ignore
//! let config = SettingOptionsConfig::default();
//! let store = SettingOptionsStore::new(
//!     &config,
//!     Arc::new(HyperFetch::new(&config)?),
//!     Arc::new(ScopedLockManager::new()),
//! );
//! store.edit_setting("general", "woocommerce_store_city", "Berlin".into()).await?;
//! store.save_edited_setting("general", "woocommerce_store_city").await?;
//! ```

pub use setting_options_sdk::{
    ApiError, ReadOptions, Setting, SettingFailure, SettingOptionsApi, SettingType,
    SettingUpdate, SettingUpdates, SettingValue, SettingsError, SettingsGroup,
};

pub mod config;
pub mod domain;
pub mod infra;
pub mod local_client;

pub use config::SettingOptionsConfig;
pub use domain::fetch::{ApiFetch, ApiMethod, ApiRequest};
pub use domain::reducer::{SettingOptionsAction, reduce};
pub use domain::selectors::{Selection, Selectors};
pub use domain::state::{ErrorKey, SavingState, SettingOptionsState};
pub use domain::store::{ResolverKey, SettingOptionsStore};
pub use infra::rest::HyperFetch;
pub use local_client::LocalClient;
