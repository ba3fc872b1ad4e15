#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Setting Options SDK
//!
//! This crate provides the public contract of the setting-options store:
//! - `SettingOptionsApi` trait for consumers that read and persist settings
//! - Model types (`SettingsGroup`, `Setting`, `SettingValue`, `SettingUpdates`, ...)
//! - Error type (`SettingsError`) and the REST error shape (`ApiError`)
//!
//! ```ignore
//! let value = client.get_setting_value("general", "store_name", ReadOptions::with_edits()).await?;
//! client.edit_setting("general", "store_name", "Acme".into()).await?;
//! client.save_edited_setting("general", "store_name").await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::SettingOptionsApi;
pub use errors::{ApiError, SettingFailure, SettingsError};
pub use models::{
    BatchUpdateEntry, BatchUpdateRequest, BatchUpdateResponse, ReadOptions, Setting,
    SettingType, SettingUpdate, SettingUpdates, SettingValue, SettingsGroup,
};
