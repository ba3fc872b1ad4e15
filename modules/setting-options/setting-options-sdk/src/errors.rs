//! Error types for the setting-options SDK.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Structured error returned by the settings REST API.
#[derive(Error, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// One failed entry of a partially failed batch save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingFailure {
    pub id: String,
    pub error: ApiError,
}

/// Errors surfaced by the setting-options store.
///
/// Values are cloneable because they are also kept in the store's error
/// map and shared between every caller awaiting the same resolution.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    /// Structured REST error, from a non-2xx body or a failed batch entry.
    #[error("{error}")]
    Api {
        status: Option<u16>,
        error: ApiError,
    },

    /// Non-2xx response whose body is not a structured REST error.
    #[error("HTTP {status}: {body_preview}")]
    Http { status: u16, body_preview: String },

    /// The request never produced a response (connect, TLS, I/O).
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// Rejected locally before any request was made.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A batch save where some settings were rejected by the server.
    #[error("Failed to update some settings")]
    PartialBatch { setting_errors: Vec<SettingFailure> },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl SettingsError {
    #[must_use]
    pub fn api(error: ApiError) -> Self {
        Self::Api {
            status: None,
            error,
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Per-setting failures, present only when a batch save partially failed.
    #[must_use]
    pub fn setting_errors(&self) -> Option<&[SettingFailure]> {
        match self {
            Self::PartialBatch { setting_errors } => Some(setting_errors),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.setting_errors().is_some()
    }

    /// The structured REST error, if this error carries one.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_batch_exposes_setting_errors() {
        let err = SettingsError::PartialBatch {
            setting_errors: vec![SettingFailure {
                id: "woocommerce_currency".to_owned(),
                error: ApiError::new("rest_setting_value_invalid", "An invalid setting value was passed."),
            }],
        };

        assert_eq!(err.to_string(), "Failed to update some settings");
        assert!(err.is_partial());
        assert_eq!(err.setting_errors().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_total_failures_are_not_partial() {
        let err = SettingsError::transport("connection refused");
        assert!(!err.is_partial());
        assert!(err.setting_errors().is_none());
    }

    #[test]
    fn test_api_error_parses_rest_shape() {
        let err: ApiError = serde_json::from_value(json!({
            "code": "rest_setting_setting_invalid",
            "message": "Invalid setting.",
            "data": { "status": 404 }
        }))
        .unwrap();

        assert_eq!(err.code, "rest_setting_setting_invalid");
        assert_eq!(err.data, Some(json!({ "status": 404 })));
        assert_eq!(
            SettingsError::api(err).to_string(),
            "Invalid setting. (rest_setting_setting_invalid)"
        );
    }
}
