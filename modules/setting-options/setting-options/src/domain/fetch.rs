//! HTTP collaborator seam and the REST paths the store talks to.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use setting_options_sdk::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Put,
    Post,
}

impl ApiMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ApiMethod> for http::Method {
    fn from(method: ApiMethod) -> Self {
        match method {
            ApiMethod::Get => Self::GET,
            ApiMethod::Put => Self::PUT,
            ApiMethod::Post => Self::POST,
        }
    }
}

/// One REST call: a path relative to the API base URL, a method and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub method: ApiMethod,
    pub data: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: ApiMethod::Get,
            data: None,
        }
    }

    pub fn put(path: impl Into<String>, data: Value) -> Self {
        Self {
            path: path.into(),
            method: ApiMethod::Put,
            data: Some(data),
        }
    }

    pub fn post(path: impl Into<String>, data: Value) -> Self {
        Self {
            path: path.into(),
            method: ApiMethod::Post,
            data: Some(data),
        }
    }
}

/// Generic JSON request function used by resolvers and actions.
///
/// Implementations must reject non-2xx responses and transport failures.
#[async_trait]
pub trait ApiFetch: Send + Sync {
    async fn request(&self, request: ApiRequest) -> Result<Value, SettingsError>;
}

/// Builds the settings REST paths. Ids are percent-encoded as path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    namespace: String,
    groups_path: String,
}

impl Endpoints {
    pub fn new(namespace: impl Into<String>, groups_path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().trim_end_matches('/').to_owned(),
            groups_path: groups_path.into(),
        }
    }

    #[must_use]
    pub fn groups(&self) -> String {
        self.groups_path.clone()
    }

    #[must_use]
    pub fn group(&self, group_id: &str) -> String {
        format!(
            "{}/settings/{}",
            self.namespace,
            urlencoding::encode(group_id)
        )
    }

    #[must_use]
    pub fn setting(&self, group_id: &str, setting_id: &str) -> String {
        format!(
            "{}/{}",
            self.group(group_id),
            urlencoding::encode(setting_id)
        )
    }

    #[must_use]
    pub fn batch(&self, group_id: &str) -> String {
        format!("{}/batch", self.group(group_id))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_namespace() {
        let endpoints = Endpoints::new("/wc-admin/", "/wc/v3/settings");

        assert_eq!(endpoints.groups(), "/wc/v3/settings");
        assert_eq!(endpoints.group("general"), "/wc-admin/settings/general");
        assert_eq!(
            endpoints.setting("general", "woocommerce_store_city"),
            "/wc-admin/settings/general/woocommerce_store_city"
        );
        assert_eq!(endpoints.batch("general"), "/wc-admin/settings/general/batch");
    }

    #[test]
    fn test_ids_are_percent_encoded() {
        let endpoints = Endpoints::new("/wc-admin", "/wc/v3/settings");
        assert_eq!(
            endpoints.setting("tax rates", "a/b"),
            "/wc-admin/settings/tax%20rates/a%2Fb"
        );
    }

    #[test]
    fn test_method_maps_to_http() {
        assert_eq!(http::Method::from(ApiMethod::Put), http::Method::PUT);
        assert_eq!(ApiMethod::Post.to_string(), "POST");
    }
}
