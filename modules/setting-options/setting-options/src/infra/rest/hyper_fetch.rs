use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use setting_options_sdk::{ApiError, SettingsError};

use crate::config::SettingOptionsConfig;
use crate::domain::fetch::{ApiFetch, ApiRequest};

const JSON: &str = "application/json";
const BODY_PREVIEW_LIMIT: usize = 512;

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// [`ApiFetch`] over a hyper client with rustls, for both `https` and plain `http` origins.
#[derive(Clone)]
pub struct HyperFetch {
    client: HttpsClient,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl HyperFetch {
    /// # Errors
    /// Returns [`SettingsError::Config`] if the configuration is invalid or
    /// TLS cannot be set up.
    pub fn new(config: &SettingOptionsConfig) -> Result<Self, SettingsError> {
        config.validate()?;

        let provider = rustls::crypto::CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| std::sync::Arc::new(rustls::crypto::aws_lc_rs::default_provider()));
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(provider)
            .map_err(|e| SettingsError::config(format!("failed to set up TLS: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
        })
    }

    fn build_request(&self, request: &ApiRequest) -> Result<Request<Full<Bytes>>, SettingsError> {
        let mut builder = Request::builder()
            .method(http::Method::from(request.method))
            .uri(format!("{}{}", self.base_url, request.path))
            .header(ACCEPT, JSON)
            .header(USER_AGENT, &self.user_agent);
        let body = match &request.data {
            Some(data) => {
                builder = builder.header(CONTENT_TYPE, JSON);
                Bytes::from(serde_json::to_vec(data)?)
            }
            None => Bytes::new(),
        };
        builder
            .body(Full::new(body))
            .map_err(|e| SettingsError::transport(format!("invalid request: {e}")))
    }

    async fn exchange(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Bytes), SettingsError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SettingsError::transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SettingsError::transport(format!("failed to read response body: {e}")))?
            .to_bytes();
        Ok((status, body))
    }
}

#[async_trait]
impl ApiFetch for HyperFetch {
    async fn request(&self, request: ApiRequest) -> Result<Value, SettingsError> {
        let http_request = self.build_request(&request)?;
        tracing::debug!(method = %request.method, path = %request.path, "sending request");

        let (status, body) = tokio::time::timeout(self.timeout, self.exchange(http_request))
            .await
            .map_err(|_| SettingsError::Timeout {
                after: self.timeout,
            })??;

        if !status.is_success() {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                "request rejected"
            );
            return Err(error_from_response(status, &body));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// A structured REST error when the body carries one, otherwise the status and a preview of the body.
fn error_from_response(status: StatusCode, body: &[u8]) -> SettingsError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(error) if !error.code.is_empty() => SettingsError::Api {
            status: Some(status.as_u16()),
            error,
        },
        _ => SettingsError::Http {
            status: status.as_u16(),
            body_preview: String::from_utf8_lossy(&body[..body.len().min(BODY_PREVIEW_LIMIT)])
                .into_owned(),
        },
    }
}
