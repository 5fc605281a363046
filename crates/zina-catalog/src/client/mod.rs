//! HTTP client for the external catalog REST API.
//!
//! Reads (`list_*`, `get_*`, `fetch_all_products`) never fail: when the API is
//! not configured or a request fails they serve the sample catalog and log a
//! warning. Each read has a `try_` twin that surfaces the error instead.
//! Writes always surface errors.

mod auth;
mod categories;
mod favorites;
mod products;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::envelope::normalize_record;
use crate::error::CatalogError;

pub use products::ProductPage;

/// Upper bound on pages walked by `fetch_all_products`.
pub(crate) const MAX_PAGES: u32 = 100;

/// Client for the catalog API.
///
/// Cloning is cheap and clones share the bearer token slot, so a `login` on
/// one clone is visible to the others. Use [`CatalogClient::scoped`] for a
/// client carrying a per-request token instead.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Option<Url>,
    token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Creates a client. `base_url: None` (or blank) puts it in offline mode.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`CatalogError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CatalogError> {
        let base_url = base_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(parse_base_url)
            .transpose()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// # Errors
    ///
    /// See [`CatalogClient::new`].
    pub fn from_app_config(config: &zina_core::AppConfig) -> Result<Self, CatalogError> {
        Self::new(
            config.catalog_api_url.as_deref(),
            config.catalog_timeout_secs,
            &config.catalog_user_agent,
        )
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// A client sharing this one's connection pool and base URL but with its
    /// own token slot holding `token`.
    #[must_use]
    pub fn scoped(&self, token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        let base = self.base_url.as_ref().ok_or(CatalogError::NotConfigured)?;
        base.join(path).map_err(|e| CatalogError::InvalidBaseUrl {
            url: format!("{base}{path}"),
            reason: e.to_string(),
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CatalogError> {
        let url = self.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    /// Sends the request with the current bearer token (if any) and returns
    /// the decoded JSON body. An empty 2xx body decodes to `Value::Null`.
    pub(crate) async fn execute(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<Value, CatalogError> {
        let builder = match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        send(builder, context).await
    }
}

pub(crate) async fn send(builder: RequestBuilder, context: &str) -> Result<Value, CatalogError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let err = error_from_body(status.as_u16(), &body);
        tracing::debug!(context, status = status.as_u16(), error = %err, "catalog API request failed");
        return Err(err);
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|source| CatalogError::Deserialize {
        context: context.to_string(),
        source,
    })
}

/// Decodes a single-record response, unwrapping the usual envelopes.
pub(crate) fn decode_record<T: DeserializeOwned>(
    body: Value,
    singular: &str,
    context: &str,
) -> Result<T, CatalogError> {
    let record = normalize_record(body, singular).unwrap_or(Value::Null);
    serde_json::from_value(record).map_err(|source| CatalogError::Deserialize {
        context: context.to_string(),
        source,
    })
}

fn parse_base_url(raw: &str) -> Result<Url, CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    // `Url::join` replaces the last path segment unless the base ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builds the error for a non-2xx response.
///
/// Field-level `errors: {field: [messages]}` win and become
/// [`CatalogError::Validation`]; otherwise the message comes from `message`,
/// then `error`, then a generic text.
pub(crate) fn error_from_body(status: u16, body: &str) -> CatalogError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some((field, message)) = parsed.as_ref().and_then(first_field_error) {
        return CatalogError::Validation { field, message };
    }

    let message = parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error"]
                .into_iter()
                .find_map(|key| v.get(key).and_then(Value::as_str))
        })
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("request failed with status {status}"), str::to_string);

    CatalogError::Status { status, message }
}

fn first_field_error(body: &Value) -> Option<(String, String)> {
    let errors = body.get("errors")?.as_object()?;
    errors.iter().find_map(|(field, messages)| {
        let message = match messages {
            Value::Array(items) => items.iter().find_map(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }?;
        Some((field.clone(), message.to_string()))
    })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
