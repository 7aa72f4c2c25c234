//! HONOR loyalty backend REST client.
//!
//! Every protected call goes through one request pipeline ([`LoyaltyClient::send`])
//! which:
//!
//! - attaches the held token as `Authorization: Bearer <token>`
//! - refuses to send anything when no session is held
//! - ends the session on `401 Unauthorized`, whichever operation triggered it
//! - maps other failures onto [`ApiError`]
//!
//! Resource operations live in per-resource modules as `impl LoyaltyClient`
//! blocks.

mod auth;
mod customers;
mod dashboard;
mod gifts;
mod redemptions;

pub use auth::Health;

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionManager;

/// Loyalty backend API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct LoyaltyClient {
    inner: Arc<LoyaltyClientInner>,
}

struct LoyaltyClientInner {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

/// Backend error body: `{"detail": "..."}` or, for request validation,
/// `{"detail": [{"msg": "...", ...}]}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl LoyaltyClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: Arc<SessionManager>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(LoyaltyClientInner {
                client,
                base_url: config.api_url.clone(),
                session,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.inner.session
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Request pipeline
    // =========================================================================

    /// Execute a GET request against a protected endpoint.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.inner.client.get(self.url(path));
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a GET request with query parameters.
    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let request = self.inner.client.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.inner.client.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a PUT request with a JSON body.
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.inner.client.put(self.url(path)).json(body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a DELETE request. The backend answers `204 No Content`.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.inner.client.delete(self.url(path));
        self.send(request).await?;
        Ok(())
    }

    /// Attach credentials, send, and apply the session policy to the response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let token = self
            .inner
            .session
            .token()
            .await
            .ok_or(ApiError::NotAuthenticated)?;

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.inner.session.expire(&token).await;
            return Err(ApiError::SessionExpired);
        }

        if status.is_success() {
            return Ok(response);
        }

        Err(parse_error(response).await)
    }
}

impl std::fmt::Debug for LoyaltyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoyaltyClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Map a non-success, non-401 response onto an [`ApiError`].
async fn parse_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let message = response
        .text()
        .await
        .map(|body| detail_message(&body))
        .unwrap_or_default();

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Falls back to the raw body when it is not JSON.
fn detail_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };

    match parsed.detail {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
