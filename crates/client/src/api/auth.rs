//! Staff authentication.

use honor_loyalty_core::StaffMember;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{LoyaltyClient, detail_message};
use crate::error::ApiError;
use crate::session::Screen;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Form body for `POST /auth/login`.
#[derive(Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

/// Response from `POST /auth/login`.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
}

impl LoyaltyClient {
    /// Log a staff member in.
    ///
    /// Submits the credentials form-encoded. On success the issued token is
    /// handed to the session, which decodes and persists it; the returned
    /// [`Screen`] tells the caller where to go next.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` if the backend rejects the
    /// credentials. Nothing is persisted and the previous session (if any) is
    /// untouched.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Screen, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("/auth/login"))
            .form(&LoginForm {
                username,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            return self
                .inner
                .session
                .establish(SecretString::from(token.access_token))
                .await;
        }

        let detail = response
            .text()
            .await
            .map(|body| detail_message(&body))
            .unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::BAD_REQUEST
            || status == StatusCode::UNPROCESSABLE_ENTITY
        {
            tracing::warn!(%status, "Login rejected");
            let message = if detail.is_empty() {
                INVALID_CREDENTIALS.to_string()
            } else {
                detail
            };
            return Err(ApiError::InvalidCredentials(message));
        }

        Err(ApiError::Server {
            status: status.as_u16(),
            message: detail,
        })
    }

    /// Log out locally. No server round trip.
    pub async fn logout(&self) -> Screen {
        self.inner.session.logout().await
    }

    /// Fetch the authoritative record of the logged-in staff member.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<StaffMember, ApiError> {
        self.get("/auth/me").await
    }

    /// Unauthenticated liveness probe.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the backend is unreachable.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<Health, ApiError> {
        let response = self.inner.client.get(self.url("/health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: "health check failed".to_string(),
            });
        }
        Ok(response.json().await?)
    }
}
