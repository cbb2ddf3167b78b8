//! HTTP client wrapper for the DocChat backend.
//!
//! [`ApiClient`] owns the `reqwest` client, the backend base URL, and the
//! optional bearer token, and attaches `Authorization: Bearer …` to every
//! authenticated call. Request/response endpoints live here; the streaming
//! assistant-creation upload lives in [`crate::create`].
//!
//! # Error Contract
//!
//! Failures map onto [`ApiError`]:
//! - `401` → [`ApiError::Unauthorized`] (expired or missing token; the CLI
//!   responds by advising a fresh `dc login`)
//! - `403` on assistant creation → [`ApiError::PlanLimit`]
//! - any other non-2xx → [`ApiError::Api`], with the message taken from
//!   the backend's JSON `detail` field when present
//! - transport failures → [`ApiError::Http`]
//! - creation-stream protocol failures → [`ApiError::Stream`]

use std::time::Duration;

use crate::config::Config;
use crate::models::{
    AdminUser, Assistant, ChatRequest, ChatResponse, LoginResponse,
};

/// Fixed user-facing message for the assistant plan limit (backend enforces
/// a maximum of 3 assistants per non-admin user).
pub const PLAN_LIMIT_MESSAGE: &str = "You have reached the maximum limit of 3 assistants. \
Please delete an existing assistant to create a new one.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not authenticated or session expired")]
    Unauthorized,
    #[error("{}", PLAN_LIMIT_MESSAGE)]
    PlanLimit,
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("creation stream error: {0}")]
    Stream(String),
    #[error("{0}")]
    InvalidInput(String),
}

pub struct ApiClient {
    /// Client for plain request/response calls, bounded by `api.timeout_secs`.
    pub(crate) http: reqwest::Client,
    /// Client for the creation stream. No timeout: ingestion of a large
    /// document may legitimately run for minutes (inherited behavior —
    /// a hung backend stream hangs the progress indicator).
    pub(crate) streaming: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config, token: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;
        let streaming = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            streaming,
            base_url: config.api.base_url.clone(),
            token,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, when one is held.
    pub(crate) fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    /// `POST /login` — form-encoded credentials, returns the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let form = [("username", username), ("password", password)];
        let resp = self.http.post(self.url("/login")).form(&form).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// `POST /create_user` — form-encoded credentials.
    pub async fn signup(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let form = [("username", username), ("password", password)];
        let resp = self
            .http
            .post(self.url("/create_user"))
            .form(&form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    /// `GET /assistants/` — the caller's assistants.
    pub async fn assistants(&self) -> Result<Vec<Assistant>, ApiError> {
        let resp = self
            .authed(self.http.get(self.url("/assistants/")))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// `DELETE /assistants/{id}` — no response body.
    pub async fn delete_assistant(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .authed(self.http.delete(self.url(&format!("/assistants/{}", id))))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    /// `POST /chat/` — one question, one answer with source pages.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let resp = self
            .authed(self.http.post(self.url("/chat/")).json(request))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// `GET /admin/users` — all users with their assistants (admin only).
    pub async fn admin_users(&self) -> Result<Vec<AdminUser>, ApiError> {
        let resp = self
            .authed(self.http.get(self.url("/admin/users")))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// `DELETE /admin/user/{id}` (admin only).
    pub async fn admin_delete_user(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .authed(self.http.delete(self.url(&format!("/admin/user/{}", id))))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    /// `DELETE /admin/assistant/{id}` (admin only).
    pub async fn admin_delete_assistant(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .authed(
                self.http
                    .delete(self.url(&format!("/admin/assistant/{}", id))),
            )
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    /// `POST /admin/grant-admin/{id}` (admin only). Returns the backend's
    /// confirmation message.
    pub async fn admin_grant_admin(&self, id: i64) -> Result<String, ApiError> {
        let resp = self
            .authed(
                self.http
                    .post(self.url(&format!("/admin/grant-admin/{}", id))),
            )
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let body: serde_json::Value = resp.json().await?;
        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("ok")
            .to_string())
    }
}

/// Map a non-2xx response to an [`ApiError`], pulling the human-readable
/// message out of the backend's `{"detail": "..."}` body when present.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    if status.as_u16() == 401 {
        return ApiError::Unauthorized;
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or(text);

    ApiError::Api {
        status: status.as_u16(),
        message,
    }
}
