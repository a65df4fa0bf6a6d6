use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::notify::Notifier;
use super::session::SessionStore;

/// One API call as the client sees it. The bearer token is attached by the
/// [`ApiClient`], never by callers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// Transport seam; the HTTP client (or a test double) lives behind it.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> anyhow::Result<ApiResponse>;
}

/// The client's only path to the server. Reads the token from the one
/// session store and treats an authentication failure on a protected call
/// as an invalidation signal: the session is cleared (which is what drives
/// the navigation guard back to public) and the user is notified. All other
/// failures only notify.
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            session,
            notifier,
        }
    }

    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> anyhow::Result<ApiResponse> {
        let bearer = self.session.current().token().map(str::to_string);
        let attached_token = bearer.is_some();

        let response = self
            .transport
            .execute(ApiRequest {
                method,
                path: path.to_string(),
                bearer,
                body,
            })
            .await?;

        if attached_token
            && matches!(
                response.status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            )
        {
            warn!(%path, status = %response.status, "authenticated call rejected, invalidating session");
            self.session.invalidate().await?;
            self.notifier
                .notify(response.message().unwrap_or("Session expired"));
        } else if response.status.is_server_error() {
            self.notifier
                .notify(response.message().unwrap_or("Server error"));
        }

        Ok(response)
    }

    /// Login and store the returned token in the session on success.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<ApiResponse> {
        let response = self
            .dispatch(
                Method::POST,
                "/api/login",
                Some(json!({ "username": username, "password": password })),
            )
            .await?;

        if response.status == StatusCode::OK {
            if let Some(token) = response.body.get("token").and_then(Value::as_str) {
                self.session.set_token(token).await?;
                debug!(%username, "login succeeded, session established");
            }
        } else if let Some(message) = response.message() {
            self.notifier.notify(message);
        }

        Ok(response)
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.session.clear().await
    }
}
