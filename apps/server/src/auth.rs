use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AuthConfig;
use crate::main_lib::AppState;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Absent when the backend still waits for email confirmation.
    pub access_token: Option<String>,
    pub user: AppUser,
}

#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    NotConfigured,
    Rejected { status: u16, message: String },
    Upstream(String),
}

/// Email/password sign-up and sign-in against an external identity service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

/// Client for a GoTrue-compatible hosted auth backend.
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl HostedAuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        }
    }

    async fn post(&self, path: &str, credentials: &Credentials) -> Result<Value, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&CredentialsBody {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("Auth backend unreachable: {e}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Upstream(format!("Unreadable auth response: {e}")))?;

        if status.is_success() {
            return Ok(body);
        }
        if is_invalid_grant(&body) {
            return Err(AuthError::InvalidCredentials);
        }
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl AuthProvider for HostedAuthClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = self.post("/auth/v1/signup", credentials).await?;
        parse_session(body)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = self
            .post("/auth/v1/token?grant_type=password", credentials)
            .await?;
        parse_session(body)
    }
}

/// Accepts either a full session or the bare user returned by a sign-up that
/// awaits confirmation.
fn parse_session(body: Value) -> Result<Session, AuthError> {
    let access_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    let user_value = match body.get("user") {
        Some(user) => user.clone(),
        None => body,
    };
    let remote: RemoteUser = serde_json::from_value(user_value)
        .map_err(|e| AuthError::Upstream(format!("Unexpected auth response: {e}")))?;

    let email = remote.email.unwrap_or_default();
    let username = remote
        .user_metadata
        .get("username")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(Session {
        access_token,
        user: AppUser {
            id: remote.id,
            username,
            email,
        },
    })
}

fn is_invalid_grant(body: &Value) -> bool {
    let field = |name: &str| body.get(name).and_then(Value::as_str);
    field("error") == Some("invalid_grant") || field("error_code") == Some("invalid_credentials")
}

fn error_message(body: &Value) -> String {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|name| body.get(*name).and_then(Value::as_str))
        .unwrap_or("Authentication failed")
        .to_string()
}

#[derive(Serialize)]
struct AuthErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            AuthError::NotConfigured => (
                StatusCode::NOT_IMPLEMENTED,
                "Authentication is not configured for this server".to_string(),
            ),
            AuthError::Rejected { status, message } => (
                StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            ),
            AuthError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        let body = Json(AuthErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

fn provider(state: &AppState) -> Result<Arc<dyn AuthProvider>, AuthError> {
    state.auth.clone().ok_or(AuthError::NotConfigured)
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<Json<Session>, AuthError> {
    let session = provider(&state)?
        .sign_up(&payload)
        .await
        .inspect_err(|e| tracing::warn!("Error signing up: {:?}", e))?;
    tracing::info!("User {} signed up", session.user.id);
    Ok(Json(session))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<Json<Session>, AuthError> {
    let session = provider(&state)?
        .sign_in(&payload)
        .await
        .inspect_err(|e| tracing::warn!("Error logging in: {:?}", e))?;
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_password_grant_session() {
        let body = json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {"id": "u-1", "email": "ada@example.com", "user_metadata": {"username": "ada"}}
        });
        let session = parse_session(body).unwrap();
        assert_eq!(session.access_token.as_deref(), Some("jwt"));
        assert_eq!(session.user.username, "ada");
    }

    #[test]
    fn parses_unconfirmed_signup_user() {
        let body = json!({"id": "u-2", "email": "grace@example.com"});
        let session = parse_session(body).unwrap();
        assert!(session.access_token.is_none());
        assert_eq!(session.user.id, "u-2");
        assert_eq!(session.user.username, "grace");
    }

    #[test]
    fn recognizes_invalid_grant_shapes() {
        assert!(is_invalid_grant(
            &json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})
        ));
        assert!(is_invalid_grant(
            &json!({"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"})
        ));
        assert!(!is_invalid_grant(&json!({"msg": "User already registered"})));
        assert_eq!(
            error_message(&json!({"msg": "User already registered"})),
            "User already registered"
        );
    }
}
