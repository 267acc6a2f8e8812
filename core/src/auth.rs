use crate::wire::{ErrorEnvelope, SignInRequest, SignInResponse};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type AuthResult<T> = Result<T, AuthError>;

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Used when the provider omits `expiresIn`.
const DEFAULT_SESSION_SECS: i64 = 3600;

#[derive(Debug)]
pub enum AuthError {
    Network(reqwest::Error, String),
    /// The provider refused the credentials; the message is meant for the user.
    Rejected(String),
    Parsing(reqwest::Error, String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            AuthError::Rejected(msg) => write!(f, "{msg}"),
            AuthError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// A signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Email/password sign-in against the identity REST endpoint.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl AuthClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("groupstage/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Rejected("Enter email and password".to_string()));
        }

        let url = format!("{}/accounts:signInWithPassword", self.endpoint);
        debug!("POST {url}");
        let response = self
            .client
            .post(format!("{url}?key={}", self.api_key))
            .timeout(self.timeout)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e, url.clone()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message().to_string())
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::Rejected(readable_error(&code)));
        }

        let raw: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parsing(e, url))?;
        let lifetime = raw.expires_in.trim().parse::<i64>().unwrap_or(DEFAULT_SESSION_SECS);
        info!("signed in as {}", raw.email);
        Ok(Session {
            uid: raw.local_id,
            email: if raw.email.is_empty() { email.to_string() } else { raw.email },
            id_token: raw.id_token,
            refresh_token: raw.refresh_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime),
        })
    }
}

/// Maps the provider's error codes ("INVALID_PASSWORD", "TOO_MANY_ATTEMPTS_TRY_LATER : ...")
/// to something a person can act on.
fn readable_error(code: &str) -> String {
    let key = code.split(':').next().unwrap_or_default().trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Wrong email or password".to_string()
        }
        "INVALID_EMAIL" => "That email address is not valid".to_string(),
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts; try again later".to_string(),
        "" => "Sign-in failed".to_string(),
        other => format!("Sign-in failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn sign_in_returns_a_session() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts:signInWithPassword")
            .match_query(Matcher::UrlEncoded("key".into(), "web-key".into()))
            .match_body(Matcher::Json(json!({
                "email": "admin@example.com",
                "password": "hunter2",
                "returnSecureToken": true
            })))
            .with_status(200)
            .with_body(
                r#"{"localId":"u1","email":"admin@example.com","idToken":"tok","refreshToken":"ref","expiresIn":"3600"}"#,
            )
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "web-key");
        let session = client.sign_in(" admin@example.com ", "hunter2").await.unwrap();
        assert_eq!(session.uid, "u1");
        assert_eq!(session.id_token, "tok");
        assert!(!session.is_expired(Utc::now()));
        assert!(session.is_expired(Utc::now() + ChronoDuration::seconds(3601)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_errors_become_readable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/accounts:signInWithPassword")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS","errors":[]}}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url(), "web-key");
        let err = client.sign_in("admin@example.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Wrong email or password");
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_provider() {
        let client = AuthClient::new("http://127.0.0.1:9", "web-key");
        let err = client.sign_in("  ", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
    }

    #[test]
    fn error_codes_with_details_are_trimmed() {
        assert_eq!(
            readable_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            "Too many attempts; try again later"
        );
        assert_eq!(readable_error("OPERATION_NOT_ALLOWED"), "Sign-in failed: OPERATION_NOT_ALLOWED");
    }
}
