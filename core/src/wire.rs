/// Wire types for the auth provider and the realtime database stream.
/// Sign-in endpoint: {auth_url}/accounts:signInWithPassword?key={api_key}
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Seconds, sent as a decimal string.
    #[serde(default)]
    pub expires_in: String,
}

/// Error body shared by the auth and database REST endpoints.
#[derive(Deserialize, Default, Debug)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Deserialize, Default, Debug)]
#[serde(untagged)]
pub enum ErrorBody {
    /// Auth provider: `{"error": {"code": 400, "message": "INVALID_PASSWORD"}}`
    Detailed {
        #[serde(default)]
        code: u16,
        message: String,
    },
    /// Database: `{"error": "Permission denied"}`
    Plain(String),
    #[default]
    Empty,
}

impl ErrorBody {
    pub fn message(&self) -> &str {
        match self {
            ErrorBody::Detailed { message, .. } => message,
            ErrorBody::Plain(message) => message,
            ErrorBody::Empty => "",
        }
    }
}

/// Body of a `put` or `patch` stream event.
#[derive(Deserialize, Debug)]
pub struct StreamPayload {
    pub path: String,
    #[serde(default)]
    pub data: Value,
}
