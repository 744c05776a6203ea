//! OAuth 2.0 client-credentials helpers and token storage for the X API

mod store;

pub use store::{DEFAULT_TOKEN_FILE, StoreError, TokenSet, TokenStore};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Path of the app-only token endpoint, relative to the API base
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth2/token";

/// Form body of the client-credentials grant
pub const CLIENT_CREDENTIALS_BODY: &str = "grant_type=client_credentials";

/// Content type the token endpoint expects
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Application-level credentials identifying the caller to the API
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConsumerCredentials {
    /// API key
    pub consumer_key: String,
    /// API key secret
    pub consumer_secret: String,
}

impl ConsumerCredentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Both key and secret are set
    pub fn is_complete(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }
}

impl std::fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// Build the `Authorization` header value for the token request
///
/// Standard base64 alphabet with `=` padding over `key:secret`.
pub fn basic_authorization(credentials: &ConsumerCredentials) -> String {
    let pair = format!(
        "{}:{}",
        credentials.consumer_key, credentials.consumer_secret
    );
    format!("Basic {}", STANDARD.encode(pair))
}

/// Reasons a token endpoint response yields no usable token
#[derive(Debug, Error)]
pub enum TokenResponseError {
    #[error("error parsing JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no access_token in response")]
    MissingAccessToken,

    #[error("bearer token is empty")]
    EmptyAccessToken,

    #[error("token request rejected: {0}")]
    Rejected(String),
}

/// Extract the bearer token from a token endpoint response body
pub fn parse_token_response(body: &str) -> Result<String, TokenResponseError> {
    let token_response: serde_json::Value = serde_json::from_str(body)?;

    match token_response.get("access_token") {
        Some(serde_json::Value::String(token)) if token.is_empty() => {
            Err(TokenResponseError::EmptyAccessToken)
        }
        Some(serde_json::Value::String(token)) => Ok(token.clone()),
        Some(_) => Err(TokenResponseError::MissingAccessToken),
        None => match first_error_message(&token_response) {
            Some(message) => Err(TokenResponseError::Rejected(message)),
            None => Err(TokenResponseError::MissingAccessToken),
        },
    }
}

// Error payloads look like {"errors":[{"code":99,"message":"..."}]}
fn first_error_message(value: &serde_json::Value) -> Option<String> {
    value
        .get("errors")
        .and_then(|errors| errors.as_array())
        .and_then(|arr| arr.first())
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(|s| s.to_string())
}
