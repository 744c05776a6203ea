//! Authenticated HTTP client for the X API
//!
//! [`ApiClient`] obtains an app-only bearer token through the OAuth 2.0
//! client-credentials grant and issues GET requests with it. Network I/O goes
//! through the [`HttpTransport`] trait so tests can swap in a mock.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod transport;

pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportError,
};

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use x_oauth::{
    CLIENT_CREDENTIALS_BODY, ConsumerCredentials, FORM_CONTENT_TYPE, StoreError,
    TOKEN_ENDPOINT_PATH, TokenResponseError, TokenSet, TokenStore,
};

/// Default API host
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Query parameters; sorted so the query string is deterministic
pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("consumer key and secret are not configured")]
    MissingConsumerCredentials,

    #[error("network error: {0}")]
    Network(#[from] TransportError),

    #[error("error parsing JSON response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("not authenticated, run `xcli auth` first")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TokenResponseError> for ClientError {
    fn from(e: TokenResponseError) -> Self {
        match e {
            TokenResponseError::Parse(source) => ClientError::Parse(source),
            other => ClientError::InvalidCredentials(other.to_string()),
        }
    }
}

/// Everything the client needs to reach the API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: ConsumerCredentials,
    /// Scheme and host, without trailing slash
    pub api_base: String,
    pub token_store: TokenStore,
}

impl ClientConfig {
    pub fn new(credentials: ConsumerCredentials) -> Self {
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            token_store: TokenStore::default(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_token_store(mut self, token_store: TokenStore) -> Self {
        self.token_store = token_store;
        self
    }
}

/// Join parameters as `key=value&key=value`, percent-encoding both sides
pub fn build_query_string(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// `{base}{endpoint}?{query}`; the `?` is kept even with no parameters
pub fn build_url(api_base: &str, endpoint: &str, params: &QueryParams) -> String {
    format!("{}{}?{}", api_base, endpoint, build_query_string(params))
}

pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
    tokens: TokenSet,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            tokens: TokenSet::default(),
        }
    }

    /// Start with tokens already in memory instead of reading the token file
    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exchange the consumer credentials for a bearer token and persist it
    ///
    /// The token file is only written on success.
    pub async fn authenticate(&mut self) -> Result<(), ClientError> {
        if !self.config.credentials.is_complete() {
            return Err(ClientError::MissingConsumerCredentials);
        }

        let url = format!("{}{}", self.config.api_base, TOKEN_ENDPOINT_PATH);
        info!("Requesting bearer token from {}", url);

        let request = HttpRequest::post(&url, CLIENT_CREDENTIALS_BODY)
            .with_header(
                "Authorization",
                x_oauth::basic_authorization(&self.config.credentials),
            )
            .with_header("Content-Type", FORM_CONTENT_TYPE);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!("Token endpoint returned status {}", response.status);
        }

        let bearer_token = x_oauth::parse_token_response(&response.body)?;

        let mut tokens = TokenSet {
            bearer_token,
            ..self.tokens.clone()
        };
        if !tokens.has_access_pair() {
            // Keep an access pair that only lives in the existing file
            if let Ok(existing) = self.config.token_store.read() {
                tokens.access_token = existing.access_token;
                tokens.access_secret = existing.access_secret;
            }
        }

        self.config.token_store.save(&tokens)?;
        self.tokens = tokens;

        Ok(())
    }

    /// GET `endpoint` with `params` and return the raw response body
    ///
    /// Falls back to the token file when nothing is held in memory, and fails
    /// with [`ClientError::NotAuthenticated`] before touching the network if
    /// that yields no bearer token either.
    pub async fn get(
        &mut self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<String, ClientError> {
        if !self.tokens.has_bearer() && !self.tokens.has_access_pair() {
            match self.config.token_store.load() {
                Ok(tokens) => self.tokens = tokens,
                Err(e) => {
                    debug!("No usable stored tokens: {}", e);
                    return Err(ClientError::NotAuthenticated);
                }
            }
        }

        let url = build_url(&self.config.api_base, endpoint, params);
        let mut request = HttpRequest::get(url);
        debug!("{} {}", request.method, request.url);
        if self.tokens.has_bearer() {
            request = request.with_header(
                "Authorization",
                format!("Bearer {}", self.tokens.bearer_token),
            );
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!("API returned status {}", response.status);
        }

        Ok(response.body)
    }
}
