use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default token file name, resolved against the working directory
pub const DEFAULT_TOKEN_FILE: &str = "auth_tokens.json";

/// Persisted credential record
///
/// An empty string means the value is absent. The access-token pair is kept
/// for file compatibility only; no request is ever signed with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// OAuth 2.0 app-only bearer token
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bearer_token: String,
    /// OAuth 1.0a user access token
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_token: String,
    /// OAuth 1.0a user access secret
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_secret: String,
}

impl TokenSet {
    /// Create a token set holding only a bearer token
    pub fn with_bearer(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            ..Self::default()
        }
    }

    pub fn has_bearer(&self) -> bool {
        !self.bearer_token.is_empty()
    }

    /// Both halves of the access-token pair are present
    pub fn has_access_pair(&self) -> bool {
        !self.access_token.is_empty() && !self.access_secret.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("unable to read token file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse token file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token file '{}' holds no bearer token", .0.display())]
    MissingBearerToken(PathBuf),

    #[error("unable to save tokens to file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to serialize tokens: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON file holding a [`TokenSet`]
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the token set, requiring a non-empty bearer token
    pub fn load(&self) -> Result<TokenSet, StoreError> {
        let tokens = self.read()?;
        if !tokens.has_bearer() {
            return Err(StoreError::MissingBearerToken(self.path.clone()));
        }
        debug!("Loaded tokens from '{}'", self.path.display());
        Ok(tokens)
    }

    /// Load whatever the file holds, without requiring a bearer token
    pub fn read(&self) -> Result<TokenSet, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the token file with owner-only permissions
    pub fn save(&self, tokens: &TokenSet) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(tokens)?;

        std::fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions).map_err(|source| {
                StoreError::Write {
                    path: self.path.clone(),
                    source,
                }
            })?;
        }

        info!("Tokens saved successfully to '{}'", self.path.display());
        Ok(())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FILE)
    }
}
