use serde::Deserialize;
use std::path::{Path, PathBuf};
use x_api_client::{ClientConfig, DEFAULT_API_BASE};
use x_oauth::{ConsumerCredentials, DEFAULT_TOKEN_FILE, TokenStore};

pub const CONSUMER_KEY_VAR: &str = "XCLI_CONSUMER_KEY";
pub const CONSUMER_SECRET_VAR: &str = "XCLI_CONSUMER_SECRET";
pub const API_ADDRESS_VAR: &str = "XCLI_API_ADDRESS";
pub const TOKEN_FILE_VAR: &str = "XCLI_TOKEN_FILE";

/// On-disk form of the consumer credentials
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    consumer_key: String,
    consumer_secret: String,
}

/// Build the client configuration
///
/// `env` looks up a variable; `main` passes `std::env::var`. Command-line
/// paths take precedence over the environment.
pub fn resolve<F>(
    env: F,
    token_file: Option<PathBuf>,
    credentials_file: Option<&Path>,
) -> Result<ClientConfig, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = match credentials_file {
        Some(path) => read_credentials_file(path)?,
        None => ConsumerCredentials::new(
            env(CONSUMER_KEY_VAR).unwrap_or_default().trim(),
            env(CONSUMER_SECRET_VAR).unwrap_or_default().trim(),
        ),
    };

    let api_base = normalize_api_base(
        &env(API_ADDRESS_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
    );

    let token_file = token_file
        .or_else(|| env(TOKEN_FILE_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));

    Ok(ClientConfig::new(credentials)
        .with_api_base(api_base)
        .with_token_store(TokenStore::new(token_file)))
}

fn read_credentials_file(path: &Path) -> Result<ConsumerCredentials, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read credentials file '{}': {}",
            path.display(),
            e
        )
    })?;
    let file: CredentialsFile = serde_json::from_str(&content).map_err(|e| {
        format!(
            "Failed to parse credentials file '{}': {}",
            path.display(),
            e
        )
    })?;
    Ok(ConsumerCredentials::new(
        file.consumer_key.trim(),
        file.consumer_secret.trim(),
    ))
}

/// Default to https:// and drop trailing slashes so endpoints can be appended
fn normalize_api_base(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("https://{}", address)
    }
}
