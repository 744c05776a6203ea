use clap::Subcommand;
use tracing::debug;
use x_api_client::{ApiClient, ClientError, HttpTransport, QueryParams};

/// Fields requested by the `space` shortcut
pub const SPACE_FIELDS: &str = "host_ids,created_at,title,participant_count";

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Obtain an app-only bearer token and save it to the token file
    Auth,

    /// GET an API endpoint, e.g. `xcli get /2/users/by/username/jack user.fields=created_at`
    Get {
        /// Endpoint path including the leading slash
        endpoint: String,

        /// Query parameters as key=value; other tokens are ignored
        params: Vec<String>,
    },

    /// Look up a Space by id
    Space {
        space_id: String,
    },
}

/// What a successful command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Authenticated,
    Response(String),
}

/// Collect `key=value` tokens, splitting at the first `=`; later keys win
pub fn parse_params<I, S>(tokens: I) -> QueryParams
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut params = QueryParams::new();
    for token in tokens {
        let token = token.as_ref();
        match token.split_once('=') {
            Some((key, value)) => {
                params.insert(key.to_string(), value.to_string());
            }
            None => debug!("Ignoring argument without '=': {}", token),
        }
    }
    params
}

/// Endpoint and parameters behind `xcli space <id>`
pub fn space_request(space_id: &str) -> (String, QueryParams) {
    let endpoint = format!("/2/spaces/{}", space_id);
    let params = QueryParams::from([("space.fields".to_string(), SPACE_FIELDS.to_string())]);
    (endpoint, params)
}

pub async fn run<T: HttpTransport>(
    command: Command,
    client: &mut ApiClient<T>,
) -> Result<Outcome, ClientError> {
    match command {
        Command::Auth => {
            client.authenticate().await?;
            Ok(Outcome::Authenticated)
        }
        Command::Get { endpoint, params } => {
            let params = parse_params(&params);
            client.get(&endpoint, &params).await.map(Outcome::Response)
        }
        Command::Space { space_id } => {
            let (endpoint, params) = space_request(&space_id);
            client.get(&endpoint, &params).await.map(Outcome::Response)
        }
    }
}
