use axum::{
    Router,
    extract::{Path, RawQuery},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use tempfile::tempdir;
use x_api_client::{ApiClient, ClientConfig, ClientError, QueryParams, ReqwestTransport};
use x_oauth::{ConsumerCredentials, TokenStore};

const EXPECTED_BASIC: &str = "Basic Y29uc3VtZXJLZXk6Y29uc3VtZXJTZWNyZXQ=";

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn token_handler(headers: HeaderMap, body: String) -> (StatusCode, String) {
    let content_type_ok =
        header(&headers, "content-type") == "application/x-www-form-urlencoded;charset=UTF-8";
    if header(&headers, "authorization") == EXPECTED_BASIC
        && content_type_ok
        && body == "grant_type=client_credentials"
    {
        (
            StatusCode::OK,
            r#"{"token_type":"bearer","access_token":"abc123"}"#.to_string(),
        )
    } else {
        (
            StatusCode::FORBIDDEN,
            r#"{"errors":[{"code":99,"message":"Unable to verify your credentials"}]}"#
                .to_string(),
        )
    }
}

async fn space_handler(
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> String {
    serde_json::json!({
        "id": id,
        "query": query.unwrap_or_default(),
        "authorization": header(&headers, "authorization"),
    })
    .to_string()
}

/// Start a local stand-in for the API and return its base URL
async fn spawn_server() -> String {
    let app = Router::new()
        .route("/oauth2/token", post(token_handler))
        .route("/2/spaces/:id", get(space_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

fn config(base: &str, key: &str, store: TokenStore) -> ClientConfig {
    ClientConfig::new(ConsumerCredentials::new(key, "consumerSecret"))
        .with_api_base(base)
        .with_token_store(store)
}

#[tokio::test]
async fn test_authenticate_and_get_over_http() {
    let base = spawn_server().await;
    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("auth_tokens.json"));

    let mut client = ApiClient::new(
        config(&base, "consumerKey", store.clone()),
        ReqwestTransport::new().unwrap(),
    );
    client.authenticate().await.unwrap();
    assert_eq!(store.load().unwrap().bearer_token, "abc123");

    // A fresh client picks the token up from disk
    let mut client = ApiClient::new(
        config(&base, "consumerKey", store),
        ReqwestTransport::new().unwrap(),
    );
    let mut params = QueryParams::new();
    params.insert(
        "space.fields".to_string(),
        "host_ids,created_at,title,participant_count".to_string(),
    );
    let body = client.get("/2/spaces/42", &params).await.unwrap();

    let echoed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(echoed["id"], "42");
    assert_eq!(
        echoed["query"],
        "space.fields=host_ids%2Ccreated_at%2Ctitle%2Cparticipant_count"
    );
    assert_eq!(echoed["authorization"], "Bearer abc123");
}

#[tokio::test]
async fn test_authenticate_rejected_over_http() {
    let base = spawn_server().await;
    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("auth_tokens.json"));

    let mut client = ApiClient::new(
        config(&base, "wrongKey", store.clone()),
        ReqwestTransport::new().unwrap(),
    );
    let err = client.authenticate().await.unwrap_err();

    match err {
        ClientError::InvalidCredentials(reason) => {
            assert!(reason.contains("Unable to verify your credentials"))
        }
        other => panic!("Expected InvalidCredentials, got {:?}", other),
    }
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port, then close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("auth_tokens.json"));
    let mut client = ApiClient::new(
        config(&format!("http://{}", addr), "consumerKey", store),
        ReqwestTransport::new().unwrap(),
    );

    let err = client.authenticate().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
