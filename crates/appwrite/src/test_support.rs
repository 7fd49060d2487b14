use crate::{AppwriteClient, AppwriteConfig, KEY_HEADER, PROJECT_HEADER};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::Router;
use registry_core::UniqueId;

pub(crate) const PROJECT: &str = "proj1";
pub(crate) const API_KEY: &str = "test-key";

/// Serve `routes` under `/v1` on an ephemeral local port and return a client for it.
pub(crate) async fn client_for(routes: Router) -> AppwriteClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("binding mock server should succeed");
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .nest("/v1", routes)
        .layer(DefaultBodyLimit::disable());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    client_at(&format!("http://{}/v1", addr))
}

pub(crate) fn client_at(endpoint: &str) -> AppwriteClient {
    let cfg = AppwriteConfig::new(endpoint, id(PROJECT), API_KEY).unwrap();
    AppwriteClient::new(&cfg).expect("AppwriteClient::new should succeed")
}

/// An endpoint with nothing listening on it.
pub(crate) async fn unreachable_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

pub(crate) fn id(value: &str) -> UniqueId {
    UniqueId::parse(value).unwrap()
}

pub(crate) fn has_credentials(headers: &HeaderMap) -> bool {
    headers.get(PROJECT_HEADER).map(|v| v.as_bytes()) == Some(PROJECT.as_bytes())
        && headers.get(KEY_HEADER).map(|v| v.as_bytes()) == Some(API_KEY.as_bytes())
}
