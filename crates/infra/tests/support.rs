#![allow(dead_code)]

use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use backoffice_common::auth::{MemoryStorage, TokenStore};
use backoffice_domain::{ApiConfig, Environment, RetryConfig};
use backoffice_infra::api::{ApiClient, ReauthSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Client wired to in-memory session storage and a subscribable reauth signal.
pub struct TestClient {
    pub client: Arc<ApiClient>,
    pub tokens: Arc<TokenStore>,
    pub reauth: ReauthSignal,
}

/// Plain-http config pointing at a test server with a fast retry schedule.
pub fn test_config(base_url: impl Into<String>, environment: Environment) -> ApiConfig {
    ApiConfig {
        environment,
        upgrade_insecure: false,
        retry: RetryConfig { max_retries: 3, base_delay_ms: 10 },
        ..ApiConfig::new(base_url)
    }
}

pub fn test_client(config: ApiConfig) -> TestClient {
    let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
    let reauth = ReauthSignal::new();
    let client = ApiClient::builder()
        .config(config)
        .token_store(tokens.clone())
        .reauth_handler(Arc::new(reauth.clone()))
        .build()
        .expect("api client should build");

    TestClient { client: Arc::new(client), tokens, reauth }
}

/// URL of a local port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Server that drops the first `failures` connections without answering,
/// then serves `body` as JSON.
///
/// Returns the base URL and a counter of accepted connections.
pub async fn flaky_server(failures: usize, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind flaky server");
    let addr = listener.local_addr().expect("local addr");
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            if counter.fetch_add(1, Ordering::SeqCst) < failures {
                drop(socket);
                continue;
            }

            let mut request = vec![0u8; 8192];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), connections)
}
