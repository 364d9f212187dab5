//! Shared HTTP plumbing for the provider clients

use super::ProviderId;
use crate::error::{ResolveError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const USER_AGENT: &str = concat!("voice-tools/", env!("CARGO_PKG_VERSION"));

/// Build a client with the shared user agent and request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| ResolveError::ConfigurationMissing(format!("HTTP client setup failed: {e}")))
}

/// Requests-per-minute limiter; a zero budget falls back to 60
pub(crate) fn rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN.saturating_add(59));
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Send a request and decode a JSON body, mapping failures into the error taxonomy
pub(crate) async fn send_json(provider: ProviderId, request: RequestBuilder) -> Result<Value> {
    let response = send(provider, request).await?;
    decode_json(provider, response).await
}

/// Like [`send_json`], but a 404 means the resource does not exist
pub(crate) async fn send_json_optional(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<Option<Value>> {
    let response = send(provider, request).await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode_json(provider, response).await.map(Some)
}

async fn send(provider: ProviderId, request: RequestBuilder) -> Result<Response> {
    request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| ResolveError::from_transport(provider.as_str(), &e))
}

async fn decode_json(provider: ProviderId, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ResolveError::from_status(provider.as_str(), status, &body));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| ResolveError::from_transport(provider.as_str(), &e))
}

/// Trim a configured base URL so paths can be appended
pub(crate) fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Loopback HTTP server for exercising the clients without network access
#[cfg(test)]
pub(crate) mod test_server {
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Status and JSON body for a request target (path plus query string)
    pub(crate) type Route = fn(&str) -> (u16, String);

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        (listener, base_url)
    }

    /// Answer every request through `route`; returns the base URL
    pub(crate) async fn serve(route: Route) -> String {
        let (listener, base_url) = bind().await;
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(respond(stream, route));
            }
        });
        base_url
    }

    /// Accept connections and never answer them
    pub(crate) async fn silent() -> String {
        let (listener, base_url) = bind().await;
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    drop(stream);
                });
            }
        });
        base_url
    }

    async fn respond(mut stream: TcpStream, route: Route) {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let head = String::from_utf8_lossy(&request);
        let target = head.split_whitespace().nth(1).unwrap_or("/");
        let (status, body) = route(target);
        let response = format!(
            "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}
