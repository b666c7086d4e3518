//! Editor server client
//!
//! Thin reqwest wrapper over the editor server's JSON API. Numeric render
//! parameters travel as plain query strings; the server parses and validates.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::{CatalogService, PageService, PersistenceService, RenderService, SaveOutcome};
use crate::constants::http;
use crate::types::{PageBaseline, PageValues, RenderRequest, Side};

#[derive(Debug, Deserialize)]
struct Ack {
    #[serde(default = "default_ack")]
    ok: bool,
}

fn default_ack() -> bool {
    true
}

/// HTTP implementation of every editor collaborator
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    /// `timeout` of zero disables the client-side timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;

        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(anyhow!("Server URL must start with http:// or https://, got '{}'", base_url));
        }

        info!(server = %base_url, "Editor server client ready");
        Ok(Self { http, base_url })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(self.url(route))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", route))?;
        let response = check_status(route, response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", route))
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to post {}", route))?;
        let response = check_status(route, response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", route))
    }
}

async fn check_status(route: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "{} returned {}: {}",
        route,
        status,
        body.chars().take(http::ERROR_BODY_LIMIT).collect::<String>()
    ))
}

/// Query pairs for a render, using the server's parameter names
pub fn render_query(request: &RenderRequest) -> Vec<(&'static str, String)> {
    let flag = |on: bool| (if on { "1" } else { "0" }).to_string();
    vec![
        ("character", request.character.clone()),
        ("side", request.side.to_string()),
        ("scale", format!("{:.2}", request.params.scale)),
        ("offset_x", request.params.offset_x.to_string()),
        ("raise", request.params.raise.to_string()),
        ("flip", flag(request.params.mirror)),
        ("use_other", flag(request.params.use_other_side)),
    ]
}

#[async_trait]
impl CatalogService for HttpBackend {
    async fn characters(&self) -> Result<Vec<String>> {
        let names: Vec<String> = self.get_json(http::ROUTE_CHARACTERS, &[]).await?;
        info!(count = names.len(), "Fetched character catalog");
        Ok(names)
    }
}

#[async_trait]
impl PageService for HttpBackend {
    async fn page(&self, character: &str, side: Side) -> Result<PageBaseline> {
        let query = [("character", character.to_string()), ("side", side.to_string())];
        self.get_json(http::ROUTE_PAGE, &query)
            .await
            .with_context(|| format!("Failed to load page for {} ({})", character, side))
    }
}

#[async_trait]
impl RenderService for HttpBackend {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.url(http::ROUTE_RENDER))
            .query(&render_query(request))
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", http::ROUTE_RENDER))?;
        let response = check_status(http::ROUTE_RENDER, response).await?;
        let bytes = response
            .bytes()
            .await
            .context("Failed to read rendered image body")?;
        debug!(character = %request.character, side = %request.side, bytes = bytes.len(), "Render received");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PersistenceService for HttpBackend {
    async fn commit(&self, values: &PageValues) -> Result<()> {
        let ack: Ack = self.post_json(http::ROUTE_COMMIT, values).await?;
        if !ack.ok {
            return Err(anyhow!("Commit for {} ({}) was rejected", values.character, values.side));
        }
        Ok(())
    }

    async fn save(&self) -> Result<SaveOutcome> {
        self.post_json(http::ROUTE_SAVE, &serde_json::json!({})).await
    }

    async fn reset(&self) -> Result<()> {
        let ack: Ack = self.post_json(http::ROUTE_RESET, &serde_json::json!({})).await?;
        if !ack.ok {
            return Err(anyhow!("Reset was rejected"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParameterSet;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one canned response on a local port; the task yields the raw request
    async fn serve_once(status: &'static str, body: impl Into<Vec<u8>>) -> (String, JoinHandle<String>) {
        let body = body.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(&body).await.unwrap();
            stream.flush().await.unwrap();
            request
        });
        (format!("http://{addr}"), task)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_render_query_uses_server_names() {
        let request = RenderRequest {
            character: "Ice Climbers".to_string(),
            side: Side::Left,
            params: ParameterSet {
                scale: 0.9,
                offset_x: -35,
                raise: 20,
                mirror: true,
                use_other_side: false,
            },
        };
        let query = render_query(&request);
        assert_eq!(
            query,
            vec![
                ("character", "Ice Climbers".to_string()),
                ("side", "left".to_string()),
                ("scale", "0.90".to_string()),
                ("offset_x", "-35".to_string()),
                ("raise", "20".to_string()),
                ("flip", "1".to_string()),
                ("use_other", "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.url(http::ROUTE_PAGE), "http://localhost:5000/api/page");
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        assert!(HttpBackend::new("localhost:5000", Duration::ZERO).is_err());
    }

    #[test]
    fn test_save_outcome_parses_message() {
        let outcome: SaveOutcome = serde_json::from_str(r#"{"ok": true, "message": "Saved to disk"}"#).unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.message.as_deref(), Some("Saved to disk"));

        let ack: Ack = serde_json::from_str("{}").unwrap();
        assert!(ack.ok);
    }

    #[tokio::test]
    async fn test_error_status_names_route_and_truncates_body() {
        let (url, server) = serve_once("500 Internal Server Error", "x".repeat(300)).await;
        let err = backend(&url).characters().await.unwrap_err();
        server.await.unwrap();

        assert_eq!(
            err.to_string(),
            format!("/api/characters returned 500 Internal Server Error: {}", "x".repeat(200))
        );
    }

    #[tokio::test]
    async fn test_commit_posts_full_values() {
        let (url, server) = serve_once("200 OK", r#"{"ok": true}"#).await;
        let values = PageValues {
            character: "Marth".to_string(),
            side: Side::Left,
            params: ParameterSet {
                scale: 1.15,
                offset_x: -20,
                raise: 35,
                mirror: true,
                use_other_side: false,
            },
        };
        backend(&url).commit(&values).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /api/commit "), "{request}");
        assert_eq!(
            request_body(&request),
            serde_json::json!({
                "character": "Marth",
                "side": "left",
                "scale": 1.15,
                "offset_x": -20,
                "raise": 35,
                "mirror": true,
                "use_other_side": false,
            })
        );
    }

    #[tokio::test]
    async fn test_rejected_commit_is_an_error() {
        let (url, server) = serve_once("200 OK", r#"{"ok": false}"#).await;
        let values = PageValues {
            character: "Fox".to_string(),
            side: Side::Right,
            params: ParameterSet::default(),
        };
        assert!(backend(&url).commit(&values).await.is_err());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_reset_is_an_error() {
        let (url, server) = serve_once("200 OK", r#"{"ok": false}"#).await;
        assert!(backend(&url).reset().await.is_err());
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/reset "), "{request}");
    }

    #[tokio::test]
    async fn test_page_decodes_baseline_and_ignores_echo() {
        let body = r#"{"character": "Fox", "side": "left", "scale": 1.25, "offset_x": -3, "raise": 7.0,
            "dirty": true, "mirror": false, "use_other_side": true}"#;
        let (url, server) = serve_once("200 OK", body).await;
        let baseline = backend(&url).page("Fox", Side::Left).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/page?character=Fox&side=left "), "{request}");
        assert!(baseline.dirty);
        assert_eq!(
            baseline.params,
            ParameterSet {
                scale: 1.25,
                offset_x: -3,
                raise: 7,
                mirror: false,
                use_other_side: true,
            }
        );
    }

    #[tokio::test]
    async fn test_render_returns_raw_body() {
        let image = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let (url, server) = serve_once("200 OK", image.clone()).await;
        let request = RenderRequest {
            character: "Falco".to_string(),
            side: Side::Right,
            params: ParameterSet {
                mirror: true,
                ..ParameterSet::default()
            },
        };
        let bytes = backend(&url).render(&request).await.unwrap();
        let sent = server.await.unwrap();

        assert_eq!(bytes, image);
        assert!(sent.starts_with("GET /api/render?character=Falco&side=right&scale=1.00"), "{sent}");
        assert!(sent.contains("flip=1&use_other=0"), "{sent}");
    }

    #[tokio::test]
    async fn test_save_passes_rejection_through() {
        let (url, server) = serve_once("200 OK", r#"{"ok": false, "message": "read-only"}"#).await;
        let outcome = backend(&url).save().await.unwrap();
        server.await.unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.message.as_deref(), Some("read-only"));
    }
}
