//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use sparql_proxy::auth::{AuthFailure, Authorizer, DataAddress, BASE_URL_PROPERTY};
use sparql_proxy::config::ProxyConfig;
use sparql_proxy::http::HttpServer;
use sparql_proxy::lifecycle::Shutdown;

/// One request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Canned response the mock backend returns.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: &'static str,
    pub delay: Duration,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: Some("application/sparql-results+json"),
            body: "{\"results\": {}}",
            delay: Duration::ZERO,
        }
    }
}

/// Mock backend that captures every request it receives.
pub struct MockBackend {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    /// Bind an ephemeral port and serve the canned response.
    pub async fn start(response: MockResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let captured = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let captured = captured.clone();
                        let response = response.clone();
                        tokio::spawn(async move {
                            let _ = handle_connection(socket, captured, response).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    response: MockResponse,
) -> std::io::Result<()> {
    let request = read_request(&mut socket).await?;
    captured.lock().unwrap().push(request);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let status_text = match response.status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    };
    let content_type_line = response
        .content_type
        .map(|ct| format!("Content-Type: {ct}\r\n"))
        .unwrap_or_default();
    let raw = format!(
        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        content_type_line,
        response.body.len(),
        response.body
    );
    socket.write_all(raw.as_bytes()).await?;
    socket.shutdown().await
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before headers",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let header_block = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = header_block.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_lowercase(), value.trim().to_string()))
        })
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf[body_start..buf.len().min(body_start + content_length)].to_vec();

    Ok(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Authorizer stub with a fixed outcome and a call counter.
pub struct StubAuthorizer {
    outcome: Result<DataAddress, String>,
    calls: AtomicU32,
}

impl StubAuthorizer {
    /// Grants access to the given backend base URL.
    pub fn allowing(base_url: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(DataAddress::from_properties([(
                BASE_URL_PROPERTY,
                base_url,
            )])),
            calls: AtomicU32::new(0),
        })
    }

    /// Denies every credential.
    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            outcome: Err("policy denied".to_string()),
            calls: AtomicU32::new(0),
        })
    }

    /// Returns the given address as-is.
    pub fn with_address(address: DataAddress) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(address),
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for StubAuthorizer {
    async fn authorize(
        &self,
        _credential: &str,
        _context: &HashMap<String, String>,
    ) -> Result<DataAddress, AuthFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map_err(AuthFailure::Rejected)
    }
}

/// Start the proxy on an ephemeral port with the given authorizer.
/// Returns the proxy base URL and the shutdown handle keeping it alive.
pub async fn start_proxy(authorizer: Arc<dyn Authorizer>) -> (String, Shutdown) {
    let mut config = ProxyConfig::default();
    config.timeouts.upstream_secs = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let server = HttpServer::with_authorizer(config, authorizer);
    tokio::spawn(async move {
        let _ = server.run(listener, shutdown_rx).await;
    });

    (format!("http://{addr}"), shutdown)
}

/// Client that never pools connections or picks up proxy env vars.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
