//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use location_client::config::ClientConfig;

/// One request as seen by the mock backend.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

/// Shared request counter for handlers.
#[derive(Debug, Default)]
pub struct Hits {
    total: AtomicUsize,
}

#[allow(dead_code)]
impl Hits {
    pub fn bump(&self) -> usize {
        self.total.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` maps each parsed request to a status and a body.
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(ReceivedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request);
                        let reason = reqwest::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|code| code.canonical_reason())
                            .unwrap_or("Unknown");

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.trim_start_matches('/').to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    let mut request_id = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => content_length = value.parse().unwrap_or(0),
            "authorization" => authorization = Some(value),
            "x-request-id" => request_id = Some(value),
            _ => {}
        }
    }

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).to_string();

    Some(ReceivedRequest {
        method,
        path,
        authorization,
        request_id,
        body,
    })
}

/// Config pointing at `addr` with short retry delays.
#[allow(dead_code)]
pub fn test_config(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = format!("http://{}/", addr);
    config.api.request_timeout_secs = 2;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 100;
    config.observability.metrics_enabled = false;
    config
}
