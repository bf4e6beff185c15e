//! Shared helpers: a tiny OpenAI-style completions server on a raw TcpListener.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the mock saw for one request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn model(&self) -> &str {
        self.body["model"].as_str().unwrap_or_default()
    }

    /// The user message, i.e. instruction prefix plus prompt text.
    pub fn user_content(&self) -> &str {
        self.body["messages"][1]["content"].as_str().unwrap_or_default()
    }
}

pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn story(text: &str) -> Self {
        Self {
            status: 200,
            body: completion_body(text),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct MockEndpoint {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockEndpoint {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn completion_body(text: &str) -> String {
    serde_json::json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
    })
    .to_string()
}

/// Serve until dropped; `respond` decides each answer.
pub async fn spawn_endpoint<F>(respond: F) -> MockEndpoint
where
    F: Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let captured = requests.clone();
    let handle = tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let captured = captured.clone();
            let respond = respond.clone();
            tokio::spawn(async move {
                serve_one(socket, captured, respond).await;
            });
        }
    });

    MockEndpoint {
        base_url: format!("http://127.0.0.1:{port}"),
        requests,
        handle,
    }
}

async fn serve_one<F>(
    mut socket: TcpStream,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    respond: Arc<F>,
) where
    F: Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let response = respond(&request);
    captured.lock().unwrap().push(request);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let reason = if response.status == 200 { "OK" } else { "Error" };
    let head = format!(
        "HTTP/1.1 {} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        response.status,
        response.body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(response.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = buf.len().min(header_end + content_length);
    let body = serde_json::from_slice(&buf[header_end..body_end]).unwrap_or(serde_json::Value::Null);

    Some(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
