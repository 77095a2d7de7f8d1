//! [`DashboardServer`] – HTTP + WebSocket server for the dashboard UI.
//!
//! Listens on `0.0.0.0:8888` (configurable via [`DashboardServer::with_port`]).
//!
//! * WebSocket upgrades → browser session speaking the [`protocol`] frames.
//! * `GET /` → the embedded index page.
//! * `GET /<plugin script path>` → that plugin's client script.
//! * Anything else → 404.
//!
//! [`protocol`]: crate::protocol

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use lampo_plugins::PluginRegistry;
use lampo_types::BoardError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::protocol::{self, ClientMessage};
use crate::session::{LatencyLevel, PING_INTERVAL, PingTracker};

/// Default TCP port for the dashboard.
pub const DEFAULT_PORT: u16 = 8888;

const INDEX_HTML: &str = include_str!("../assets/index.html");

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// DashboardServer
// ---------------------------------------------------------------------------

/// Serves the dashboard and routes browser plugin messages into the
/// [`PluginRegistry`].
pub struct DashboardServer {
    registry: Arc<PluginRegistry>,
    port: u16,
    title: String,
}

struct Shared {
    registry: Arc<PluginRegistry>,
    title: String,
}

impl DashboardServer {
    /// Create a server for `registry` on the [`DEFAULT_PORT`].
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            port: DEFAULT_PORT,
            title: "lampo-board".to_string(),
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the hostname shown in browsers (builder-style).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Bind `0.0.0.0:<port>` and serve forever.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Connection`] if the TCP listener cannot bind.
    pub async fn run(self) -> Result<(), BoardError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BoardError::Connection(format!("dashboard bind error on {addr}: {e}")))?;
        info!(port = self.port, "dashboard listening on http://localhost:{}", self.port);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), BoardError> {
        let shared = Arc::new(Shared {
            registry: self.registry,
            title: self.title,
        });

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, shared).await {
                            warn!(peer = %peer, error = %e, "dashboard client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "dashboard accept error");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    shared: Arc<Shared>,
) -> Result<(), BoardError> {
    // `peek` leaves the request in the socket so tungstenite's handshaker
    // still sees it.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| BoardError::Connection(format!("peek error from {peer}: {e}")))?;

    let head = String::from_utf8_lossy(&buf[..n]).into_owned();
    let is_ws_upgrade = head.lines().any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, shared).await
    } else {
        serve_http(stream, &head, &shared.registry).await
    }
}

// ---------------------------------------------------------------------------
// Plain HTTP
// ---------------------------------------------------------------------------

async fn serve_http(
    mut stream: TcpStream,
    head: &str,
    registry: &PluginRegistry,
) -> Result<(), BoardError> {
    // Drain what was peeked so closing does not reset the connection.
    let mut sink = [0u8; 1024];
    let _ = stream.read(&mut sink).await;

    let path = request_path(head).unwrap_or("/");
    let path = path.split('?').next().unwrap_or(path);

    let response = match path {
        "/" | "/index.html" => http_response("200 OK", "text/html; charset=utf-8", INDEX_HTML),
        _ => match registry.js_asset(path) {
            Some(source) => http_response("200 OK", "application/javascript; charset=utf-8", source),
            None => http_response("404 Not Found", "text/plain; charset=utf-8", "not found"),
        },
    };

    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| BoardError::Connection(format!("HTTP write error: {e}")))?;
    let _ = stream.shutdown().await;
    Ok(())
}

fn request_path(head: &str) -> Option<&str> {
    let mut parts = head.lines().next()?.split_whitespace();
    let _method = parts.next()?;
    parts.next()
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Cache-Control: no-store, no-cache, must-revalidate, max-age=0\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}

// ---------------------------------------------------------------------------
// WebSocket session
// ---------------------------------------------------------------------------

async fn handle_ws(stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>) -> Result<(), BoardError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| BoardError::Protocol(format!("ws handshake from {peer}: {e}")))?;

    let socket_id = Uuid::new_v4();
    info!(socket = %socket_id, peer = %peer, "dashboard client connected");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let greeting = protocol::system_frame(&shared.title, VERSION, &shared.registry.js_files())?;
    ws_tx
        .send(Message::Text(greeting.into()))
        .await
        .map_err(|e| BoardError::Connection(format!("ws write to {peer}: {e}")))?;

    let mut pings = PingTracker::new();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + PING_INTERVAL, PING_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let seq = pings.record_ping(Instant::now());
                let frame = protocol::ping_frame(seq)?;
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_text(text.as_str(), socket_id, &pings, &shared).await {
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    info!(socket = %socket_id, "dashboard client disconnected");
    Ok(())
}

/// Act on one browser frame.  Returns `false` when the socket must be closed.
async fn handle_client_text(text: &str, socket_id: Uuid, pings: &PingTracker, shared: &Shared) -> bool {
    match protocol::parse_client_message(text) {
        Ok(ClientMessage::Plugin { name, message }) => {
            if let Err(e) = shared.registry.dispatch(&name, message).await {
                warn!(socket = %socket_id, plugin = %name, error = %e, "plugin message failed");
            }
        }
        Ok(ClientMessage::Pong { seq }) => {
            let Some(latency) = pings.latency(seq, Instant::now()) else {
                return true;
            };
            let latency_ms = latency.as_secs_f64() * 1000.0;
            match LatencyLevel::classify(latency) {
                LatencyLevel::Normal => debug!(socket = %socket_id, latency_ms, "pong"),
                LatencyLevel::High => {
                    warn!(socket = %socket_id, latency_ms, "socket has high latency");
                }
                LatencyLevel::Excessive => {
                    error!(socket = %socket_id, latency_ms, "socket has excessive latency; closing connection");
                    return false;
                }
            }
        }
        Ok(ClientMessage::Unhandled(kind)) => {
            debug!(socket = %socket_id, kind = %kind, "ignoring unhandled frame kind");
        }
        Err(e) => {
            warn!(socket = %socket_id, error = %e, frame = %text, "bad client frame");
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
