//! HTTP transport: a fixed pool of blocking workers over `tiny_http`.
//!
//! Each worker pulls requests off the shared listener and drives the async
//! [`App`] on the caller's Tokio runtime.

use crate::app::{ApiResponse, App};
use crate::error::ApiError;
use ccna_core::{AppError, AppResult};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;

/// Largest request body accepted, in bytes.
const MAX_BODY: u64 = 1024 * 1024;

/// A running server.
pub struct ServerHandle {
    server: Arc<Server>,
    workers: Vec<JoinHandle<()>>,
    addr: SocketAddr,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub fn shutdown(self) {
        for _ in &self.workers {
            self.server.unblock();
        }
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::warn!("HTTP worker panicked");
            }
        }
        tracing::info!("HTTP server stopped");
    }
}

/// Bind `bind` and start `workers` request threads.
///
/// Must be called from within a Tokio runtime.
pub fn start(app: Arc<App>, bind: &str, workers: usize) -> AppResult<ServerHandle> {
    let runtime = Handle::try_current()
        .map_err(|e| AppError::Other(format!("HTTP server needs a Tokio runtime: {}", e)))?;

    let server = Server::http(bind)
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", bind, e)))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| AppError::Config(format!("{} is not an IP address", bind)))?;
    let server = Arc::new(server);

    let workers = (0..workers.max(1))
        .map(|id| {
            let server = Arc::clone(&server);
            let app = Arc::clone(&app);
            let runtime = runtime.clone();
            std::thread::Builder::new()
                .name(format!("http-worker-{}", id))
                .spawn(move || worker_loop(&server, &app, &runtime))
                .map_err(AppError::Io)
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::info!("Listening on http://{} with {} workers", addr, workers.len());

    Ok(ServerHandle {
        server,
        workers,
        addr,
    })
}

/// Serve until Ctrl-C.
pub async fn serve(app: Arc<App>, bind: &str, workers: usize) -> AppResult<()> {
    let handle = start(app, bind, workers)?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    tokio::task::spawn_blocking(move || handle.shutdown())
        .await
        .map_err(|e| AppError::Other(format!("Shutdown task failed: {}", e)))
}

fn worker_loop(server: &Server, app: &App, runtime: &Handle) {
    // recv fails once the server is unblocked
    while let Ok(request) = server.recv() {
        handle_request(request, app, runtime);
    }
}

fn handle_request(mut request: Request, app: &App, runtime: &Handle) {
    let method = request.method().to_string();
    let url = request.url().to_string();

    let response = match read_body(&mut request) {
        Ok(Some(body)) => runtime.block_on(app.dispatch(&method, &url, &body)),
        Ok(None) => {
            tracing::warn!("{} {} rejected: body over {} bytes", method, url, MAX_BODY);
            ApiError::BodyTooLarge.into()
        }
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            ApiResponse {
                status: 400,
                body: Some(serde_json::json!({ "error": "Unreadable request body" })),
            }
        }
    };

    if let Err(e) = request.respond(to_http(response)) {
        tracing::warn!("Failed to send response for {} {}: {}", method, url, e);
    }
}

/// Read the request body, or `None` if it exceeds [`MAX_BODY`].
///
/// An oversized body is drained before returning so the client finishes
/// sending and sees the response.
fn read_body(request: &mut Request) -> std::io::Result<Option<Vec<u8>>> {
    let reader = request.as_reader();
    let mut body = Vec::new();
    (&mut *reader).take(MAX_BODY + 1).read_to_end(&mut body)?;

    if body.len() as u64 > MAX_BODY {
        std::io::copy(reader, &mut std::io::sink())?;
        return Ok(None);
    }
    Ok(Some(body))
}

fn to_http(response: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let data = response
        .body
        .map(|body| body.to_string().into_bytes())
        .unwrap_or_default();

    let mut http = Response::from_data(data).with_status_code(response.status);
    for (name, value) in [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ] {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            http.add_header(header);
        }
    }
    http
}

