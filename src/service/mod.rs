//! Scan-as-a-service over HTTP.
//!
//! - `GET /health` - liveness check
//! - `POST /scan` - fetch one repository, scan it and return its findings
//!
//! Requests are served one at a time on the calling thread.

mod error;

pub use error::ServiceError;

use crate::analyzer::Analyzer;
use crate::batch::{fetch_and_scan, panic_message};
use crate::fetch::Fetcher;
use crate::rules::Finding;
use crate::scan::ScanOrchestrator;
use crate::store::WorkItem;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use tiny_http::{Response, Server};
use tracing::{error, info, warn};

pub const MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MiB

fn default_max_files() -> usize {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub repo_url: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub findings: Vec<Finding>,
    pub count: usize,
}

/// Status code and JSON body of one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ServiceResponse {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, error: &str, message: impl Into<String>) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": error, "message": message.into() }),
        )
    }
}

pub struct ScanService<F, A> {
    fetcher: F,
    scanner: ScanOrchestrator<A>,
}

impl<F: Fetcher, A: Analyzer> ScanService<F, A> {
    pub fn new(fetcher: F, scanner: ScanOrchestrator<A>) -> Self {
        Self { fetcher, scanner }
    }

    /// Route one request. `body` is the already size-checked request body.
    pub fn handle(&self, method: &str, path: &str, body: &str) -> ServiceResponse {
        let path = path.split('?').next().unwrap_or(path);
        match (method, path) {
            ("GET", "/health") => ServiceResponse::json(200, serde_json::json!({ "status": "ok" })),
            ("POST", "/scan") => self.handle_scan(body),
            _ => ServiceResponse::error(404, "not_found", format!("{method} {path}")),
        }
    }

    fn handle_scan(&self, body: &str) -> ServiceResponse {
        let request: ScanRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid scan request");
                return ServiceResponse::error(400, "bad_request", e.to_string());
            }
        };
        if request.repo_url.trim().is_empty() {
            return ServiceResponse::error(400, "bad_request", "repo_url is empty");
        }

        let item = WorkItem::from_locator(&request.repo_url);
        info!(
            identifier = %item.identifier,
            transport = %item.transport_kind,
            max_files = request.max_files,
            "Scan requested"
        );

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            fetch_and_scan(&self.fetcher, &self.scanner, &item, request.max_files)
        }));

        match result {
            Ok(Ok(findings)) => {
                let response = ScanResponse {
                    count: findings.len(),
                    findings,
                };
                match serde_json::to_value(&response) {
                    Ok(body) => ServiceResponse::json(200, body),
                    Err(e) => ServiceResponse::error(500, "serialize", e.to_string()),
                }
            }
            Ok(Err(e)) => {
                warn!(identifier = %item.identifier, error = %e, "Fetch failed");
                ServiceResponse::error(502, e.reason(), e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(identifier = %item.identifier, panic = %message, "Scan panicked");
                ServiceResponse::error(500, "panic", message)
            }
        }
    }

    /// Serve requests on `listen` until the listener fails.
    pub fn serve(&self, listen: &str) -> Result<(), ServiceError> {
        let server = Server::http(listen).map_err(|e| ServiceError::Bind {
            addr: listen.to_string(),
            message: e.to_string(),
        })?;
        info!(addr = %listen, "Service listening");

        for mut request in server.incoming_requests() {
            let method = request.method().to_string();
            let url = request.url().to_string();

            let reply = match read_body(request.as_reader(), MAX_BODY_BYTES) {
                Ok(body) => self.handle(&method, &url, &body),
                Err(reply) => reply,
            };

            info!(method = %method, path = %url, status = reply.status, "Request handled");
            respond_json(request, reply);
        }
        Ok(())
    }
}

/// Read at most `max_bytes` of body; anything longer is rejected with 413.
pub fn read_body(reader: impl Read, max_bytes: usize) -> Result<String, ServiceResponse> {
    let mut body = String::new();
    let mut reader = reader.take((max_bytes + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!(error = %e, "Failed to read request body");
        return Err(ServiceResponse::error(400, "bad_request", e.to_string()));
    }
    if body.len() > max_bytes {
        return Err(ServiceResponse::error(
            413,
            "payload_too_large",
            format!("request body exceeds {max_bytes} bytes"),
        ));
    }
    Ok(body)
}

fn respond_json(request: tiny_http::Request, reply: ServiceResponse) {
    let body = serde_json::to_string(&reply.body)
        .unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let mut response = Response::from_string(body).with_status_code(reply.status);
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
    {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "Failed to send response");
    }
}
