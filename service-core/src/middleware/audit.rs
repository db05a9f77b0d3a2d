//! Per-request audit logging: one structured line and one durable record for
//! every request, whatever the outcome.
//!
//! The middleware sits outside the envelope layer so it observes the final
//! status and envelope metadata. Persistence is fire-and-forget: the client
//! response is never blocked on, or failed by, the audit write.

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::audit_trail::AuditTrail;
use crate::response::ResponseMeta;

/// Captured request bodies are stored up to this many bytes.
const BODY_CAPTURE_LIMIT: usize = 16 * 1024;

/// One completed request, as persisted to the audit store. Append-only.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub message_code: String,
    pub message: String,
    pub headers: Value,
    pub body: Value,
    pub query: Value,
    pub duration_ms: i64,
}

/// Durable audit store collaborator. Implementations must be safe to call
/// from detached tasks.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), anyhow::Error>;
}

/// State injected into the audit middleware: the durable sink plus the
/// rotating file trail.
#[derive(Clone)]
pub struct AuditState {
    pub sink: Arc<dyn AuditSink>,
    pub trail: Arc<AuditTrail>,
}

impl AuditState {
    pub fn new(sink: Arc<dyn AuditSink>, trail: Arc<AuditTrail>) -> Self {
        AuditState { sink, trail }
    }
}

pub async fn audit_middleware(
    State(state): State<AuditState>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let (parts, body) = req.into_parts();
    let method = parts.method.to_string();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let headers = headers_to_value(&parts.headers);
    let query = query_to_value(parts.uri.query());

    // Buffer the body so it can be both captured and handed downstream.
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer request body for audit");
            Bytes::new()
        }
    };
    let body_value = body_to_value(&bytes);
    let req = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as i64;
    let status = response.status().as_u16();
    let meta = response
        .extensions()
        .get::<ResponseMeta>()
        .cloned()
        .unwrap_or_else(|| ResponseMeta {
            status_code: status,
            message_code: status.to_string(),
            message: String::new(),
        });

    let line = format!(
        "{method} {path} {status} - {duration_ms}ms | Message Code: {} | Message: {}",
        meta.message_code, meta.message
    );
    state.trail.write(status, &line);

    let record = AuditRecord {
        method,
        path,
        status_code: status,
        message_code: meta.message_code,
        message: meta.message,
        headers,
        body: body_value,
        query,
        duration_ms,
    };

    // Detached on purpose: the write is attempted even if the client has
    // gone away, and its failure only ever costs a log line.
    let sink = state.sink.clone();
    let trail = state.trail.clone();
    tokio::spawn(async move {
        if let Err(err) = sink.record(record).await {
            trail.write(500, &format!("Failed to save audit record: {err}"));
        }
    });

    response
}

fn headers_to_value(headers: &HeaderMap) -> Value {
    let map: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            )
        })
        .collect();
    to_json_object(map)
}

fn query_to_value(query: Option<&str>) -> Value {
    let Some(query) = query else {
        return Value::Object(Map::new());
    };
    match serde_urlencoded::from_str::<BTreeMap<String, String>>(query) {
        Ok(map) => to_json_object(map),
        Err(_) => Value::Object(Map::new()),
    }
}

fn body_to_value(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    if bytes.len() > BODY_CAPTURE_LIMIT {
        return Value::String(format!("<{} bytes omitted>", bytes.len()));
    }
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return value;
    }
    Value::String(String::from_utf8_lossy(bytes).to_string())
}

fn to_json_object(map: BTreeMap<String, String>) -> Value {
    Value::Object(map.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}
