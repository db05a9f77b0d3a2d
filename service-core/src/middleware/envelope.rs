//! Terminal response shaping: one uniform envelope per request.
//!
//! Runs just outside the routes. Success replies surface as [`Reply`] values
//! in the response extensions; failures as [`ErrorShape`]s planted by
//! `AppError::into_response`. Anything else (extractor rejections, the
//! router's 404 fallback) is normalized from its status and body text, so
//! no raw framework output ever reaches a client.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::error::{capitalize_first, ErrorShape, CODE_INVALID};
use crate::response::{Envelope, MessageCode, Reply, ReplyBody, ReplyMeta, ResponseMeta};

pub async fn envelope_middleware(req: Request, next: Next) -> Response {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();

    if let Some(shape) = parts.extensions.remove::<ErrorShape>() {
        let status = shape.status;
        if status.as_u16() >= 500 {
            tracing::error!(path = %path, status = status.as_u16(), message = %shape.message, "request failed");
        } else {
            tracing::warn!(path = %path, status = status.as_u16(), message = %shape.message, "request rejected");
        }
        let envelope = Envelope::failure(&path, &shape);
        return render(parts, envelope);
    }

    if let Some(reply) = parts.extensions.remove::<Reply>() {
        let envelope = match reply.body {
            ReplyBody::Plain(data) => Envelope::success(&path, reply.meta.status, &reply.meta, data),
            ReplyBody::Paginated(page) => {
                Envelope::paginated(&path, reply.meta.status, &reply.meta, page)
            }
            // idempotence guard: an already-shaped reply passes through as-is
            ReplyBody::Shaped(envelope) => envelope,
        };
        return render(parts, envelope);
    }

    // A response produced outside the reply/error contract.
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read response body while shaping");
            Default::default()
        }
    };
    let envelope = normalize_foreign(&path, parts.status, &bytes);
    render(parts, envelope)
}

fn render(mut parts: axum::http::response::Parts, envelope: Envelope) -> Response {
    if let Ok(status) = StatusCode::from_u16(envelope.status_code) {
        parts.status = status;
    }
    parts.extensions.insert(ResponseMeta {
        status_code: envelope.status_code,
        message_code: envelope.message_code.to_string(),
        message: envelope.message.clone(),
    });

    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| {
        br#"{"status":false,"statusCode":500,"messageCode":500,"message":"An unexpected error occurred"}"#
            .to_vec()
    });

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Response::from_parts(parts, Body::from(body))
}

fn normalize_foreign(path: &str, status: StatusCode, bytes: &[u8]) -> Envelope {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();

    if status.is_success() {
        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        let mut meta = ReplyMeta::default();
        meta.status = status;
        return Envelope::success(path, status, &meta, data);
    }

    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("An unexpected error occurred")
            .to_string()
    } else {
        capitalize_first(text)
    };

    let shape = ErrorShape {
        status,
        message_code: if status == StatusCode::BAD_REQUEST {
            MessageCode::Text(CODE_INVALID.to_string())
        } else {
            MessageCode::Number(status.as_u16())
        },
        message,
        validation_errors: None,
    };
    Envelope::failure(path, &shape)
}
