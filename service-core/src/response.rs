//! The uniform response envelope and the tagged handler reply.
//!
//! Handlers never build wire bodies themselves: they return a [`Reply`]
//! (plain data, a paginated result, or an already-shaped envelope) and the
//! envelope middleware turns it into the one [`Envelope`] shape every client
//! sees. The explicit tagging replaces duck-typed payload sniffing.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AppError, ErrorShape};
use crate::pagination::Page;

/// Default success message when a route declares none.
pub const DEFAULT_MESSAGE: &str = "Success";
/// Default success message code when a route declares none.
pub const DEFAULT_MESSAGE_CODE: u16 = 200;

/// Machine-readable code: either a numeric status-like code or a symbolic
/// string such as `INVALID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageCode {
    Number(u16),
    Text(String),
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageCode::Number(n) => write!(f, "{n}"),
            MessageCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<u16> for MessageCode {
    fn from(code: u16) -> Self {
        MessageCode::Number(code)
    }
}

impl From<&str> for MessageCode {
    fn from(code: &str) -> Self {
        MessageCode::Text(code.to_string())
    }
}

/// The only body shape ever returned to a client, success or failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status: bool,
    pub status_code: u16,
    pub message_code: MessageCode,
    pub message: String,
    pub path: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, Vec<String>>>,
    pub timestamp: String,
}

impl Envelope {
    pub fn success(path: &str, status: StatusCode, meta: &ReplyMeta, data: Value) -> Self {
        Envelope {
            status: true,
            status_code: status.as_u16(),
            message_code: meta
                .message_code
                .clone()
                .unwrap_or(MessageCode::Number(DEFAULT_MESSAGE_CODE)),
            message: meta
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            path: path.to_string(),
            data,
            previous_page: None,
            next_page: None,
            current_page: None,
            first_page: None,
            last_page: None,
            total: None,
            validation_errors: None,
            timestamp: now_stamp(),
        }
    }

    /// Success envelope with the page metadata flattened alongside `data`.
    /// `nextPage`/`previousPage` are always present (as explicit nulls at the
    /// boundaries) so clients can rely on them.
    pub fn paginated(path: &str, status: StatusCode, meta: &ReplyMeta, page: Page<Value>) -> Self {
        let mut envelope = Envelope::success(path, status, meta, Value::Array(page.data));
        envelope.previous_page = Some(page.previous_page);
        envelope.next_page = Some(page.next_page);
        envelope.current_page = Some(page.current_page);
        envelope.first_page = Some(page.first_page);
        envelope.last_page = Some(page.last_page);
        envelope.total = Some(page.total);
        envelope
    }

    pub fn failure(path: &str, shape: &ErrorShape) -> Self {
        Envelope {
            status: false,
            status_code: shape.status.as_u16(),
            message_code: shape.message_code.clone(),
            message: shape.message.clone(),
            path: path.to_string(),
            data: Value::Null,
            previous_page: None,
            next_page: None,
            current_page: None,
            first_page: None,
            last_page: None,
            total: None,
            validation_errors: shape.validation_errors.clone(),
            timestamp: now_stamp(),
        }
    }
}

/// Envelope metadata carried by the final response so the audit layer can
/// record what the client was told without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status_code: u16,
    pub message_code: String,
    pub message: String,
}

/// Route-level reply metadata: optional message/messageCode plus the HTTP
/// status to send.
#[derive(Debug, Clone)]
pub struct ReplyMeta {
    pub status: StatusCode,
    pub message: Option<String>,
    pub message_code: Option<MessageCode>,
}

impl Default for ReplyMeta {
    fn default() -> Self {
        ReplyMeta {
            status: StatusCode::OK,
            message: None,
            message_code: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReplyBody {
    Plain(Value),
    Paginated(Page<Value>),
    Shaped(Envelope),
}

/// A handler's outcome, tagged so the envelope middleware never has to sniff
/// payload shapes.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: ReplyBody,
    pub meta: ReplyMeta,
}

impl Reply {
    pub fn plain<T: Serialize>(data: T) -> Result<Self, AppError> {
        let value = serde_json::to_value(data)
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("failed to serialize reply: {e}")))?;
        Ok(Reply {
            body: ReplyBody::Plain(value),
            meta: ReplyMeta::default(),
        })
    }

    pub fn paginated<T: Serialize>(page: Page<T>) -> Result<Self, AppError> {
        let page = page
            .into_values()
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("failed to serialize page: {e}")))?;
        Ok(Reply {
            body: ReplyBody::Paginated(page),
            meta: ReplyMeta::default(),
        })
    }

    /// Pass an already-built envelope through untouched.
    pub fn shaped(envelope: Envelope) -> Self {
        Reply {
            body: ReplyBody::Shaped(envelope),
            meta: ReplyMeta::default(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.meta.status = status;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.meta.message = Some(message.into());
        self
    }

    pub fn with_message_code(mut self, code: impl Into<MessageCode>) -> Self {
        self.meta.message_code = Some(code.into());
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        // The body is written by the envelope middleware, which knows the
        // request path; here the reply only rides along in the extensions.
        let mut response = self.meta.status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

pub(crate) fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
