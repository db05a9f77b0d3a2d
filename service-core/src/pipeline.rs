//! Explicit middleware composition for the request pipeline.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;

use crate::middleware::audit::{audit_middleware, AuditState};
use crate::middleware::envelope::envelope_middleware;
use crate::middleware::request_id::request_id_middleware;

/// Wrap a router in the shared pipeline. Ordered outermost-in:
///
/// 1. request-id tagging
/// 2. audit logging (line + durable record, exactly once per request)
/// 3. envelope shaping / error normalization
///
/// Route-level guards (authentication) and the handlers themselves sit
/// inside. The audit layer deliberately runs outside the envelope layer so
/// it observes the final status and envelope metadata.
pub fn wrap(router: Router, audit: AuditState) -> Router {
    router
        .layer(from_fn(envelope_middleware))
        .layer(from_fn_with_state(audit, audit_middleware))
        .layer(from_fn(request_id_middleware))
}
