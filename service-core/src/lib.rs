//! service-core: Shared request-processing pipeline for generated services.
//!
//! Every service built from the starter template routes its traffic through
//! the layers assembled by [`pipeline::wrap`]: request-id tagging, audit
//! logging, and envelope shaping. Handlers return [`response::Reply`] values
//! and raise [`error::AppError`]; nothing else ever reaches the wire.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod pagination;
pub mod pipeline;
pub mod response;
pub mod utils;

pub use async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
