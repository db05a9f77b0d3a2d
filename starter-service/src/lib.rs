pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use service_core::middleware::audit::AuditState;
use service_core::pipeline;

use crate::config::AppConfig;
use crate::services::store::IdentityStore;
use crate::services::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub users: Arc<dyn IdentityStore>,
    pub audit: AuditState,
}

/// Assemble the service router: public auth endpoints, guarded user
/// management, everything under `/api/v1`, wrapped in the shared pipeline.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/validate", post(handlers::auth::validate));

    let protected = Router::new()
        .route(
            "/users",
            post(handlers::user::create_user).get(handlers::user::list_users),
        )
        .route("/users/me", get(handlers::user::get_me))
        .route(
            "/users/:id",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api = public.merge(protected);

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api)
        .with_state(state.clone());

    pipeline::wrap(router, state.audit)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
