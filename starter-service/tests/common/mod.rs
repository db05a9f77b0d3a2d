//! Shared test fixtures: in-memory store/sink implementations and app
//! assembly without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use service_core::middleware::audit::{AuditRecord, AuditSink, AuditState};
use service_core::observability::audit_trail::{AuditTrail, AuditTrailConfig};

use starter_service::config::{AppConfig, DatabaseConfig, Environment, JwtConfig};
use starter_service::models::User;
use starter_service::services::store::{
    IdentityStore, NewUser, SortOrder, UserFilter, UserPatch, UserSortKey,
};
use starter_service::services::JwtService;
use starter_service::utils::password::hash_password;
use starter_service::{build_router, AppState};

pub const TEST_PASSWORD: &str = "Asdfasdf@123";

/// Hashing is deliberately slow; reuse one hash across all seeded users.
fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap())
        .clone()
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
}

impl MemoryStore {
    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn matches(user: &User, filter: &UserFilter) -> bool {
        match &filter.search {
            None => true,
            Some(needle) => {
                user.user_id.contains(needle)
                    || user.name.as_deref().is_some_and(|n| n.contains(needle))
                    || user.email.contains(needle)
            }
        }
    }

    fn compare(a: &User, b: &User, key: UserSortKey) -> Ordering {
        match key {
            UserSortKey::Id => a.id.cmp(&b.id),
            UserSortKey::UserId => a.user_id.cmp(&b.user_id),
            UserSortKey::Name => a.name.cmp(&b.name),
            UserSortKey::Email => a.email.cmp(&b.email),
            UserSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, fields: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|u| u.user_id == fields.user_id) {
            return Err(AppError::UniqueViolation {
                field: "userId".to_string(),
            });
        }
        if users.iter().any(|u| u.email == fields.email) {
            return Err(AppError::UniqueViolation {
                field: "email".to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            user_id: fields.user_id,
            name: fields.name,
            email: fields.email,
            password_hash: fields.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, fields: UserPatch) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &fields.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::UniqueViolation {
                    field: "email".to_string(),
                });
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(name) = fields.name {
            user.name = Some(name);
        }
        if let Some(email) = fields.email {
            user.email = email;
        }
        if let Some(hash) = fields.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: &UserFilter,
        skip: u64,
        take: Option<u64>,
    ) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| Self::matches(u, filter))
            .cloned()
            .collect();

        users.sort_by(|a, b| {
            let ordering = Self::compare(a, b, filter.sort_by);
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let iter = users.into_iter().skip(skip as usize);
        Ok(match take {
            Some(take) => iter.take(take as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| Self::matches(u, filter))
            .count() as u64)
    }
}

#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, record: AuditRecord) -> Result<(), anyhow::Error> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

impl MemorySink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, n: usize) -> Vec<AuditRecord> {
        for _ in 0..200 {
            {
                let records = self.records.lock().unwrap();
                if records.len() >= n {
                    return records.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} audit records, got {}", self.records().len());
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 86400,
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<MemorySink>,
}

pub fn spawn_app_with(jwt: JwtConfig) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(MemorySink::default());

    let config = AppConfig {
        common: CoreConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "starter-service".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: jwt.clone(),
        audit_log: AuditTrailConfig {
            dir: "logs".to_string(),
            retention_days: 1,
        },
    };

    let state = AppState {
        config: Arc::new(config),
        jwt: JwtService::new(&jwt),
        users: store.clone(),
        audit: AuditState::new(sink.clone(), Arc::new(AuditTrail::disabled())),
    };

    TestApp {
        app: build_router(state.clone()),
        state,
        store,
        sink,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_jwt_config())
}

impl TestApp {
    pub async fn seed_user(&self, user_id: &str, email: &str) -> User {
        self.store
            .create(NewUser {
                user_id: user_id.to_string(),
                name: Some("Test User".to_string()),
                email: email.to_string(),
                password_hash: test_password_hash(),
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn access_token_for(&self, user: &User) -> String {
        self.state.jwt.issue_access(user).unwrap()
    }

    pub fn refresh_token_for(&self, user: &User) -> String {
        self.state.jwt.issue_refresh(user).unwrap()
    }
}

pub fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_req_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_req_auth(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
