//! Postgres-backed stores.
//!
//! One pool wrapper implementing both collaborators the pipeline needs: the
//! identity store for user management and the audit sink for request logs.
//! Constraint violations surface through the shared error classification, so
//! a duplicate `user_id` becomes a 409 without any handler involvement.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::QueryBuilder;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use service_core::error::AppError;
use service_core::middleware::audit::{AuditRecord, AuditSink};

use crate::config::DatabaseConfig;
use crate::models::User;
use crate::services::store::{IdentityStore, NewUser, UserFilter, UserPatch};

const USER_COLUMNS: &str = "id, user_id, name, email, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("failed to connect: {e}")))?;

        info!("PostgreSQL connection pool established");

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("migration failed: {e}")))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn push_search<'a>(builder: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a UserFilter) {
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            builder
                .push(" WHERE (user_id ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, fields: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (user_id, name, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&fields.user_id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.password_hash)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = %user.user_id, "User created");
        Ok(user)
    }

    async fn update(&self, id: Uuid, fields: UserPatch) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
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
        let mut builder = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        Self::push_search(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(filter.sort_by.column())
            .push(" ")
            .push(filter.sort_order.sql());
        builder.push(" OFFSET ").push_bind(skip as i64);
        if let Some(take) = take {
            builder.push(" LIMIT ").push_bind(take as i64);
        }

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, AppError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users");
        Self::push_search(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn record(&self, record: AuditRecord) -> Result<(), anyhow::Error> {
        sqlx::query(
            "INSERT INTO request_logs \
                 (method, path, status_code, message_code, message, headers, body, query, duration_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&record.method)
        .bind(&record.path)
        .bind(record.status_code as i32)
        .bind(&record.message_code)
        .bind(&record.message)
        .bind(&record.headers)
        .bind(&record.body)
        .bind(&record.query)
        .bind(record.duration_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
