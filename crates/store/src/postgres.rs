//! Postgres-backed document store.
//!
//! All collections share one `documents` table keyed by `(collection, key)`.
//! The `seq` column preserves append order for `read_all`.

use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default bound on a single store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct PgStoreConfig {
    pub url: String,
    pub max_connections: u32,
    pub op_timeout: Duration,
}

impl PgStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            op_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgStore {
    /// Builds a store without touching the network. Connections are opened on
    /// first use and re-opened after the backend drops them.
    pub fn connect_lazy(config: &PgStoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.op_timeout)
            .connect_lazy(&config.url)
            .map_err(backend)?;
        Ok(Self {
            pool,
            op_timeout: config.op_timeout,
        })
    }

    /// Creates the `documents` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.bounded("ensure_schema", async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS documents (
                    seq        BIGSERIAL NOT NULL,
                    collection TEXT      NOT NULL,
                    key        TEXT      NOT NULL,
                    body       BYTEA     NOT NULL,
                    PRIMARY KEY (collection, key)
                )
                "#,
            )
            .execute(&self.pool)
            .await
            .map(|_| ())
        })
        .await
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(backend),
            Err(_) => {
                warn!(operation, timeout = ?self.op_timeout, "store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    after: self.op_timeout,
                })
            }
        }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(Box::new(other)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn not_found(collection: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn append(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        let insert = sqlx::query("INSERT INTO documents (collection, key, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(key)
            .bind(document)
            .execute(&self.pool);

        match tokio::time::timeout(self.op_timeout, insert).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if is_unique_violation(&e) => Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                key: key.to_string(),
            }),
            Ok(Err(e)) => {
                warn!(error = %e, collection, key, "append failed");
                Err(backend(e))
            }
            Err(_) => Err(StoreError::Timeout {
                operation: "append",
                after: self.op_timeout,
            }),
        }
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        self.bounded(
            "read_all",
            sqlx::query_scalar::<_, Vec<u8>>(
                "SELECT body FROM documents WHERE collection = $1 ORDER BY seq ASC",
            )
            .bind(collection)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        let result = self
            .bounded(
                "update",
                sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND key = $2")
                    .bind(collection)
                    .bind(key)
                    .bind(document)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(collection, key));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let result = self
            .bounded(
                "delete",
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
                    .bind(collection)
                    .bind(key)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(collection, key));
        }
        Ok(())
    }
}
