//! Database manager implementation
//!
//! This module provides database connection management with:
//! - SQLite connection pool using r2d2
//! - Async wrapper for blocking database operations
//! - A bounded deadline on every operation
//! - Error handling integration with GateError

use crate::core::config::DatabaseConfig;
use crate::core::error::{GateError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tokio::task;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Database manager with connection pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: Pool<SqliteConnectionManager>,
    operation_timeout: Duration,
}

impl DatabaseManager {
    /// Create a new DatabaseManager backed by the file at `db_path`
    pub fn new(
        db_path: &Path,
        pool_size: u32,
        busy_timeout: Duration,
        operation_timeout: Duration,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GateError::InitializationError(format!(
                        "Failed to create database directory {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            // WAL lets readers proceed while a registration commits
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(operation_timeout)
            .build(manager)?;

        let manager = Self {
            pool,
            operation_timeout,
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Create a DatabaseManager from the `[database]` configuration section
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(
            &config.path,
            config.connection_pool_size,
            config.busy_timeout(),
            config.operation_timeout(),
        )
    }

    /// Create a new DatabaseManager with an in-memory database for testing
    pub fn new_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        // Every in-memory connection is its own database, so share exactly one
        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(DEFAULT_OPERATION_TIMEOUT)
            .build(manager)?;

        let manager = Self {
            pool,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        };

        manager.migrate()?;

        Ok(manager)
    }

    /// Override the per-operation deadline
    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a database operation asynchronously
    ///
    /// The closure runs on tokio's blocking pool. If it has not finished
    /// within the operation timeout the caller receives
    /// `GateError::StorageTimeout`; the blocking work itself is not
    /// interrupted.
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        let handle = task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        });

        match tokio::time::timeout(self.operation_timeout, handle).await {
            Ok(joined) => {
                joined.map_err(|e| GateError::Internal(format!("Database task panicked: {}", e)))?
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(GateError::StorageTimeout(self.operation_timeout))
            }
        }
    }

    /// Execute database migrations
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        crate::db::migrations::run_migrations(&mut conn)
    }

    /// Get the current pool size
    pub fn pool_size(&self) -> u32 {
        self.pool.max_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_db() -> (DatabaseManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");
        let manager = DatabaseManager::new(
            &db_path,
            5,
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_database_manager_creation() {
        let (manager, temp_dir) = create_test_db();
        assert_eq!(manager.pool_size(), 5);
        assert!(temp_dir.path().join("nested").join("test.db").exists());
    }

    #[tokio::test]
    async fn test_execute_async() {
        let (manager, _temp_dir) = create_test_db();

        let count: i64 = manager
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
            .unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_execute_maps_sqlite_errors_to_storage() {
        let manager = DatabaseManager::new_in_memory().unwrap();

        let result: Result<()> = manager
            .execute(|conn| {
                conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(GateError::Storage(_))));
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let manager = DatabaseManager::new_in_memory()
            .unwrap()
            .with_operation_timeout(Duration::from_millis(50));

        let result: Result<()> = manager
            .execute(|_conn| {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(GateError::StorageTimeout(_))));
    }
}
