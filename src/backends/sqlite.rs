//! SQLite database backend implementation
//!
//! This module provides a SQLite implementation of the Database trait.

use crate::core::{
    database::Database,
    database_types::DatabaseType,
    error::{MapperError, Result},
    value::{SqlRow, SqlRows, SqlValue},
};
use async_trait::async_trait;
use rusqlite::{types::ValueRef, Connection, Row};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default timeout for database operations (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite database implementation
pub struct SqliteDatabase {
    connection: Arc<Mutex<Option<Connection>>>,
    /// Only flipped while the connection lock is held
    in_transaction: Arc<AtomicBool>,
    timeout: Duration,
}

impl SqliteDatabase {
    /// Create a new SQLite database instance
    pub fn new() -> Self {
        Self {
            connection: Arc::new(Mutex::new(None)),
            in_transaction: Arc::new(AtomicBool::new(false)),
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Override the per-operation timeout
    ///
    /// The timeout bounds how long the caller waits, not the statement itself. A write
    /// reported as [`MapperError::QueryTimeout`] may still be applied afterwards.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract the database path from a connection string
    ///
    /// Accepts a bare path (`":memory:"`, `"app.db"`) or a key/value string such as
    /// `"Data Source=app.db;Version=3"`.
    fn database_path(connection_string: &str) -> String {
        let trimmed = connection_string.trim();
        if !trimmed.contains('=') {
            return trimmed.to_string();
        }

        trimmed
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| {
                let key = key.trim().to_lowercase();
                key == "data source" || key == "datasource" || key == "filename"
            })
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Convert a rusqlite Row to a SqlRow
    fn to_sql_row(row: &Row) -> rusqlite::Result<SqlRow> {
        let statement = row.as_ref();
        let mut sql_row = SqlRow::new();

        for i in 0..statement.column_count() {
            let value = match row.get_ref(i)? {
                ValueRef::Null => SqlValue::Null,
                ValueRef::Integer(v) => SqlValue::Long(v),
                ValueRef::Real(v) => SqlValue::Double(v),
                ValueRef::Text(v) => SqlValue::String(String::from_utf8_lossy(v).into_owned()),
                ValueRef::Blob(v) => SqlValue::Bytes(v.to_vec()),
            };
            sql_row.push(statement.column_name(i)?, value);
        }

        Ok(sql_row)
    }

    /// Run `op` against the open connection on the blocking pool, bounded by the timeout
    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &AtomicBool) -> Result<T> + Send + 'static,
    {
        let connection_arc = Arc::clone(&self.connection);
        let in_transaction = Arc::clone(&self.in_transaction);

        let mut task = tokio::task::spawn_blocking(move || -> Result<T> {
            let connection = connection_arc.blocking_lock();
            let conn = connection
                .as_ref()
                .ok_or_else(|| MapperError::connection("Not connected to database"))?;
            op(conn, in_transaction.as_ref())
        });

        // A blocking task that already started cannot be cancelled: after a timeout the
        // statement still runs to completion and its writes may still apply.
        tokio::select! {
            result = &mut task => {
                result.map_err(|e| MapperError::other(format!("Task join error: {}", e)))?
            }
            _ = tokio::time::sleep(self.timeout) => {
                task.abort();
                Err(MapperError::query_timeout(self.timeout.as_millis() as u64))
            }
        }
    }
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn connect(&self, connection_string: &str) -> Result<()> {
        {
            let mut connection = self.connection.lock().await;
            *connection = None;
            self.in_transaction.store(false, Ordering::SeqCst);
        }

        let path = Self::database_path(connection_string);
        let connection_arc = Arc::clone(&self.connection);
        tracing::debug!(path = %path, "opening sqlite database");

        let mut task = tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&path)?;
            conn.execute("PRAGMA foreign_keys = ON", [])?;

            let mut connection = connection_arc.blocking_lock();
            *connection = Some(conn);
            Ok(())
        });

        tokio::select! {
            result = &mut task => {
                result.map_err(|e| MapperError::other(format!("Task join error: {}", e)))?
            }
            _ = tokio::time::sleep(self.timeout) => {
                task.abort();
                Err(MapperError::connection_timeout(self.timeout.as_millis() as u64))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connection
            .try_lock()
            .map(|conn| conn.is_some())
            .unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut connection = self.connection.lock().await;
        *connection = None;
        self.in_transaction.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let sql = sql.to_string();
        tracing::debug!(sql = %sql, "execute");

        self.run_blocking(move |conn, _| {
            let affected = conn.execute(&sql, [])?;
            Ok(affected as u64)
        })
        .await
    }

    async fn query(&self, sql: &str) -> Result<SqlRows> {
        let sql = sql.to_string();
        tracing::debug!(sql = %sql, "query");

        self.run_blocking(move |conn, _| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], Self::to_sql_row)?;
            rows.collect::<rusqlite::Result<SqlRows>>()
                .map_err(MapperError::from)
        })
        .await
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.run_blocking(|conn, in_transaction| {
            if in_transaction.load(Ordering::SeqCst) {
                return Err(MapperError::transaction("Already in a transaction"));
            }
            conn.execute("BEGIN TRANSACTION", [])?;
            in_transaction.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
    }

    async fn commit(&self) -> Result<()> {
        self.run_blocking(|conn, in_transaction| {
            if !in_transaction.load(Ordering::SeqCst) {
                return Err(MapperError::transaction("Not in a transaction"));
            }
            conn.execute("COMMIT", [])?;
            in_transaction.store(false, Ordering::SeqCst);
            Ok(())
        })
        .await
    }

    async fn rollback(&self) -> Result<()> {
        self.run_blocking(|conn, in_transaction| {
            if !in_transaction.load(Ordering::SeqCst) {
                return Err(MapperError::transaction("Not in a transaction"));
            }
            conn.execute("ROLLBACK", [])?;
            in_transaction.store(false, Ordering::SeqCst);
            Ok(())
        })
        .await
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }
}

impl Drop for SqliteDatabase {
    fn drop(&mut self) {
        // Best effort; Drop cannot await the lock.
        if self.in_transaction.load(Ordering::SeqCst) {
            if let Ok(connection) = self.connection.try_lock() {
                if let Some(conn) = connection.as_ref() {
                    let _ = conn.execute("ROLLBACK", []);
                }
            }
        }
    }
}
