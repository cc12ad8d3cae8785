//! Database trait
//!
//! This module defines the execution collaborator the mapper hands finished SQL text to.
//! Implementations run the text verbatim; all value rendering happens in
//! [`SqlQuery`](super::query::SqlQuery) beforehand.

use super::database_types::DatabaseType;
use super::error::Result;
use super::value::{SqlRows, SqlValue};
use async_trait::async_trait;

/// Core database trait that all database backends must implement
#[async_trait]
pub trait Database: Send + Sync {
    /// Get the database type
    fn database_type(&self) -> DatabaseType;

    /// Connect to the database with the given connection string
    ///
    /// # Thread Safety
    /// This method uses interior mutability so it's safe to call from multiple threads
    /// concurrently, though only one connection operation will proceed at a time.
    async fn connect(&self, connection_string: &str) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Disconnect from the database
    async fn disconnect(&self) -> Result<()>;

    /// Execute a statement that doesn't return rows (INSERT, UPDATE, DELETE, CREATE, etc.)
    ///
    /// Returns the number of affected rows.
    ///
    /// # Security Warning
    ///
    /// The text is executed as-is. Values substituted through
    /// [`SqlQuery::set_parameter`](super::query::SqlQuery::set_parameter) are rendered as
    /// literals without escaping, so untrusted input must be validated before it gets there.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Execute a SELECT statement and return all rows
    async fn query(&self, sql: &str) -> Result<SqlRows>;

    /// Execute a SELECT statement and return the first column of the first row
    ///
    /// Returns [`SqlValue::Null`] if the result is empty.
    async fn query_scalar(&self, sql: &str) -> Result<SqlValue> {
        let rows = self.query(sql).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_index(0))
            .cloned()
            .unwrap_or(SqlValue::Null))
    }

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<()>;

    /// Commit the current transaction
    async fn commit(&self) -> Result<()>;

    /// Rollback the current transaction
    async fn rollback(&self) -> Result<()>;

    /// Check if currently in a transaction
    fn in_transaction(&self) -> bool;

    /// Run a closure inside a transaction
    ///
    /// Commits when the closure succeeds and rolls back when it fails.
    ///
    /// # Note
    /// Due to the generic nature of this method, it makes the Database trait not
    /// object-safe. Use the manual begin_transaction/commit/rollback methods with trait
    /// objects.
    async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(
                &'a Self,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.begin_transaction().await?;

        match f(self).await {
            Ok(result) => {
                self.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed transaction failed");
                }
                Err(e)
            }
        }
    }
}
