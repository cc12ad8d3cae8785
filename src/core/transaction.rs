//! Transaction guard for automatic rollback on drop
//!
//! This module provides RAII-style transaction management with automatic rollback.

use super::database::Database;
use super::error::{MapperError, Result};
use super::query::SqlQuery;
use super::value::SqlRows;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Transaction guard that automatically rolls back on drop if not committed
///
/// If the guard is dropped without calling `commit()`, a rollback is scheduled on the
/// current tokio runtime.
///
/// # Example
///
/// ```ignore
/// use sql_data_mapper::prelude::*;
///
/// async fn transfer(db: Arc<impl Database>, pool: &StatementPool) -> Result<()> {
///     let tx = TransactionGuard::begin(db).await?;
///
///     let mut debit = pool.create_query("debit")?;
///     debit.set_parameter("id", 1)?.set_parameter("amount", 100)?;
///     tx.execute(&debit).await?;
///
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard<D: Database + 'static> {
    db: Arc<D>,
    committed: AtomicBool,
    rolled_back: AtomicBool,
}

impl<D: Database + 'static> TransactionGuard<D> {
    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database is not connected
    /// - A transaction is already active
    /// - Database operation fails
    pub async fn begin(db: Arc<D>) -> Result<Self> {
        db.begin_transaction().await?;

        Ok(Self {
            db,
            committed: AtomicBool::new(false),
            rolled_back: AtomicBool::new(false),
        })
    }

    fn ensure_active(&self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(MapperError::transaction("Transaction is already committed"));
        }
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(MapperError::transaction("Transaction is already rolled back"));
        }
        Ok(())
    }

    /// Execute a statement within the transaction
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnresolvedParameters`] if the query still has placeholders,
    /// or the database error if execution fails
    pub async fn execute(&self, query: &SqlQuery) -> Result<u64> {
        self.ensure_active()?;
        query.check(true)?;
        self.db.execute(query.text()).await
    }

    /// Query within the transaction
    pub async fn query(&self, query: &SqlQuery) -> Result<SqlRows> {
        self.ensure_active()?;
        query.check(true)?;
        self.db.query(query.text()).await
    }

    /// Commit the transaction
    ///
    /// After calling this method the guard will not roll back on drop.
    pub async fn commit(self) -> Result<()> {
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(MapperError::transaction(
                "Cannot commit a rolled back transaction",
            ));
        }

        self.db.commit().await?;
        self.committed.store(true, Ordering::Release);
        Ok(())
    }

    /// Explicitly rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(MapperError::transaction(
                "Cannot rollback a committed transaction",
            ));
        }

        self.db.rollback().await?;
        self.rolled_back.store(true, Ordering::Release);
        Ok(())
    }

    /// Check if the transaction has been committed
    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    /// Check if the transaction has been rolled back
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back.load(Ordering::Acquire)
    }
}

impl<D: Database + 'static> Drop for TransactionGuard<D> {
    fn drop(&mut self) {
        if self.committed.load(Ordering::Acquire) || self.rolled_back.load(Ordering::Acquire) {
            return;
        }

        self.rolled_back.store(true, Ordering::Release);
        let db = Arc::clone(&self.db);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("TransactionGuard dropped without commit or rollback; rolling back");
                handle.spawn(async move {
                    if let Err(e) = db.rollback().await {
                        tracing::error!(error = %e, "TransactionGuard auto-rollback failed");
                    }
                });
            }
            Err(_) => {
                // The database rolls back when the connection closes.
                tracing::warn!("TransactionGuard dropped outside a tokio runtime; rollback skipped");
            }
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::backends::SqliteDatabase;

    async fn setup() -> Arc<SqliteDatabase> {
        let db = Arc::new(SqliteDatabase::new());
        db.connect(":memory:").await.unwrap();
        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT)")
            .await
            .unwrap();
        db
    }

    fn insert(value: &str) -> SqlQuery {
        let mut query = SqlQuery::new("INSERT INTO test (value) VALUES ({value})");
        query.set_parameter("value", value).unwrap();
        query
    }

    #[tokio::test]
    async fn test_transaction_guard_commit() {
        let db = setup().await;

        let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
        tx.execute(&insert("test1")).await.unwrap();
        tx.commit().await.unwrap();

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_transaction_guard_rollback_on_drop() {
        let db = setup().await;

        {
            let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
            tx.execute(&insert("test1")).await.unwrap();
        }

        for _ in 0..100 {
            if !db.in_transaction() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 0);
    }

    #[tokio::test]
    async fn test_transaction_guard_explicit_rollback() {
        let db = setup().await;

        let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
        tx.execute(&insert("test1")).await.unwrap();
        let rows = tx
            .query(&SqlQuery::new("SELECT value FROM test"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        tx.rollback().await.unwrap();

        let results = db.query("SELECT * FROM test").await.unwrap();
        assert_eq!(results.len(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_query_is_rejected() {
        let db = setup().await;

        let tx = TransactionGuard::begin(Arc::clone(&db)).await.unwrap();
        let err = tx
            .execute(&SqlQuery::new("INSERT INTO test (value) VALUES ({value})"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::UnresolvedParameters { .. }));
        tx.rollback().await.unwrap();
    }
}
