//! Typed query execution
//!
//! [`SqlContext`] ties a [`Database`] to the mapper: queries are checked for unresolved
//! placeholders, handed to the database as text, and the rows come back as typed values.

use super::binding::SqlEntity;
use super::database::Database;
use super::database_types::DatabaseType;
use super::error::{MapperError, Result};
use super::mapper::{map_row, map_rows, map_scalar};
use super::pool::StatementPool;
use super::query::SqlQuery;
use super::value::FromSqlValue;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Executes [`SqlQuery`]s against a database and maps the results
pub struct SqlContext<D: Database> {
    db: Arc<D>,
}

impl<D: Database> Clone for SqlContext<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<D: Database> SqlContext<D> {
    /// Wrap an already connected database
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    /// Create a database from the pool's default provider and connect it
    ///
    /// The default provider id is looked up in the pool's providers; an id that is not
    /// registered is read as a driver name itself.
    ///
    /// # Errors
    ///
    /// - [`MapperError::Configuration`] if the pool has no default provider or connection
    ///   string, or the provider's driver does not match `D`
    /// - [`MapperError::ProviderNotFound`] if the provider id is neither registered nor a
    ///   known driver name
    pub async fn from_pool(pool: &StatementPool) -> Result<Self>
    where
        D: Default,
    {
        let provider = pool
            .default_provider()
            .ok_or_else(|| MapperError::configuration("no default provider configured"))?;
        let connection_string = pool
            .default_connection_string()
            .ok_or_else(|| MapperError::configuration("no default connection string configured"))?;

        let provider_type = match pool.provider(provider) {
            Ok(descriptor) => descriptor.database_type(),
            Err(MapperError::ProviderNotFound(id)) => match DatabaseType::from_driver(&id) {
                DatabaseType::None => return Err(MapperError::ProviderNotFound(id)),
                known => known,
            },
            Err(e) => return Err(e),
        };

        let db = D::default();
        if provider_type != db.database_type() {
            return Err(MapperError::configuration(format!(
                "provider '{}' is a {} provider, not {}",
                provider,
                provider_type,
                db.database_type()
            )));
        }

        db.connect(connection_string).await?;
        tracing::info!(provider, database = %provider_type, "context connected");
        Ok(Self::new(Arc::new(db)))
    }

    /// The underlying database
    pub fn database(&self) -> &Arc<D> {
        &self.db
    }

    /// Map the first row of the result, if any
    pub async fn query_for_object<T: SqlEntity>(&self, query: &SqlQuery) -> Result<Option<T>> {
        let rows = self.db.query(Self::prepare(query)?).await?;
        rows.first().map(map_row).transpose()
    }

    /// Map every row of the result
    pub async fn query_for_list<T: SqlEntity>(&self, query: &SqlQuery) -> Result<Vec<T>> {
        let rows = self.db.query(Self::prepare(query)?).await?;
        map_rows(&rows)
    }

    /// Convert the first column of the first row
    ///
    /// An empty result converts from null, so request an `Option<S>` when no row is a
    /// valid outcome.
    pub async fn query_for_scalar<S: FromSqlValue>(&self, query: &SqlQuery) -> Result<S> {
        let value = self.db.query_scalar(Self::prepare(query)?).await?;
        S::from_sql_value(&value).ok_or_else(|| {
            MapperError::type_mismatch("scalar", "0", std::any::type_name::<S>(), value.type_name())
        })
    }

    /// Convert the first column of every row
    pub async fn query_for_scalar_list<S: FromSqlValue>(&self, query: &SqlQuery) -> Result<Vec<S>> {
        let rows = self.db.query(Self::prepare(query)?).await?;
        rows.iter().map(map_scalar).collect()
    }

    /// Run an INSERT and return the number of affected rows
    pub async fn insert(&self, query: &SqlQuery) -> Result<u64> {
        self.execute(query).await
    }

    /// Run an UPDATE and return the number of affected rows
    pub async fn update(&self, query: &SqlQuery) -> Result<u64> {
        self.execute(query).await
    }

    /// Run a DELETE and return the number of affected rows
    pub async fn delete(&self, query: &SqlQuery) -> Result<u64> {
        self.execute(query).await
    }

    /// Run any non-query statement and return the number of affected rows
    pub async fn execute(&self, query: &SqlQuery) -> Result<u64> {
        self.db.execute(Self::prepare(query)?).await
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        self.db.begin_transaction().await
    }

    pub async fn commit_transaction(&self) -> Result<()> {
        self.db.commit().await
    }

    pub async fn rollback_transaction(&self) -> Result<()> {
        self.db.rollback().await
    }

    /// Run a closure inside a transaction, committing on success and rolling back on error
    pub async fn run_in_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a Self) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>,
    {
        self.begin_transaction().await?;

        match f(self).await {
            Ok(result) => {
                self.commit_transaction().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_transaction().await {
                    tracing::warn!(error = %rollback_err, "rollback after failed transaction failed");
                }
                Err(e)
            }
        }
    }

    fn prepare(query: &SqlQuery) -> Result<&str> {
        query.check(true)?;
        Ok(query.text())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::backends::SqliteDatabase;
    use crate::core::binding::BindingBuilder;
    use crate::core::value::SqlValue;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i64,
        label: String,
        price: Option<f64>,
    }

    impl SqlEntity for Item {
        fn bind(b: &mut BindingBuilder<Self>) {
            b.field("id", |i| &i.id, |i| &mut i.id).not_null();
            b.field("label", |i| &i.label, |i| &mut i.label).alias("name");
            b.field("price", |i| &i.price, |i| &mut i.price);
        }
    }

    async fn context() -> SqlContext<SqliteDatabase> {
        let db = Arc::new(SqliteDatabase::new());
        db.connect(":memory:").await.unwrap();
        db.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL)")
            .await
            .unwrap();
        db.execute("INSERT INTO items (name, price) VALUES ('pen', 1.5), ('cup', NULL)")
            .await
            .unwrap();
        SqlContext::new(db)
    }

    #[tokio::test]
    async fn test_query_for_object() {
        let ctx = context().await;

        let mut query = SqlQuery::new("select * from items where name = {name}");
        query.set_parameter("name", "pen").unwrap();
        let item: Option<Item> = ctx.query_for_object(&query).await.unwrap();
        assert_eq!(
            item,
            Some(Item {
                id: 1,
                label: "pen".to_string(),
                price: Some(1.5),
            })
        );

        let mut query = SqlQuery::new("select * from items where name = {name}");
        query.set_parameter("name", "none").unwrap();
        assert_eq!(ctx.query_for_object::<Item>(&query).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_for_list_and_scalars() {
        let ctx = context().await;

        let items: Vec<Item> = ctx
            .query_for_list(&SqlQuery::new("select * from items order by id"))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].price, None);

        let count: i64 = ctx
            .query_for_scalar(&SqlQuery::new("select count(*) from items"))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let missing: Option<String> = ctx
            .query_for_scalar(&SqlQuery::new("select name from items where id = 42"))
            .await
            .unwrap();
        assert_eq!(missing, None);

        let names: Vec<String> = ctx
            .query_for_scalar_list(&SqlQuery::new("select name from items order by name"))
            .await
            .unwrap();
        assert_eq!(names, vec!["cup".to_string(), "pen".to_string()]);
    }

    #[tokio::test]
    async fn test_unresolved_parameters_never_reach_database() {
        let ctx = context().await;
        let err = ctx
            .delete(&SqlQuery::new("delete from items where id = {id}"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::UnresolvedParameters { ref names } if names == &["id"]));

        let count: i64 = ctx
            .query_for_scalar(&SqlQuery::new("select count(*) from items"))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_insert_update_delete() {
        let ctx = context().await;

        let mut insert = SqlQuery::new("insert into items (name, price) values ({name}, {price})");
        insert
            .set_parameter("name", "ink")
            .unwrap()
            .set_parameter("price", SqlValue::Null)
            .unwrap();
        assert_eq!(ctx.insert(&insert).await.unwrap(), 1);

        let update = SqlQuery::new("update items set price = 2.0 where price is null");
        assert_eq!(ctx.update(&update).await.unwrap(), 2);

        let delete = SqlQuery::new("delete from items");
        assert_eq!(ctx.delete(&delete).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_run_in_transaction_rolls_back() {
        let ctx = context().await;

        let result: Result<()> = ctx
            .run_in_transaction(|ctx| {
                Box::pin(async move {
                    ctx.delete(&SqlQuery::new("delete from items")).await?;
                    Err::<(), _>(MapperError::other("abort"))
                })
            })
            .await;
        assert!(result.is_err());

        let count: i64 = ctx
            .query_for_scalar(&SqlQuery::new("select count(*) from items"))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let deleted = ctx
            .run_in_transaction(|ctx| {
                Box::pin(async move { ctx.delete(&SqlQuery::new("delete from items")).await })
            })
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_from_pool() {
        let mut pool = StatementPool::new();
        assert!(matches!(
            SqlContext::<SqliteDatabase>::from_pool(&pool).await,
            Err(MapperError::Configuration(_))
        ));

        pool.set_default_provider("sqlite");
        pool.set_default_connection_string(":memory:");
        let ctx = SqlContext::<SqliteDatabase>::from_pool(&pool).await.unwrap();
        assert!(ctx.database().is_connected());

        pool.add_provider("main", "MySql.Data", "MySqlConnection")
            .unwrap();
        pool.set_default_provider("main");
        assert!(matches!(
            SqlContext::<SqliteDatabase>::from_pool(&pool).await,
            Err(MapperError::Configuration(_))
        ));
    }
}
