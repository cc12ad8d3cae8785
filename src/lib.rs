//! # SQL Data Mapper
//!
//! A lightweight data-access layer that turns named, parameterized SQL text into executable
//! statements and maps result rows into plain Rust types.
//!
//! SQL lives outside the code in a statement pool (loaded from XML or added
//! programmatically). Queries are created from the pool, their `{name}` placeholders are
//! filled with typed values, and the finished text is executed through a pluggable
//! [`Database`] backend. Rows come back as entities, lists, scalars or scalar lists.
//!
//! ## Features
//!
//! - **Named placeholders**: case-insensitive `{name}` substitution with strict and lenient
//!   modes and unresolved-placeholder detection
//! - **Pluggable formatting**: values render as SQL literals through a [`SqlFormatter`]
//! - **Statement pool**: named statements and provider descriptors, loaded from XML with
//!   include support
//! - **Reflection-free mapping**: types declare their column bindings once through
//!   [`SqlEntity`]; bindings are cached per type
//! - **Async execution**: Tokio based [`Database`] trait with a bundled SQLite backend
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sql_data_mapper = { version = "0.1", features = ["sqlite"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ### Building queries
//!
//! ```rust
//! use sql_data_mapper::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut pool = StatementPool::new();
//!     pool.add_statement("by_ids", "select * from users where id in ({ids})")?;
//!
//!     let mut query = pool.create_query("by_ids")?;
//!     query.set_parameter("ids", vec![1, 2, 3])?;
//!
//!     assert_eq!(query.text(), "select * from users where id in (1, 2, 3)");
//!     Ok(())
//! }
//! ```
//!
//! ### Mapping rows
//!
//! ```rust,no_run
//! use sql_data_mapper::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl SqlEntity for User {
//!     fn bind(b: &mut BindingBuilder<Self>) {
//!         b.field("id", |u| &u.id, |u| &mut u.id).not_null();
//!         b.field("name", |u| &u.name, |u| &mut u.name).alias("user_name");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = Arc::new(SqliteDatabase::new());
//!     db.connect(":memory:").await?;
//!     db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, user_name TEXT)").await?;
//!
//!     let ctx = SqlContext::new(db);
//!     let mut insert = SqlQuery::new("insert into users (user_name) values ({name})");
//!     insert.set_parameter("name", "Alice")?;
//!     ctx.insert(&insert).await?;
//!
//!     let users: Vec<User> = ctx.query_for_list(&SqlQuery::new("select * from users")).await?;
//!     for user in users {
//!         println!("User {}: {}", user.id, user.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! sql_data_mapper/
//! ├── src/
//! │   ├── core/                # Mapper types and traits
//! │   │   ├── binding.rs       # Column binding metadata
//! │   │   ├── context.rs       # Typed query execution
//! │   │   ├── database.rs      # Database trait
//! │   │   ├── error.rs         # Error types
//! │   │   ├── formatter.rs     # Value to SQL literal rendering
//! │   │   ├── loader.rs        # XML configuration loading
//! │   │   ├── mapper.rs        # Row mapping
//! │   │   ├── parameters.rs    # Parameter bags
//! │   │   ├── pool.rs          # Statement pool
//! │   │   ├── query.rs         # Query templates
//! │   │   ├── transaction.rs   # Transaction guard
//! │   │   └── value.rs         # Value types
//! │   ├── backends/            # Database backend implementations
//! │   │   └── sqlite.rs        # SQLite implementation
//! │   └── lib.rs
//! ├── tests/                   # Integration and property tests
//! ├── benches/                 # Criterion benchmarks
//! └── Cargo.toml
//! ```

/// Core data mapper types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use sql_data_mapper::prelude::*;
///
/// let mut query = SqlQuery::new("select * from t where name = {name}");
/// query.set_parameter("name", "Alice").unwrap();
/// assert_eq!(query.text(), "select * from t where name = 'Alice'");
/// ```
pub mod prelude {
    pub use crate::core::{
        map_row, map_rows, map_scalar, BindingBuilder, ColumnBinding, Database, DatabaseType,
        DefaultFormatter, EntityBindings, FromSqlValue, MapperError, ParameterMode,
        ProviderDescriptor, Result, SqlContext, SqlEntity, SqlFormatter, SqlParameters,
        SqlQuery, SqlRow, SqlRows, SqlValue, StatementPool, TransactionGuard, XmlLoader,
        DEFAULT_FORMATTER,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteDatabase;
}

// Re-export at root level for convenience
pub use crate::core::{
    Database, DatabaseType, MapperError, Result, SqlContext, SqlEntity, SqlParameters, SqlQuery,
    SqlRow, SqlValue, StatementPool, TransactionGuard, XmlLoader,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteDatabase;
