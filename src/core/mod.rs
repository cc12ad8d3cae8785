//! Core data mapper types and traits
//!
//! This module provides the building blocks of the mapper: the value model, query
//! templates, the statement pool and its XML loader, binding metadata, row mapping and the
//! database abstraction it all runs against.

pub mod binding;
pub mod context;
pub mod database;
pub mod database_types;
pub mod error;
pub mod formatter;
pub mod loader;
pub mod mapper;
pub mod parameters;
pub mod pool;
pub mod query;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use binding::{BindingBuilder, ColumnBinding, EntityBindings, SqlEntity};
pub use context::SqlContext;
pub use database::Database;
pub use database_types::DatabaseType;
pub use error::{MapperError, Result};
pub use formatter::{DefaultFormatter, SqlFormatter, DEFAULT_FORMATTER};
pub use loader::XmlLoader;
pub use mapper::{map_row, map_rows, map_scalar};
pub use parameters::SqlParameters;
pub use pool::{ProviderDescriptor, StatementPool};
pub use query::{ParameterMode, SqlQuery};
pub use transaction::TransactionGuard;
pub use value::{FromSqlValue, SqlRow, SqlRows, SqlValue, DATETIME_FORMAT};
