//! Statement pool: named raw SQL and provider descriptors
//!
//! The pool is the in-memory form of the configuration. Statements and providers live in
//! two flat namespaces; ids are unique within each and never change after insertion.

use super::database_types::DatabaseType;
use super::error::{MapperError, Result};
use super::query::SqlQuery;
use std::collections::BTreeMap;

/// Driver identity of a named provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Driver / library identifier
    pub driver: String,
    /// Connection implementation identifier
    pub connection_class: String,
}

impl ProviderDescriptor {
    /// The database family the driver belongs to
    pub fn database_type(&self) -> DatabaseType {
        DatabaseType::from_driver(&self.driver)
    }
}

/// Registry of named statements and providers
#[derive(Debug, Clone, Default)]
pub struct StatementPool {
    statements: BTreeMap<String, String>,
    providers: BTreeMap<String, ProviderDescriptor>,
    default_provider: Option<String>,
    default_connection_string: Option<String>,
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MapperError::empty_argument(name));
    }
    Ok(())
}

impl StatementPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statement
    ///
    /// # Errors
    ///
    /// - [`MapperError::InvalidArgument`] if `id` or `sql` is empty
    /// - [`MapperError::DuplicateStatement`] if `id` is already registered
    pub fn add_statement(&mut self, id: impl Into<String>, sql: impl Into<String>) -> Result<()> {
        let id = id.into();
        let sql = sql.into();
        require("id", &id)?;
        require("sql", &sql)?;

        if self.statements.contains_key(&id) {
            return Err(MapperError::DuplicateStatement(id));
        }

        tracing::debug!(statement = %id, "statement registered");
        self.statements.insert(id, sql);
        Ok(())
    }

    /// Get the raw SQL of a statement
    pub fn statement(&self, id: &str) -> Result<&str> {
        require("id", id)?;
        self.statements
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| MapperError::StatementNotFound(id.to_string()))
    }

    /// Create a new query from a pooled statement
    pub fn create_query(&self, id: &str) -> Result<SqlQuery> {
        self.statement(id).map(SqlQuery::new)
    }

    /// Check if a statement is registered
    pub fn contains_statement(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    /// Remove a statement; a missing id is a no-op
    pub fn remove_statement(&mut self, id: &str) -> Result<()> {
        require("id", id)?;
        if self.statements.remove(id).is_some() {
            tracing::debug!(statement = id, "statement removed");
        }
        Ok(())
    }

    /// Remove all statements
    pub fn clear_statements(&mut self) {
        self.statements.clear();
    }

    /// All statement ids, sorted
    pub fn statement_ids(&self) -> Vec<String> {
        self.statements.keys().cloned().collect()
    }

    /// Number of registered statements
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    /// Register a provider descriptor
    ///
    /// # Errors
    ///
    /// - [`MapperError::InvalidArgument`] if any argument is empty
    /// - [`MapperError::DuplicateProvider`] if `id` is already registered
    pub fn add_provider(
        &mut self,
        id: impl Into<String>,
        driver: impl Into<String>,
        connection_class: impl Into<String>,
    ) -> Result<()> {
        let id = id.into();
        let driver = driver.into();
        let connection_class = connection_class.into();
        require("id", &id)?;
        require("driver", &driver)?;
        require("connection_class", &connection_class)?;

        if self.providers.contains_key(&id) {
            return Err(MapperError::DuplicateProvider(id));
        }

        tracing::debug!(provider = %id, driver = %driver, "provider registered");
        self.providers.insert(
            id,
            ProviderDescriptor {
                driver,
                connection_class,
            },
        );
        Ok(())
    }

    /// Get a provider descriptor
    pub fn provider(&self, id: &str) -> Result<&ProviderDescriptor> {
        require("id", id)?;
        self.providers
            .get(id)
            .ok_or_else(|| MapperError::ProviderNotFound(id.to_string()))
    }

    /// Remove a provider; a missing id is a no-op
    pub fn remove_provider(&mut self, id: &str) -> Result<()> {
        require("id", id)?;
        self.providers.remove(id);
        Ok(())
    }

    /// Remove all providers
    pub fn clear_providers(&mut self) {
        self.providers.clear();
    }

    /// All provider ids, sorted
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Default provider id used by [`crate::core::context::SqlContext::from_pool`]
    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn set_default_provider(&mut self, id: impl Into<String>) {
        self.default_provider = Some(id.into());
    }

    /// Default connection string used by [`crate::core::context::SqlContext::from_pool`]
    pub fn default_connection_string(&self) -> Option<&str> {
        self.default_connection_string.as_deref()
    }

    pub fn set_default_connection_string(&mut self, connection_string: impl Into<String>) {
        self.default_connection_string = Some(connection_string.into());
    }
}
