//! Database type definitions
//!
//! This module defines the database families a provider descriptor can point at.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum DatabaseType {
    /// No database type specified
    #[default]
    None = 0,
    /// PostgreSQL database
    Postgres = 1,
    /// MySQL/MariaDB database
    Mysql = 2,
    /// SQLite database
    Sqlite = 3,
    /// Oracle database
    Oracle = 4,
    /// Microsoft SQL Server
    SqlServer = 5,
}

impl DatabaseType {
    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::None => "none",
            DatabaseType::Postgres => "postgres",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Oracle => "oracle",
            DatabaseType::SqlServer => "sqlserver",
        }
    }

    /// Guess the database family from a free-form driver identifier
    ///
    /// Accepts exact names (`"sqlite"`) as well as qualified driver identifiers such as
    /// `"System.Data.SQLite"` or `"MySql.Data"`. Unknown drivers map to [`DatabaseType::None`].
    pub fn from_driver(driver: &str) -> Self {
        if let Ok(exact) = driver.trim().parse() {
            return exact;
        }

        let lower = driver.to_lowercase();
        if lower.contains("sqlite") {
            DatabaseType::Sqlite
        } else if lower.contains("npgsql") || lower.contains("postgres") {
            DatabaseType::Postgres
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            DatabaseType::Mysql
        } else if lower.contains("oracle") {
            DatabaseType::Oracle
        } else if lower.contains("sqlclient") || lower.contains("sqlserver") {
            DatabaseType::SqlServer
        } else {
            DatabaseType::None
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DatabaseType::None),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::Mysql),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            "oracle" => Ok(DatabaseType::Oracle),
            "sqlserver" | "mssql" => Ok(DatabaseType::SqlServer),
            _ => Err(format!("Invalid database type: '{}'", s)),
        }
    }
}
