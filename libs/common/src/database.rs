//! Database module for handling SQLite connections and operations
//!
//! This module provides connection pooling, configuration, schema migrations
//! and health checks for the database shared by the credential service and
//! the booking API.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{env, str::FromStr, time::Duration};
use tracing::info;

const INITIAL_SCHEMA: &str = include_str!("../migrations/001_initial.sql");

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: SQLite connection URL (default: "sqlite://staybook.db")
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 30)
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://staybook.db".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let connection_timeout = env::var("DATABASE_CONNECTION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        if max_connections == 0 {
            return Err(DatabaseError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            connection_timeout,
        })
    }
}

/// Initialize a SQLite connection pool and bring the schema up to date
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<SqlitePool>` - SQLite connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    info!("Initializing database connection pool");

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    run_migrations(&pool).await?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Open a private in-memory database with the full schema applied
///
/// The pool is pinned to a single connection that never expires, because
/// every new SQLite in-memory connection starts from an empty database.
pub async fn init_memory_pool() -> DatabaseResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply the bundled schema; every statement is idempotent
pub async fn run_migrations(pool: &SqlitePool) -> DatabaseResult<()> {
    info!("Running database migrations");
    execute_sql(pool, INITIAL_SCHEMA)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

/// Split a SQL script into statements
///
/// Comment lines are dropped before splitting, so a `;` inside a comment
/// never ends a statement.
fn split_statements(sql: &str) -> Vec<String> {
    let cleaned = sql
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    cleaned
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Execute a SQL script one statement at a time
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<(), sqlx::Error> {
    for statement in split_statements(sql) {
        sqlx::query(&statement).execute(pool).await?;
    }
    Ok(())
}

/// Whether a repository error is a UNIQUE constraint failure
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful
pub async fn health_check(pool: &SqlitePool) -> DatabaseResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_database_config_from_env() {
        unsafe {
            env::remove_var("DATABASE_URL");
            env::remove_var("DATABASE_MAX_CONNECTIONS");
        }

        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connection_timeout, 30);
        assert_eq!(config.database_url, "sqlite://staybook.db");
    }

    #[test]
    #[serial]
    fn test_database_config_rejects_empty_pool() {
        unsafe {
            env::set_var("DATABASE_MAX_CONNECTIONS", "0");
        }

        let result = DatabaseConfig::from_env();
        assert!(matches!(result, Err(DatabaseError::Configuration(_))));

        unsafe {
            env::remove_var("DATABASE_MAX_CONNECTIONS");
        }
    }

    #[tokio::test]
    async fn test_memory_pool_has_schema() {
        let pool = init_memory_pool().await.expect("memory pool");
        assert!(health_check(&pool).await.expect("health check"));

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("list tables");
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        for expected in ["bookings", "payments", "ratings", "users", "villas"] {
            assert!(names.contains(&expected), "missing table {expected}");
        }
    }

    #[test]
    fn test_semicolons_in_comments_do_not_split() {
        let script = "-- owned elsewhere; read here.\nCREATE TABLE a (id INTEGER);\n\n-- second; table\nCREATE TABLE b (id INTEGER);\n";

        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE a (id INTEGER)", "CREATE TABLE b (id INTEGER)"]
        );
    }

    #[tokio::test]
    async fn test_script_with_commented_semicolon_runs() {
        let pool = init_memory_pool().await.expect("memory pool");
        execute_sql(
            &pool,
            "-- scratch table; dropped with the pool\nCREATE TABLE scratch (id INTEGER);\nINSERT INTO scratch (id) VALUES (1);",
        )
        .await
        .expect("script with commented semicolon");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scratch")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_a_unique_violation() {
        let pool = init_memory_pool().await.expect("memory pool");
        execute_sql(&pool, "CREATE TABLE tags (name TEXT NOT NULL UNIQUE);")
            .await
            .expect("create table");

        let insert = || sqlx::query("INSERT INTO tags (name) VALUES ('sea')").execute(&pool);
        insert().await.expect("first insert");
        let err = anyhow::Error::from(insert().await.expect_err("duplicate insert"));
        assert!(is_unique_violation(&err));

        let err = anyhow::Error::from(
            sqlx::query("INSERT INTO missing (name) VALUES ('sea')")
                .execute(&pool)
                .await
                .expect_err("missing table"),
        );
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("not a database error")));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = init_memory_pool().await.expect("memory pool");
        run_migrations(&pool).await.expect("second run");
    }
}
