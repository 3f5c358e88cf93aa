use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::CliError;

/// Catalog source selected from the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Postgres,
    Sqlite,
    /// JSON catalog dump on disk.
    Dump,
}

impl Engine {
    pub fn detect(conn: &str) -> Result<Self, CliError> {
        if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
            Ok(Engine::Postgres)
        } else if conn.starts_with("sqlite:") {
            Ok(Engine::Sqlite)
        } else if conn.to_ascii_lowercase().ends_with(".json") {
            Ok(Engine::Dump)
        } else {
            Err(CliError::UnsupportedEngine(conn.to_string()))
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Sqlite => "sqlite",
            Engine::Dump => "dump",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub async fn connect_postgres(conn: &str) -> Result<PgPool, CliError> {
    Ok(PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(conn)
        .await?)
}

/// Reads are sequential, so one connection is enough.
pub async fn connect_sqlite(conn: &str) -> Result<SqlitePool, CliError> {
    Ok(SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(conn)
        .await?)
}
