use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// SQL dialect tag used by the type registry and the SQL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    SqlServer,
    #[serde(rename = "postgres")]
    PostgreSql,
    MySql,
    Sqlite,
    Oracle,
}

impl SqlType {
    pub const ALL: [SqlType; 5] = [
        SqlType::SqlServer,
        SqlType::PostgreSql,
        SqlType::MySql,
        SqlType::Sqlite,
        SqlType::Oracle,
    ];

    /// Short engine identifier (e.g. `postgres`).
    pub fn name(self) -> &'static str {
        match self {
            SqlType::SqlServer => "sqlserver",
            SqlType::PostgreSql => "postgres",
            SqlType::MySql => "mysql",
            SqlType::Sqlite => "sqlite",
            SqlType::Oracle => "oracle",
        }
    }

    /// Quote an identifier, doubling any embedded closing quote character.
    ///
    /// ```
    /// use schemalens_core::SqlType;
    ///
    /// assert_eq!(SqlType::SqlServer.quote_identifier("Order Details"), "[Order Details]");
    /// assert_eq!(SqlType::PostgreSql.quote_identifier("a\"b"), "\"a\"\"b\"");
    /// assert_eq!(SqlType::MySql.quote_identifier("users"), "`users`");
    /// ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            SqlType::SqlServer => format!("[{}]", name.replace(']', "]]")),
            SqlType::MySql => format!("`{}`", name.replace('`', "``")),
            SqlType::PostgreSql | SqlType::Sqlite | SqlType::Oracle => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    /// Prefix used for named parameters in generated statements.
    pub fn parameter_prefix(self) -> &'static str {
        match self {
            SqlType::SqlServer | SqlType::Sqlite => "@",
            SqlType::PostgreSql | SqlType::Oracle => ":",
            SqlType::MySql => "?",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(SqlType::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(SqlType::PostgreSql),
            "mysql" | "mariadb" => Ok(SqlType::MySql),
            "sqlite" => Ok(SqlType::Sqlite),
            "oracle" => Ok(SqlType::Oracle),
            other => Err(Error::InvalidConfig(format!("unknown dialect: {other}"))),
        }
    }
}
