use std::path::Path;

use serde::{Deserialize, Serialize};

use schemalens_core::SqlType;
use schemalens_introspect::ReaderOptions;

use crate::CliError;

/// Settings read from `--config <file>.toml`. Command-line flags win.
///
/// ```toml
/// conn = "postgres://app@localhost/northwind"
/// postgres_schema = "sales"
/// dialect = "sqlserver"
///
/// [reader]
/// load_sources = false
///
/// [reader.exclusions.table_filter]
/// exclusions = ["Categories", { prefix = "tmp_" }]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Connection string, `sqlite:` URL or path to a `.json` catalog dump.
    pub conn: Option<String>,
    /// PostgreSQL namespace to read; `public` when unset.
    pub postgres_schema: Option<String>,
    /// Dialect for generated SQL; the catalog's own dialect when unset.
    pub dialect: Option<SqlType>,
    pub reader: ReaderOptions,
}

impl CliConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
