use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use schemalens_core::{Result, SqlType};

/// Column row as reported by a vendor catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawColumn {
    pub ordinal_position: i32,
    pub name: String,
    /// Vendor spelling of the type, arguments included when the catalog gives them.
    pub data_type: String,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<i32>,
    #[serde(default)]
    pub scale: Option<i32>,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPrimaryKey {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForeignKey {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Namespace of the referenced table when it is not the one being read.
    #[serde(default)]
    pub referenced_schema: Option<String>,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

/// Source of raw catalog metadata for one database dialect.
///
/// Implementations are not expected to tolerate concurrent calls from a
/// single build; the reader awaits each call before issuing the next.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn dialect(&self) -> SqlType;

    async fn list_table_names(&self) -> Result<Vec<String>>;

    async fn list_view_names(&self) -> Result<Vec<String>>;

    async fn list_procedure_names(&self) -> Result<Vec<String>>;

    async fn get_columns(&self, table: &str) -> Result<Vec<RawColumn>>;

    async fn get_primary_key(&self, table: &str) -> Result<Option<RawPrimaryKey>>;

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>>;

    /// Source SQL of a view; `Error::NotFound` when the view does not exist.
    async fn get_view_source(&self, view: &str) -> Result<String>;

    /// Source SQL of a stored procedure; `Error::NotFound` when it does not exist.
    async fn get_procedure_source(&self, procedure: &str) -> Result<String>;
}
