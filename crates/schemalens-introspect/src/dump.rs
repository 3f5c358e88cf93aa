use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use schemalens_core::{EntityKind, Error, Result, SqlType};

use crate::catalog::{CatalogAdapter, RawColumn, RawForeignKey, RawPrimaryKey};

/// Offline catalog: raw rows captured from a database as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDump {
    pub dialect: SqlType,
    #[serde(default)]
    pub tables: Vec<DumpTable>,
    #[serde(default)]
    pub views: Vec<DumpSource>,
    #[serde(default)]
    pub procedures: Vec<DumpSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
    #[serde(default)]
    pub primary_key: Option<RawPrimaryKey>,
    #[serde(default)]
    pub foreign_keys: Vec<RawForeignKey>,
}

/// Named view or procedure with its source text, when captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSource {
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl CatalogDump {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| Error::InvalidConfig(format!("invalid catalog dump: {err}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            Error::InvalidConfig(format!("reading catalog dump {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    fn find_table(&self, name: &str) -> Result<&DumpTable> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| Error::not_found(EntityKind::Table, name))
    }

    fn find_source(entries: &[DumpSource], kind: EntityKind, name: &str) -> Result<String> {
        let entry = entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::not_found(kind, name))?;
        entry
            .source
            .clone()
            .ok_or_else(|| Error::Unsupported(format!("catalog dump has no source for {kind} {name}")))
    }
}

#[async_trait]
impl CatalogAdapter for CatalogDump {
    fn dialect(&self) -> SqlType {
        self.dialect
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|table| table.name.clone()).collect())
    }

    async fn list_view_names(&self) -> Result<Vec<String>> {
        Ok(self.views.iter().map(|view| view.name.clone()).collect())
    }

    async fn list_procedure_names(&self) -> Result<Vec<String>> {
        Ok(self.procedures.iter().map(|proc| proc.name.clone()).collect())
    }

    async fn get_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        Ok(self.find_table(table)?.columns.clone())
    }

    async fn get_primary_key(&self, table: &str) -> Result<Option<RawPrimaryKey>> {
        Ok(self.find_table(table)?.primary_key.clone())
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        Ok(self.find_table(table)?.foreign_keys.clone())
    }

    async fn get_view_source(&self, view: &str) -> Result<String> {
        Self::find_source(&self.views, EntityKind::View, view)
    }

    async fn get_procedure_source(&self, procedure: &str) -> Result<String> {
        Self::find_source(&self.procedures, EntityKind::StoredProcedure, procedure)
    }
}
