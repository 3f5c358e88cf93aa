use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{ForeignKey, ForeignKeyRef, PrimaryKey, TableId};
use crate::dialect::SqlType;
use crate::types::DataType;

/// Schema snapshot produced by a full read.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    /// Contract version for this snapshot format.
    pub schema_version: String,
    pub dialect: SqlType,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub stored_procedures: Vec<StoredProcedure>,
    /// Data types known for the dialect.
    pub data_types: Vec<DataType>,
}

impl DatabaseSchema {
    pub fn new(dialect: SqlType) -> Self {
        Self {
            schema_version: crate::SCHEMA_VERSION.to_string(),
            dialect,
            tables: Vec::new(),
            views: Vec::new(),
            stored_procedures: Vec::new(),
            data_types: Vec::new(),
        }
    }

    pub fn find_table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn find_view_by_name(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.name == name)
    }

    pub fn find_stored_procedure_by_name(&self, name: &str) -> Option<&StoredProcedure> {
        self.stored_procedures.iter().find(|proc| proc.name == name)
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0)
    }

    /// Table a foreign key column points at, when the build linked it.
    pub fn foreign_key_table(&self, column: &Column) -> Option<&Table> {
        resolve_foreign_key_table(&self.tables, column)
    }

    /// Foreign key columns whose referenced table is absent from this snapshot.
    pub fn unresolved_foreign_keys(&self) -> Vec<(&Table, &Column)> {
        self.tables
            .iter()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .filter(|column| {
                        column
                            .foreign_key
                            .as_ref()
                            .is_some_and(ForeignKeyRef::is_dangling)
                    })
                    .map(move |column| (table, column))
            })
            .collect()
    }
}

/// Look up the table a foreign key column was linked to within `tables`.
pub fn resolve_foreign_key_table<'a>(tables: &'a [Table], column: &Column) -> Option<&'a Table> {
    let id = column.foreign_key.as_ref()?.resolved_id()?;
    tables.get(id.0)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    /// Columns in catalog ordinal order.
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Primary key columns in key order. Empty when the table has no key.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        match &self.primary_key {
            Some(pk) => pk
                .columns
                .iter()
                .filter_map(|name| self.find_column(name))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    pub ordinal_position: i32,
    /// Type as spelled by the vendor catalog (e.g. `nvarchar(40)`).
    pub db_data_type: String,
    #[serde(default)]
    pub data_type: Option<DataType>,
    pub is_nullable: bool,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub default_value: Option<String>,
    pub is_primary_key: bool,
    pub foreign_key: Option<ForeignKeyRef>,
}

impl Column {
    pub fn new(name: impl Into<String>, ordinal_position: i32, db_data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal_position,
            db_data_type: db_data_type.into(),
            data_type: None,
            is_nullable: false,
            length: None,
            precision: None,
            scale: None,
            default_value: None,
            is_primary_key: false,
            foreign_key: None,
        }
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    pub fn foreign_key_table_name(&self) -> Option<&str> {
        self.foreign_key.as_ref().map(|fk| fk.table_name.as_str())
    }
}

/// Database view. Source text is loaded on demand.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct View {
    pub name: String,
    #[serde(default, with = "cached_source")]
    #[schemars(with = "Option<String>")]
    source: OnceLock<String>,
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: OnceLock::new(),
        }
    }

    /// Source SQL if it has been fetched.
    pub fn source(&self) -> Option<&str> {
        self.source.get().map(String::as_str)
    }

    /// Cache the source text; the first value stored wins.
    pub fn cache_source(&self, sql: String) -> &str {
        self.source.get_or_init(|| sql)
    }
}

/// Stored procedure. Source text is loaded on demand.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoredProcedure {
    pub name: String,
    #[serde(default, with = "cached_source")]
    #[schemars(with = "Option<String>")]
    source: OnceLock<String>,
}

impl StoredProcedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: OnceLock::new(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.get().map(String::as_str)
    }

    pub fn cache_source(&self, sql: String) -> &str {
        self.source.get_or_init(|| sql)
    }
}

mod cached_source {
    use std::sync::OnceLock;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &OnceLock<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value.get() {
            Some(sql) => serializer.serialize_some(sql),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OnceLock<String>, D::Error> {
        let cell = OnceLock::new();
        if let Some(sql) = Option::<String>::deserialize(deserializer)? {
            let _ = cell.set(sql);
        }
        Ok(cell)
    }
}
