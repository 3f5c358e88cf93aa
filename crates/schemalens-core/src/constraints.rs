use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Foreign key constraint preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Position of a table inside the schema it was built into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub struct TableId(pub usize);

/// Link state of a foreign key column's referenced table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "state", content = "table", rename_all = "snake_case")]
pub enum ForeignKeyTarget {
    /// Cross-table linking was not performed (single-table read).
    Unlinked,
    /// Linked to a table of the same build.
    Resolved(TableId),
    /// The referenced table was removed by the table filter.
    Excluded,
    /// The catalog never listed the referenced table.
    Missing,
}

/// Foreign key reference carried by a column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ForeignKeyRef {
    pub table_name: String,
    pub target: ForeignKeyTarget,
}

impl ForeignKeyRef {
    pub fn unlinked(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            target: ForeignKeyTarget::Unlinked,
        }
    }

    pub fn resolved_id(&self) -> Option<TableId> {
        match self.target {
            ForeignKeyTarget::Resolved(id) => Some(id),
            _ => None,
        }
    }

    /// True when a full build could not link the reference.
    pub fn is_dangling(&self) -> bool {
        matches!(
            self.target,
            ForeignKeyTarget::Excluded | ForeignKeyTarget::Missing
        )
    }
}
