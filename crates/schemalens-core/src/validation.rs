use std::collections::BTreeSet;

use crate::constraints::ForeignKeyTarget;
use crate::error::{Error, Result};
use crate::schema::{DatabaseSchema, Table};

/// Validate internal consistency of a database schema.
///
/// This checks:
/// - duplicate table/view/procedure/column names
/// - primary key and foreign key columns exist
/// - resolved foreign key links point at a table with the referenced name
pub fn validate_schema(schema: &DatabaseSchema) -> Result<()> {
    ensure_unique("table", schema.tables.iter().map(|t| t.name.as_str()))?;
    ensure_unique("view", schema.views.iter().map(|v| v.name.as_str()))?;
    ensure_unique(
        "stored procedure",
        schema.stored_procedures.iter().map(|p| p.name.as_str()),
    )?;

    for table in &schema.tables {
        validate_table(table)?;

        for column in &table.columns {
            let Some(fk) = &column.foreign_key else {
                continue;
            };
            if let ForeignKeyTarget::Resolved(id) = fk.target {
                let target = schema.table(id).ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "foreign key {}.{} links to missing table #{}",
                        table.name, column.name, id.0
                    ))
                })?;
                if target.name != fk.table_name {
                    return Err(Error::InvalidSchema(format!(
                        "foreign key {}.{} references {} but is linked to {}",
                        table.name, column.name, fk.table_name, target.name
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Validate a single table: unique columns and key columns that exist.
pub fn validate_table(table: &Table) -> Result<()> {
    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name: {}.{}",
                table.name, column.name
            )));
        }
    }

    if let Some(pk) = &table.primary_key {
        for column in &pk.columns {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "primary key column missing: {}.{}",
                    table.name, column
                )));
            }
        }
    }

    for fk in &table.foreign_keys {
        for column in &fk.columns {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "foreign key column missing: {}.{}",
                    table.name, column
                )));
            }
        }
    }

    Ok(())
}

fn ensure_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::InvalidSchema(format!("duplicate {kind} name: {name}")));
        }
    }
    Ok(())
}
