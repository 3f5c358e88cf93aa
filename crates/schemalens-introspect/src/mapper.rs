use std::collections::{BTreeMap, BTreeSet};

use schemalens_core::types::type_argument;
use schemalens_core::{
    Column, DataTypeRegistry, ForeignKey, ForeignKeyRef, ForeignKeyTarget, PrimaryKey, Table,
    TableId, TypeCategory,
};

use crate::catalog::{RawColumn, RawForeignKey, RawPrimaryKey};

/// Assemble a table from raw catalog rows. Foreign keys are left unlinked.
pub fn map_table(
    name: &str,
    raw_columns: Vec<RawColumn>,
    raw_pk: Option<RawPrimaryKey>,
    raw_fks: Vec<RawForeignKey>,
    registry: &DataTypeRegistry,
) -> Table {
    let primary_key = map_primary_key(raw_pk);
    let foreign_keys = map_foreign_keys(raw_fks);

    let pk_columns: BTreeSet<&str> = primary_key
        .iter()
        .flat_map(|pk| pk.columns.iter().map(String::as_str))
        .collect();

    // A column taking part in several foreign keys keeps the first one declared.
    let mut fk_columns: BTreeMap<&str, &str> = BTreeMap::new();
    for fk in &foreign_keys {
        for column in &fk.columns {
            fk_columns
                .entry(column.as_str())
                .or_insert(fk.referenced_table.as_str());
        }
    }

    let mut columns = map_columns(raw_columns, registry);
    for column in &mut columns {
        column.is_primary_key = pk_columns.contains(column.name.as_str());
        column.foreign_key = fk_columns
            .get(column.name.as_str())
            .map(|table| ForeignKeyRef::unlinked(*table));
    }

    Table {
        name: name.to_string(),
        columns,
        primary_key,
        foreign_keys,
    }
}

/// Map raw column rows in ordinal order, resolving each data type.
pub fn map_columns(mut raw: Vec<RawColumn>, registry: &DataTypeRegistry) -> Vec<Column> {
    raw.sort_by_key(|col| col.ordinal_position);

    raw.into_iter()
        .map(|col| {
            let data_type = registry.resolve(&col.data_type, col.precision, col.scale);
            let length = col.max_length.or_else(|| match data_type.category {
                TypeCategory::String | TypeCategory::Binary => type_argument(&col.data_type),
                _ => None,
            });

            Column {
                name: col.name,
                ordinal_position: col.ordinal_position,
                db_data_type: col.data_type,
                data_type: Some(data_type),
                is_nullable: col.is_nullable,
                length,
                precision: col.precision,
                scale: col.scale,
                default_value: col.default_value,
                is_primary_key: false,
                foreign_key: None,
            }
        })
        .collect()
}

pub fn map_primary_key(raw: Option<RawPrimaryKey>) -> Option<PrimaryKey> {
    raw.filter(|pk| !pk.columns.is_empty())
        .map(|pk| PrimaryKey {
            name: pk.name,
            columns: pk.columns,
        })
}

/// A key into another schema names its table `schema.table`, so linking
/// never matches it against a same-named table of the schema being read.
pub fn map_foreign_keys(raw: Vec<RawForeignKey>) -> Vec<ForeignKey> {
    raw.into_iter()
        .map(|fk| ForeignKey {
            name: fk.name,
            columns: fk.columns,
            referenced_table: match fk.referenced_schema {
                Some(schema) => format!("{schema}.{}", fk.referenced_table),
                None => fk.referenced_table,
            },
            referenced_columns: fk.referenced_columns,
        })
        .collect()
}

/// Link every foreign key column to a table of the same build.
///
/// References to tables that are not part of `tables` become `Excluded`
/// when `is_excluded` says the filter removed them, `Missing` otherwise.
pub fn link_foreign_keys(tables: &mut [Table], is_excluded: impl Fn(&str) -> bool) {
    let index: BTreeMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| (table.name.clone(), idx))
        .collect();

    for table in tables.iter_mut() {
        for column in &mut table.columns {
            let Some(fk) = column.foreign_key.as_mut() else {
                continue;
            };
            fk.target = match index.get(&fk.table_name) {
                Some(idx) => ForeignKeyTarget::Resolved(TableId(*idx)),
                None if is_excluded(&fk.table_name) => ForeignKeyTarget::Excluded,
                None => ForeignKeyTarget::Missing,
            };
        }
    }
}
