use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use schemalens_core::{EntityKind, Error, Result, SqlType};

use crate::catalog::{CatalogAdapter, RawColumn, RawForeignKey, RawPrimaryKey};

/// Catalog adapter for SQLite databases (`sqlite_master` and `pragma_*` functions).
///
/// SQLite has no stored procedures: the procedure list is always empty.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn list_objects(&self, kind: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            select name
            from sqlite_master
            where type = ?1
              and name not like 'sqlite_%'
            order by name
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn table_info(&self, table: &str) -> Result<Vec<TableInfoRow>> {
        sqlx::query_as::<_, TableInfoRow>(
            r#"
            select
              cid,
              name,
              type as declared_type,
              "notnull" as not_null,
              dflt_value as default_value,
              pk
            from pragma_table_info(?1)
            order by cid
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

#[derive(sqlx::FromRow)]
struct TableInfoRow {
    cid: i64,
    name: String,
    declared_type: String,
    not_null: i64,
    default_value: Option<String>,
    pk: i64,
}

#[derive(sqlx::FromRow)]
struct ForeignKeyRow {
    id: i64,
    referenced_table: String,
    from_column: String,
    to_column: Option<String>,
}

#[async_trait]
impl CatalogAdapter for SqliteCatalog {
    fn dialect(&self) -> SqlType {
        SqlType::Sqlite
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        self.list_objects("table").await
    }

    async fn list_view_names(&self) -> Result<Vec<String>> {
        self.list_objects("view").await
    }

    async fn list_procedure_names(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn get_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        let rows = self.table_info(table).await?;
        Ok(rows
            .into_iter()
            .map(|row| RawColumn {
                ordinal_position: row.cid as i32 + 1,
                name: row.name,
                data_type: row.declared_type,
                // Key columns are reported as non-null even though SQLite
                // only enforces it for INTEGER PRIMARY KEY.
                is_nullable: row.not_null == 0 && row.pk == 0,
                max_length: None,
                precision: None,
                scale: None,
                default_value: row.default_value,
            })
            .collect())
    }

    async fn get_primary_key(&self, table: &str) -> Result<Option<RawPrimaryKey>> {
        let mut key_columns: Vec<(i64, String)> = self
            .table_info(table)
            .await?
            .into_iter()
            .filter(|row| row.pk > 0)
            .map(|row| (row.pk, row.name))
            .collect();
        if key_columns.is_empty() {
            return Ok(None);
        }
        key_columns.sort_by_key(|(position, _)| *position);

        Ok(Some(RawPrimaryKey {
            name: None,
            columns: key_columns.into_iter().map(|(_, name)| name).collect(),
        }))
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        let rows = sqlx::query_as::<_, ForeignKeyRow>(
            r#"
            select
              id,
              "table" as referenced_table,
              "from" as from_column,
              "to" as to_column
            from pragma_foreign_key_list(?1)
            order by id, seq
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut grouped: BTreeMap<i64, RawForeignKey> = BTreeMap::new();
        for row in rows {
            let fk = grouped.entry(row.id).or_insert_with(|| RawForeignKey {
                name: None,
                columns: Vec::new(),
                referenced_table: row.referenced_table.clone(),
                referenced_schema: None,
                referenced_columns: Vec::new(),
            });
            fk.columns.push(row.from_column);
            if let Some(to) = row.to_column {
                fk.referenced_columns.push(to);
            }
        }

        Ok(grouped.into_values().collect())
    }

    async fn get_view_source(&self, view: &str) -> Result<String> {
        sqlx::query_scalar::<_, String>(
            "select sql from sqlite_master where type = 'view' and name = ?1",
        )
        .bind(view)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| Error::not_found(EntityKind::View, view))
    }

    async fn get_procedure_source(&self, procedure: &str) -> Result<String> {
        Err(Error::Unsupported(format!(
            "sqlite has no stored procedures (requested {procedure})"
        )))
    }
}
