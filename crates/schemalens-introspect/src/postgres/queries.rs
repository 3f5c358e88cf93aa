use sqlx::PgPool;

use schemalens_core::{Error, Result};

use crate::catalog::{RawColumn, RawForeignKey, RawPrimaryKey};

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

/// Names of relations of the given kinds (`pg_class.relkind`) in a namespace.
pub async fn list_relations(pool: &PgPool, schema: &str, relkinds: &[&str]) -> Result<Vec<String>> {
    let relkinds: Vec<String> = relkinds.iter().map(|kind| kind.to_string()).collect();
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind::text = any($2)
        order by c.relname
        "#,
    )
    .bind(schema)
    .bind(relkinds)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_routines(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select distinct p.proname::text
        from pg_proc p
        join pg_namespace n on n.oid = p.pronamespace
        where n.nspname = $1
          and p.prokind in ('f', 'p')
        order by 1
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    ordinal_position: i32,
    name: String,
    data_type: String,
    is_nullable: bool,
    max_length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
    default_value: Option<String>,
}

pub async fn list_columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        select
          a.attnum::int4 as ordinal_position,
          a.attname::text as name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as data_type,
          (not a.attnotnull) as is_nullable,
          ic.character_maximum_length::int4 as max_length,
          ic.numeric_precision::int4 as precision,
          ic.numeric_scale::int4 as scale,
          pg_get_expr(ad.adbin, ad.adrelid) as default_value
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        left join pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
        left join information_schema.columns ic
          on ic.table_schema = n.nspname and ic.table_name = c.relname and ic.column_name = a.attname
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| RawColumn {
            ordinal_position: row.ordinal_position,
            name: row.name,
            data_type: row.data_type,
            is_nullable: row.is_nullable,
            max_length: row.max_length,
            precision: row.precision,
            scale: row.scale,
            default_value: row.default_value,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct PrimaryKeyRow {
    name: String,
    columns: Vec<String>,
}

pub async fn get_primary_key(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Option<RawPrimaryKey>> {
    let row = sqlx::query_as::<_, PrimaryKeyRow>(
        r#"
        select
          con.conname::text as name,
          array_agg(att.attname::text order by ord.ordinality) as columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join unnest(con.conkey) with ordinality as ord(attnum, ordinality) on true
        join pg_attribute att on att.attrelid = rel.oid and att.attnum = ord.attnum
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype = 'p'
        group by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(pool)
    .await
    .map_err(db_error)?;

    Ok(row.map(|row| RawPrimaryKey {
        name: Some(row.name),
        columns: row.columns,
    }))
}

#[derive(sqlx::FromRow)]
struct ForeignKeyRow {
    name: String,
    columns: Vec<String>,
    referenced_table: String,
    referenced_schema: Option<String>,
    referenced_columns: Vec<String>,
}

pub async fn list_foreign_keys(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<RawForeignKey>> {
    let rows = sqlx::query_as::<_, ForeignKeyRow>(
        r#"
        select
          con.conname::text as name,
          array(
            select att.attname::text
            from unnest(con.conkey) with ordinality as k(attnum, ordinality)
            join pg_attribute att on att.attrelid = con.conrelid and att.attnum = k.attnum
            order by k.ordinality
          ) as columns,
          ref.relname::text as referenced_table,
          nullif(ref_nsp.nspname, nsp.nspname)::text as referenced_schema,
          array(
            select att.attname::text
            from unnest(con.confkey) with ordinality as k(attnum, ordinality)
            join pg_attribute att on att.attrelid = con.confrelid and att.attnum = k.attnum
            order by k.ordinality
          ) as referenced_columns
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        join pg_class ref on ref.oid = con.confrelid
        join pg_namespace ref_nsp on ref_nsp.oid = ref.relnamespace
        where nsp.nspname = $1
          and rel.relname = $2
          and con.contype = 'f'
        order by con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| RawForeignKey {
            name: Some(row.name),
            columns: row.columns,
            referenced_table: row.referenced_table,
            referenced_schema: row.referenced_schema,
            referenced_columns: row.referenced_columns,
        })
        .collect())
}

pub async fn get_view_definition(pool: &PgPool, schema: &str, view: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select pg_get_viewdef(c.oid, true)
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and c.relkind in ('v', 'm')
        "#,
    )
    .bind(schema)
    .bind(view)
    .fetch_optional(pool)
    .await
    .map_err(db_error)
}

pub async fn get_routine_definition(
    pool: &PgPool,
    schema: &str,
    routine: &str,
) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select pg_get_functiondef(p.oid)
        from pg_proc p
        join pg_namespace n on n.oid = p.pronamespace
        where n.nspname = $1
          and p.proname = $2
          and p.prokind in ('f', 'p')
        order by p.oid
        limit 1
        "#,
    )
    .bind(schema)
    .bind(routine)
    .fetch_optional(pool)
    .await
    .map_err(db_error)
}
