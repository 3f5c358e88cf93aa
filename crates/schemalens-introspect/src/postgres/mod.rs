use async_trait::async_trait;
use sqlx::PgPool;

use schemalens_core::{EntityKind, Error, Result, SqlType};

use crate::catalog::{CatalogAdapter, RawColumn, RawForeignKey, RawPrimaryKey};

mod queries;

/// Catalog adapter for one PostgreSQL namespace.
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
    schema: String,
}

impl PostgresCatalog {
    /// Adapter over the `public` schema using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public")
    }

    pub fn with_schema(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

#[async_trait]
impl CatalogAdapter for PostgresCatalog {
    fn dialect(&self) -> SqlType {
        SqlType::PostgreSql
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        queries::list_relations(&self.pool, &self.schema, &["r", "p"]).await
    }

    async fn list_view_names(&self) -> Result<Vec<String>> {
        queries::list_relations(&self.pool, &self.schema, &["v", "m"]).await
    }

    async fn list_procedure_names(&self) -> Result<Vec<String>> {
        queries::list_routines(&self.pool, &self.schema).await
    }

    async fn get_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        queries::list_columns(&self.pool, &self.schema, table).await
    }

    async fn get_primary_key(&self, table: &str) -> Result<Option<RawPrimaryKey>> {
        queries::get_primary_key(&self.pool, &self.schema, table).await
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>> {
        queries::list_foreign_keys(&self.pool, &self.schema, table).await
    }

    async fn get_view_source(&self, view: &str) -> Result<String> {
        queries::get_view_definition(&self.pool, &self.schema, view)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::View, view))
    }

    async fn get_procedure_source(&self, procedure: &str) -> Result<String> {
        queries::get_routine_definition(&self.pool, &self.schema, procedure)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::StoredProcedure, procedure))
    }
}
