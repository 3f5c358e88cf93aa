use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use schemalens_core::{
    DataType, DataTypeRegistry, DatabaseSchema, EntityKind, Error, Exclusions, ForeignKeyTarget,
    Result, StoredProcedure, Table, View, validate_schema, validate_table,
};

use crate::catalog::CatalogAdapter;
use crate::mapper;
use crate::options::ReaderOptions;

/// Builds schema models from a catalog adapter.
///
/// Reads are all-or-nothing: the first catalog failure aborts the build and
/// is returned as `Error::Catalog` naming the entity being fetched.
#[derive(Debug)]
pub struct SchemaReader<C> {
    catalog: C,
    options: ReaderOptions,
    registry: DataTypeRegistry,
}

impl<C: CatalogAdapter> SchemaReader<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, ReaderOptions::default())
    }

    pub fn with_options(catalog: C, options: ReaderOptions) -> Self {
        let registry = DataTypeRegistry::for_dialect(catalog.dialect());
        Self {
            catalog,
            options,
            registry,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.options.exclusions
    }

    /// Filters to configure before reading. A read in progress borrows the
    /// reader, so filters cannot change underneath it.
    pub fn exclusions_mut(&mut self) -> &mut Exclusions {
        &mut self.options.exclusions
    }

    /// Data types known for the catalog's dialect.
    pub fn data_types(&self) -> Vec<DataType> {
        self.registry.data_types()
    }

    /// Read one table by name.
    ///
    /// The name bypasses the table filter. Foreign key columns are flagged
    /// but stay `Unlinked`: cross-table links are only made by full reads.
    pub async fn table(&self, name: &str) -> Result<Table> {
        let names = self
            .catalog
            .list_table_names()
            .await
            .map_err(in_context("table list"))?;
        if !names.iter().any(|candidate| candidate == name) {
            return Err(Error::not_found(EntityKind::Table, name));
        }
        self.build_table(name).await
    }

    /// Read every table that passes the table filter, with foreign keys linked.
    ///
    /// Links are `TableId`s into the returned vector. Each table passes the
    /// same column and key checks as a full `read_all`.
    pub async fn all_tables(&self) -> Result<Vec<Table>> {
        self.load_tables().await
    }

    /// Read tables, views and stored procedures into a linked schema.
    pub async fn read_all(&self) -> Result<DatabaseSchema> {
        let dialect = self.catalog.dialect();
        info!(event = "read_started", dialect = %dialect);

        let tables = self.load_tables().await?;

        let view_names = self
            .enumerate(EntityKind::View, self.catalog.list_view_names().await)
            .map_err(in_context("view list"))?;
        let procedure_names = self
            .enumerate(
                EntityKind::StoredProcedure,
                self.catalog.list_procedure_names().await,
            )
            .map_err(in_context("stored procedure list"))?;

        let mut schema = DatabaseSchema::new(dialect);
        schema.tables = tables;
        schema.views = view_names.into_iter().map(View::new).collect();
        schema.stored_procedures = procedure_names
            .into_iter()
            .map(StoredProcedure::new)
            .collect();
        schema.data_types = self.registry.data_types();

        if self.options.load_sources {
            for view in &schema.views {
                self.view_source(view).await?;
            }
            for procedure in &schema.stored_procedures {
                self.procedure_source(procedure).await?;
            }
        }

        validate_schema(&schema)?;

        info!(
            event = "read_finished",
            tables = schema.tables.len(),
            views = schema.views.len(),
            stored_procedures = schema.stored_procedures.len(),
            unresolved_foreign_keys = schema.unresolved_foreign_keys().len(),
        );
        Ok(schema)
    }

    /// Source SQL of a view, fetched on first use and cached on the view.
    pub async fn view_source<'v>(&self, view: &'v View) -> Result<&'v str> {
        if let Some(sql) = view.source() {
            return Ok(sql);
        }
        let sql = self
            .catalog
            .get_view_source(&view.name)
            .await
            .map_err(in_context(format!("view {}", view.name)))?;
        debug!(view = %view.name, bytes = sql.len(), "view source fetched");
        Ok(view.cache_source(sql))
    }

    /// Source SQL of a stored procedure, fetched on first use and cached.
    pub async fn procedure_source<'p>(&self, procedure: &'p StoredProcedure) -> Result<&'p str> {
        if let Some(sql) = procedure.source() {
            return Ok(sql);
        }
        let sql = self
            .catalog
            .get_procedure_source(&procedure.name)
            .await
            .map_err(in_context(format!("stored procedure {}", procedure.name)))?;
        debug!(procedure = %procedure.name, bytes = sql.len(), "procedure source fetched");
        Ok(procedure.cache_source(sql))
    }

    async fn load_tables(&self) -> Result<Vec<Table>> {
        let candidates = self
            .catalog
            .list_table_names()
            .await
            .map_err(in_context("table list"))?;

        let (kept, excluded): (Vec<String>, Vec<String>) = candidates
            .into_iter()
            .partition(|name| self.exclusions().should_include(EntityKind::Table, name));
        let excluded: BTreeSet<String> = excluded.into_iter().collect();
        if !excluded.is_empty() {
            debug!(excluded = ?excluded, "tables removed by filter");
        }

        let mut tables = Vec::with_capacity(kept.len());
        for name in &kept {
            let table = self.build_table(name).await?;
            validate_table(&table)?;
            tables.push(table);
        }

        mapper::link_foreign_keys(&mut tables, |name| excluded.contains(name));

        for table in &tables {
            for column in &table.columns {
                let Some(fk) = &column.foreign_key else {
                    continue;
                };
                match fk.target {
                    ForeignKeyTarget::Excluded => warn!(
                        table = %table.name,
                        column = %column.name,
                        referenced_table = %fk.table_name,
                        "foreign key references a table excluded by the filter"
                    ),
                    ForeignKeyTarget::Missing => warn!(
                        table = %table.name,
                        column = %column.name,
                        referenced_table = %fk.table_name,
                        "foreign key references a table the catalog did not list"
                    ),
                    _ => {}
                }
            }
        }

        Ok(tables)
    }

    async fn build_table(&self, name: &str) -> Result<Table> {
        let entity = format!("table {name}");
        let raw_columns = self
            .catalog
            .get_columns(name)
            .await
            .map_err(in_context(entity.clone()))?;
        let raw_pk = self
            .catalog
            .get_primary_key(name)
            .await
            .map_err(in_context(entity.clone()))?;
        let raw_fks = self
            .catalog
            .get_foreign_keys(name)
            .await
            .map_err(in_context(entity))?;

        debug!(
            table = name,
            columns = raw_columns.len(),
            foreign_keys = raw_fks.len(),
            "table metadata fetched"
        );

        let table = mapper::map_table(name, raw_columns, raw_pk, raw_fks, &self.registry);
        for column in &table.columns {
            if column.data_type.as_ref().is_some_and(DataType::is_opaque) {
                warn!(
                    table = name,
                    column = %column.name,
                    db_data_type = %column.db_data_type,
                    "unrecognized data type treated as opaque"
                );
            }
        }
        Ok(table)
    }

    fn enumerate(&self, kind: EntityKind, names: Result<Vec<String>>) -> Result<Vec<String>> {
        let exclusions = self.exclusions();
        Ok(names?
            .into_iter()
            .filter(|name| exclusions.should_include(kind, name))
            .collect())
    }
}

/// Attach the entity being read to an adapter failure. `NotFound` passes through.
fn in_context(entity: impl Into<String>) -> impl FnOnce(Error) -> Error {
    let entity = entity.into();
    move |err| match err {
        Error::NotFound { .. } => err,
        other => Error::catalog(entity, other),
    }
}
