mod config;
mod engine;
mod logging;
mod output;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use schemalens_core::{
    DatabaseSchema, Error as CoreError, SqlType, build_fk_graph_report, redact_connection_string,
};
use schemalens_introspect::{
    CatalogAdapter, CatalogDump, PostgresCatalog, ReaderOptions, SchemaReader, SqliteCatalog,
};
use schemalens_sql::{CURRENT_PAGE_PARAM, PAGE_SIZE_PARAM, SqlWriter, simple_format};
use thiserror::Error;

use config::CliConfig;
use engine::Engine;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config file error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("strict check failed: {0}")]
    Strict(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "schemalens",
    version,
    about = "Read database schemas and generate dialect-specific SQL"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// `postgres://` URL, `sqlite:` URL or path to a `.json` catalog dump.
    #[arg(long, global = true, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// TOML settings file; flags override its values.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// PostgreSQL schema to read (default `public`).
    #[arg(long, global = true, value_name = "SCHEMA")]
    postgres_schema: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read every table, view and procedure and print the schema as JSON.
    Read(ReadArgs),
    /// Read one table (foreign keys stay unlinked) and print it as JSON.
    Table(TableArgs),
    /// Print the paging SELECT for one table.
    PageSql(PageSqlArgs),
    /// Print the JSON Schema of the `read` output.
    JsonSchema(JsonSchemaArgs),
}

#[derive(Args, Debug)]
struct ReadArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fetch view and procedure sources eagerly.
    #[arg(long, default_value_t = false)]
    load_sources: bool,
    /// Fail when a foreign key points outside the read schema or the key graph has a cycle.
    #[arg(long, default_value_t = false)]
    strict: bool,
    #[arg(long = "exclude-table", value_name = "NAME")]
    exclude_tables: Vec<String>,
    #[arg(long = "exclude-view", value_name = "NAME")]
    exclude_views: Vec<String>,
    #[arg(long = "exclude-procedure", value_name = "NAME")]
    exclude_procedures: Vec<String>,
}

#[derive(Args, Debug)]
struct TableArgs {
    name: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PageSqlArgs {
    table: String,
    /// Dialect of the generated SQL; defaults to the config or the catalog dialect.
    #[arg(long)]
    dialect: Option<SqlType>,
    #[arg(long, default_value = PAGE_SIZE_PARAM)]
    page_size_param: String,
    #[arg(long, default_value = CURRENT_PAGE_PARAM)]
    current_page_param: String,
    /// Keep line breaks instead of printing one line.
    #[arg(long, default_value_t = false)]
    multiline: bool,
}

#[derive(Args, Debug)]
struct JsonSchemaArgs {
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json)?;

    if let Command::JsonSchema(args) = &cli.command {
        let schema = schemars::schema_for!(DatabaseSchema);
        return output::write_json(&schema, args.out.as_deref());
    }

    let config = match &cli.source.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let conn = cli
        .source
        .conn
        .clone()
        .or_else(|| config.conn.clone())
        .ok_or_else(|| {
            CliError::InvalidConfig("connection string is required (--conn or config)".to_string())
        })?;

    let engine = Engine::detect(&conn)?;
    let options = reader_options(&config, &cli.command);
    tracing::info!(
        event = "source_selected",
        engine = %engine,
        conn = %redact_connection_string(&conn)
    );

    let timer = Instant::now();
    match engine {
        Engine::Postgres => {
            let pool = engine::connect_postgres(&conn).await?;
            let schema = cli
                .source
                .postgres_schema
                .clone()
                .or_else(|| config.postgres_schema.clone())
                .unwrap_or_else(|| "public".to_string());
            let catalog = PostgresCatalog::with_schema(pool, schema);
            run(SchemaReader::with_options(catalog, options), &config, cli.command).await?;
        }
        Engine::Sqlite => {
            let pool = engine::connect_sqlite(&conn).await?;
            let catalog = SqliteCatalog::new(pool);
            run(SchemaReader::with_options(catalog, options), &config, cli.command).await?;
        }
        Engine::Dump => {
            let catalog = CatalogDump::from_path(&conn)?;
            run(SchemaReader::with_options(catalog, options), &config, cli.command).await?;
        }
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

/// Reader options from the config file with command-line exclusions added.
fn reader_options(config: &CliConfig, command: &Command) -> ReaderOptions {
    let mut options = config.reader.clone();
    if let Command::Read(args) = command {
        options.load_sources |= args.load_sources;
        let exclusions = &mut options.exclusions;
        for name in &args.exclude_tables {
            exclusions.table_filter.exclude(name.as_str());
        }
        for name in &args.exclude_views {
            exclusions.view_filter.exclude(name.as_str());
        }
        for name in &args.exclude_procedures {
            exclusions.stored_procedure_filter.exclude(name.as_str());
        }
    }
    options
}

async fn run<C: CatalogAdapter>(
    reader: SchemaReader<C>,
    config: &CliConfig,
    command: Command,
) -> Result<(), CliError> {
    match command {
        Command::Read(args) => {
            let schema = reader.read_all().await?;
            check_schema(&schema, args.strict)?;
            output::write_json(&schema, args.out.as_deref())
        }
        Command::Table(args) => {
            let table = reader.table(&args.name).await?;
            output::write_json(&table, args.out.as_deref())
        }
        Command::PageSql(args) => {
            let table = reader.table(&args.table).await?;
            let dialect = args
                .dialect
                .or(config.dialect)
                .unwrap_or_else(|| reader.catalog().dialect());
            let sql = SqlWriter::new(&table, dialect)
                .select_page_sql_with(&args.page_size_param, &args.current_page_param)?;
            let sql = if args.multiline { sql } else { simple_format(&sql) };
            output::write_text(&sql)
        }
        Command::JsonSchema(_) => Err(CliError::InvalidConfig(
            "json-schema does not read a catalog".to_string(),
        )),
    }
}

fn check_schema(schema: &DatabaseSchema, strict: bool) -> Result<(), CliError> {
    let report = build_fk_graph_report(schema);
    tracing::info!(
        event = "fk_graph",
        nodes = report.summary.nodes,
        edges = report.summary.edges,
        has_cycle = report.cycle.is_some()
    );

    if !strict {
        return Ok(());
    }
    if let Some(dangling) = schema.unresolved_foreign_keys().first() {
        let (table, column) = dangling;
        return Err(CliError::Strict(format!(
            "{}.{} references {}, which is not in the schema",
            table.name,
            column.name,
            column.foreign_key_table_name().unwrap_or("?")
        )));
    }
    if let Some(cycle) = report.cycle {
        return Err(CliError::Strict(format!(
            "foreign key graph contains a cycle: {}",
            cycle.join(" -> ")
        )));
    }
    Ok(())
}
