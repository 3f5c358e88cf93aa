use anyhow::{Context, Result, anyhow};
use schemalens_core::{ClrType, ForeignKeyTarget, SqlType};
use schemalens_introspect::{PostgresCatalog, SchemaReader};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, fs};

const FIXTURE_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/postgres_northwind.sql"
);

/// Connection string for the integration database, if one is configured.
fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL").ok()
}

async fn reset_fixture(pool: &PgPool) -> Result<()> {
    let script = fs::read_to_string(FIXTURE_PATH)
        .with_context(|| format!("reading fixture {FIXTURE_PATH}"))?;

    for statement in script.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }

        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture statement: {sql}"))?;
    }

    Ok(())
}

#[tokio::test]
async fn introspects_northwind_schema() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres introspection");
        return Ok(());
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&db_url)
        .await
        .context("connecting to Postgres")?;

    reset_fixture(&pool).await?;

    let mut reader = SchemaReader::new(PostgresCatalog::with_schema(pool, "northwind"));
    reader.exclusions_mut().table_filter.exclude("categories");

    let schema = reader.read_all().await?;
    assert_eq!(schema.dialect, SqlType::PostgreSql);

    let table_names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        table_names,
        vec!["employees", "order_details", "orders", "products", "suppliers"]
    );

    let products = schema
        .find_table_by_name("products")
        .ok_or_else(|| anyhow!("expected products table"))?;
    let columns: Vec<&str> = products.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        columns,
        vec![
            "product_id",
            "product_name",
            "supplier_id",
            "category_id",
            "unit_price",
            "units_in_stock",
            "discontinued",
        ]
    );

    let product_name = products
        .find_column("product_name")
        .ok_or_else(|| anyhow!("expected product_name"))?;
    assert_eq!(product_name.length, Some(40));
    assert!(!product_name.is_nullable);

    let unit_price = products
        .find_column("unit_price")
        .ok_or_else(|| anyhow!("expected unit_price"))?;
    assert_eq!(unit_price.precision, Some(10));
    assert_eq!(unit_price.scale, Some(2));
    assert_eq!(
        unit_price.data_type.as_ref().map(|dt| dt.clr_type),
        Some(ClrType::Decimal)
    );

    let supplier_id = products
        .find_column("supplier_id")
        .ok_or_else(|| anyhow!("expected supplier_id"))?;
    assert_eq!(
        schema.foreign_key_table(supplier_id).map(|t| t.name.as_str()),
        Some("suppliers")
    );

    let category_id = products
        .find_column("category_id")
        .ok_or_else(|| anyhow!("expected category_id"))?;
    assert_eq!(
        category_id.foreign_key.as_ref().map(|fk| fk.target),
        Some(ForeignKeyTarget::Excluded)
    );

    let orders = schema
        .find_table_by_name("orders")
        .ok_or_else(|| anyhow!("expected orders table"))?;
    let employee_id = orders
        .find_column("employee_id")
        .ok_or_else(|| anyhow!("expected employee_id"))?;
    assert_eq!(
        schema.foreign_key_table(employee_id).map(|t| t.name.as_str()),
        Some("employees")
    );

    // Same table name, other schema: flagged, never linked to northwind.employees.
    let approved_by = orders
        .find_column("approved_by")
        .ok_or_else(|| anyhow!("expected approved_by"))?;
    let approver = approved_by
        .foreign_key
        .as_ref()
        .ok_or_else(|| anyhow!("expected approved_by foreign key"))?;
    assert_eq!(approver.table_name, "northwind_audit.employees");
    assert_eq!(approver.target, ForeignKeyTarget::Missing);
    assert!(schema.foreign_key_table(approved_by).is_none());

    let tags = orders
        .find_column("tags")
        .and_then(|c| c.data_type.as_ref())
        .ok_or_else(|| anyhow!("expected tags type"))?;
    assert_eq!(tags.clr_type, ClrType::String);
    assert!(tags.is_array);

    let details = schema
        .find_table_by_name("order_details")
        .ok_or_else(|| anyhow!("expected order_details table"))?;
    let key = details
        .primary_key
        .as_ref()
        .ok_or_else(|| anyhow!("expected composite key"))?;
    assert_eq!(key.columns, vec!["order_id", "product_id"]);

    let view = schema
        .find_view_by_name("current_products")
        .ok_or_else(|| anyhow!("expected current_products view"))?;
    let view_sql = reader.view_source(view).await?;
    assert!(view_sql.contains("discontinued"));

    let function = schema
        .find_stored_procedure_by_name("product_count")
        .ok_or_else(|| anyhow!("expected product_count function"))?;
    let function_sql = reader.procedure_source(function).await?;
    assert!(function_sql.contains("count(*)"));

    Ok(())
}
