use anyhow::{Context, Result};
use schemalens_core::{SqlType, Table};
use schemalens_introspect::{SchemaReader, SqliteCatalog};
use schemalens_sql::{CURRENT_PAGE_PARAM, PAGE_SIZE_PARAM, SqlWriter, simple_format};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

const PRODUCT_COUNT: i64 = 23;

async fn fixture_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("opening in-memory sqlite")?;

    sqlx::query(
        "CREATE TABLE Products (
            ProductID INTEGER PRIMARY KEY,
            ProductName NVARCHAR(40) NOT NULL,
            UnitPrice MONEY
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE TABLE AuditLog (At TEXT NOT NULL, Message TEXT NOT NULL)")
        .execute(&pool)
        .await?;

    // Insert out of key order so paging has to sort.
    for offset in 0..PRODUCT_COUNT {
        let id = (offset * 7) % PRODUCT_COUNT + 1;
        sqlx::query("INSERT INTO Products (ProductID, ProductName, UnitPrice) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(format!("Product {id}"))
            .bind(id as f64 * 1.5)
            .execute(&pool)
            .await?;
    }
    for (at, message) in [
        ("2024-01-02", "b"),
        ("2024-01-01", "z"),
        ("2024-01-02", "a"),
        ("2024-01-01", "y"),
    ] {
        sqlx::query("INSERT INTO AuditLog (At, Message) VALUES (?1, ?2)")
            .bind(at)
            .bind(message)
            .execute(&pool)
            .await?;
    }

    Ok(pool)
}

async fn read_table(pool: &SqlitePool, name: &str) -> Result<Table> {
    let reader = SchemaReader::new(SqliteCatalog::new(pool.clone()));
    Ok(reader.table(name).await?)
}

/// Replace the paging parameters with literal values for execution.
fn bind_page(writer: &SqlWriter<'_>, sql: &str, page_size: i64, current_page: i64) -> String {
    sql.replace(&writer.parameter_name(PAGE_SIZE_PARAM), &page_size.to_string())
        .replace(&writer.parameter_name(CURRENT_PAGE_PARAM), &current_page.to_string())
}

/// Replace column parameters with SQL literals.
fn bind_values(writer: &SqlWriter<'_>, sql: String, values: &[(&str, &str)]) -> String {
    values.iter().fold(sql, |sql, (name, value)| {
        sql.replace(&writer.parameter_name(name), value)
    })
}

#[tokio::test]
async fn every_dialect_returns_the_exact_row_window() -> Result<()> {
    let pool = fixture_pool().await?;
    let products = read_table(&pool, "Products").await?;
    let page_size = 5;

    for dialect in SqlType::ALL {
        let writer = SqlWriter::new(&products, dialect);
        let template = writer.select_page_sql()?;

        for page in 1..=6 {
            let sql = bind_page(&writer, &template, page_size, page);
            let rows = sqlx::query(&sql)
                .fetch_all(&pool)
                .await
                .with_context(|| format!("{dialect} page {page}: {sql}"))?;
            let ids: Vec<i64> = rows
                .iter()
                .map(|row| row.try_get::<i64, _>(0))
                .collect::<Result<_, _>>()?;

            let first = (page - 1) * page_size + 1;
            let last = (page * page_size).min(PRODUCT_COUNT);
            let expected: Vec<i64> = (first..=last).collect();
            assert_eq!(ids, expected, "{dialect} page {page}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn one_line_paging_sql_runs_unchanged() -> Result<()> {
    let pool = fixture_pool().await?;
    let products = read_table(&pool, "Products").await?;

    for dialect in SqlType::ALL {
        let writer = SqlWriter::new(&products, dialect);
        let formatted = simple_format(&writer.select_page_sql()?);
        assert!(!formatted.contains('\n'), "{dialect}: {formatted}");
        assert_eq!(simple_format(&formatted), formatted);

        let sql = bind_page(&writer, &formatted, 10, 3);
        let rows = sqlx::query(&sql).fetch_all(&pool).await?;
        assert_eq!(rows.len() as i64, PRODUCT_COUNT - 20, "{dialect}");
    }
    Ok(())
}

#[tokio::test]
async fn keyless_table_pages_by_every_column() -> Result<()> {
    let pool = fixture_pool().await?;
    let audit = read_table(&pool, "AuditLog").await?;
    assert!(audit.primary_key.is_none());

    let writer = SqlWriter::new(&audit, SqlType::SqlServer);
    let sql = bind_page(&writer, &writer.select_page_sql()?, 2, 2);
    let rows = sqlx::query(&sql).fetch_all(&pool).await?;
    let messages: Vec<String> = rows
        .iter()
        .map(|row| row.try_get::<String, _>(1))
        .collect::<Result<_, _>>()?;
    assert_eq!(messages, vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn keyed_statements_round_trip_a_row() -> Result<()> {
    let pool = fixture_pool().await?;
    let products = read_table(&pool, "Products").await?;
    let writer = SqlWriter::new(&products, SqlType::Sqlite);

    let insert = bind_values(
        &writer,
        writer.insert_sql()?,
        &[("ProductID", "100"), ("ProductName", "'Chai'"), ("UnitPrice", "18")],
    );
    sqlx::query(&insert).execute(&pool).await?;

    let count: i64 = sqlx::query_scalar(&writer.count_sql()).fetch_one(&pool).await?;
    assert_eq!(count, PRODUCT_COUNT + 1);

    let update = bind_values(
        &writer,
        writer.update_sql()?,
        &[("ProductID", "100"), ("ProductName", "'Chang'"), ("UnitPrice", "19")],
    );
    sqlx::query(&update).execute(&pool).await?;

    let select = bind_values(&writer, writer.select_by_id_sql()?, &[("ProductID", "100")]);
    let row = sqlx::query(&select).fetch_one(&pool).await?;
    assert_eq!(row.try_get::<String, _>(1)?, "Chang");

    let delete = bind_values(&writer, writer.delete_sql()?, &[("ProductID", "100")]);
    let result = sqlx::query(&delete).execute(&pool).await?;
    assert_eq!(result.rows_affected(), 1);
    Ok(())
}

#[tokio::test]
async fn column_named_row_number_keeps_its_values() -> Result<()> {
    let pool = fixture_pool().await?;
    sqlx::query("CREATE TABLE Standings (TeamID INTEGER PRIMARY KEY, rowNumber INTEGER NOT NULL)")
        .execute(&pool)
        .await?;
    for id in [4_i64, 1, 6, 3, 5, 2] {
        sqlx::query("INSERT INTO Standings (TeamID, rowNumber) VALUES (?1, ?2)")
            .bind(id)
            .bind(100 + id)
            .execute(&pool)
            .await?;
    }
    let standings = read_table(&pool, "Standings").await?;

    for dialect in [SqlType::SqlServer, SqlType::MySql, SqlType::Oracle] {
        let writer = SqlWriter::new(&standings, dialect);
        let template = writer.select_page_sql()?;
        assert!(template.contains("AS rowNumber_1,"), "{dialect}: {template}");

        let sql = bind_page(&writer, &template, 2, 2);
        let rows = sqlx::query(&sql)
            .fetch_all(&pool)
            .await
            .with_context(|| format!("{dialect}: {sql}"))?;
        let values: Vec<(i64, i64)> = rows
            .iter()
            .map(|row| -> Result<(i64, i64), sqlx::Error> {
                Ok((row.try_get(0)?, row.try_get(1)?))
            })
            .collect::<Result<_, _>>()?;
        assert_eq!(values, vec![(3, 103), (4, 104)], "{dialect}");
    }
    Ok(())
}
