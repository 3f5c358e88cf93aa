use anyhow::{Context, Result, anyhow};
use schemalens_core::{Error, ForeignKeyTarget, TargetLanguage};
use schemalens_introspect::{CatalogDump, ReaderOptions, SchemaReader};

const NORTHWIND: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/northwind.json");

fn northwind_reader() -> Result<SchemaReader<CatalogDump>> {
    let dump = CatalogDump::from_path(NORTHWIND).context("loading northwind dump")?;
    Ok(SchemaReader::new(dump))
}

#[tokio::test]
async fn single_table_keeps_ordinal_order_without_links() -> Result<()> {
    let reader = northwind_reader()?;
    let products = reader.table("Products").await?;

    let names: Vec<&str> = products.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ProductID",
            "ProductName",
            "SupplierID",
            "CategoryID",
            "QuantityPerUnit",
            "UnitPrice",
            "UnitsInStock",
            "UnitsOnOrder",
            "ReorderLevel",
            "Discontinued",
        ]
    );

    let product_id = products.find_column("ProductID").ok_or_else(|| anyhow!("ProductID"))?;
    assert!(product_id.is_primary_key);

    let supplier_id = products.find_column("SupplierID").ok_or_else(|| anyhow!("SupplierID"))?;
    assert!(supplier_id.is_foreign_key());
    assert_eq!(supplier_id.foreign_key_table_name(), Some("Suppliers"));

    for column in products.columns.iter().filter(|c| c.is_foreign_key()) {
        let fk = column.foreign_key.as_ref().ok_or_else(|| anyhow!("fk"))?;
        assert_eq!(fk.target, ForeignKeyTarget::Unlinked, "{} was linked", column.name);
    }

    let product_name = products.find_column("ProductName").ok_or_else(|| anyhow!("ProductName"))?;
    assert_eq!(product_name.length, Some(40));
    Ok(())
}

#[tokio::test]
async fn single_table_columns_have_code_names() -> Result<()> {
    let reader = northwind_reader()?;
    let products = reader.table("Products").await?;

    let declarations: Vec<String> = products
        .columns
        .iter()
        .map(|column| {
            let data_type = column.data_type.as_ref().expect("data type resolved");
            format!("{} {}", data_type.net_code_name(column), column.name)
        })
        .collect();

    assert_eq!(
        declarations,
        vec![
            "int ProductID",
            "string ProductName",
            "int? SupplierID",
            "int? CategoryID",
            "string QuantityPerUnit",
            "decimal? UnitPrice",
            "short? UnitsInStock",
            "short? UnitsOnOrder",
            "short? ReorderLevel",
            "bool Discontinued",
        ]
    );

    let unit_price = products.find_column("UnitPrice").ok_or_else(|| anyhow!("UnitPrice"))?;
    let rust = unit_price
        .data_type
        .as_ref()
        .map(|dt| dt.code_name(unit_price, TargetLanguage::Rust));
    assert_eq!(rust.as_deref(), Some("Option<rust_decimal::Decimal>"));
    Ok(())
}

#[tokio::test]
async fn read_all_links_foreign_keys_to_tables() -> Result<()> {
    let reader = northwind_reader()?;
    let schema = reader.read_all().await?;

    let products = schema
        .find_table_by_name("Products")
        .ok_or_else(|| anyhow!("Products missing"))?;
    let supplier_id = products.find_column("SupplierID").ok_or_else(|| anyhow!("SupplierID"))?;
    assert!(supplier_id.is_foreign_key());
    assert_eq!(
        schema.foreign_key_table(supplier_id).map(|t| t.name.as_str()),
        Some("Suppliers")
    );

    let employees = schema
        .find_table_by_name("Employees")
        .ok_or_else(|| anyhow!("Employees missing"))?;
    let reports_to = employees.find_column("ReportsTo").ok_or_else(|| anyhow!("ReportsTo"))?;
    assert_eq!(
        schema.foreign_key_table(reports_to).map(|t| t.name.as_str()),
        Some("Employees")
    );

    for table in &schema.tables {
        for column in &table.columns {
            let Some(fk) = &column.foreign_key else {
                continue;
            };
            let linked = schema
                .foreign_key_table(column)
                .ok_or_else(|| anyhow!("{}.{} not linked", table.name, column.name))?;
            assert_eq!(linked.name, fk.table_name);
        }
    }

    assert!(schema.unresolved_foreign_keys().is_empty());
    assert_eq!(schema.views.len(), 2);
    assert_eq!(schema.stored_procedures.len(), 2);
    assert!(schema.data_types.iter().any(|dt| dt.type_name == "nvarchar"));
    Ok(())
}

#[tokio::test]
async fn unknown_vendor_types_degrade_to_opaque() -> Result<()> {
    let reader = northwind_reader()?;
    let employees = reader.table("Employees").await?;

    let location = employees.find_column("Location").ok_or_else(|| anyhow!("Location"))?;
    let data_type = location.data_type.as_ref().ok_or_else(|| anyhow!("no type"))?;
    assert!(data_type.is_opaque());
    assert_eq!(data_type.net_code_name(location), "string");
    Ok(())
}

#[tokio::test]
async fn all_tables_links_within_returned_tables() -> Result<()> {
    let reader = northwind_reader()?;
    let tables = reader.all_tables().await?;

    let products = tables
        .iter()
        .find(|t| t.name == "Products")
        .ok_or_else(|| anyhow!("Products missing"))?;
    let category_id = products.find_column("CategoryID").ok_or_else(|| anyhow!("CategoryID"))?;
    let linked = schemalens_core::resolve_foreign_key_table(&tables, category_id)
        .ok_or_else(|| anyhow!("CategoryID not linked"))?;
    assert_eq!(linked.name, "Categories");
    Ok(())
}

#[tokio::test]
async fn exclusions_remove_entities_and_leave_flagged_references() -> Result<()> {
    let mut reader = northwind_reader()?;
    let exclusions = reader.exclusions_mut();
    exclusions.table_filter.exclude("Categories");
    exclusions.view_filter.exclude("Alphabetical list of products");
    exclusions.stored_procedure_filter.exclude("CustOrderHist");

    let schema = reader.read_all().await?;

    assert!(schema.find_table_by_name("Categories").is_none());
    assert!(schema.find_table_by_name("Products").is_some());
    assert!(schema.find_table_by_name("Suppliers").is_some());
    assert!(schema.find_view_by_name("Alphabetical list of products").is_none());
    assert!(schema.find_view_by_name("Current Product List").is_some());
    assert!(schema.find_stored_procedure_by_name("CustOrderHist").is_none());
    assert!(schema.find_stored_procedure_by_name("Ten Most Expensive Products").is_some());

    let products = schema
        .find_table_by_name("Products")
        .ok_or_else(|| anyhow!("Products missing"))?;
    let category_id = products.find_column("CategoryID").ok_or_else(|| anyhow!("CategoryID"))?;
    assert!(category_id.is_foreign_key());
    assert_eq!(
        category_id.foreign_key.as_ref().map(|fk| fk.target),
        Some(ForeignKeyTarget::Excluded)
    );
    assert!(schema.foreign_key_table(category_id).is_none());

    let dangling = schema.unresolved_foreign_keys();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].1.name, "CategoryID");
    Ok(())
}

#[tokio::test]
async fn table_filter_does_not_touch_views_or_procedures() -> Result<()> {
    let mut reader = northwind_reader()?;
    reader
        .exclusions_mut()
        .table_filter
        .exclude("Current Product List")
        .exclude("CustOrderHist");

    let schema = reader.read_all().await?;
    assert!(schema.find_view_by_name("Current Product List").is_some());
    assert!(schema.find_stored_procedure_by_name("CustOrderHist").is_some());
    assert_eq!(schema.tables.len(), 4);
    Ok(())
}

#[tokio::test]
async fn explicit_table_read_bypasses_filter() -> Result<()> {
    let mut reader = northwind_reader()?;
    reader.exclusions_mut().table_filter.exclude("Categories");

    let categories = reader.table("Categories").await?;
    assert_eq!(categories.name, "Categories");
    Ok(())
}

#[tokio::test]
async fn missing_table_is_not_found() -> Result<()> {
    let reader = northwind_reader()?;
    let err = reader.table("Orders").await.expect_err("Orders is not in the dump");
    assert!(matches!(err, Error::NotFound { ref name, .. } if name == "Orders"));
    Ok(())
}

#[tokio::test]
async fn view_sources_load_lazily_and_cache() -> Result<()> {
    let reader = northwind_reader()?;
    let schema = reader.read_all().await?;

    let view = schema
        .find_view_by_name("Current Product List")
        .ok_or_else(|| anyhow!("view missing"))?;
    assert!(view.source().is_none());

    let sql = reader.view_source(view).await?;
    assert!(sql.contains("Product_List"));
    assert_eq!(view.source(), Some(sql));

    let procedure = schema
        .find_stored_procedure_by_name("CustOrderHist")
        .ok_or_else(|| anyhow!("procedure missing"))?;
    assert!(reader.procedure_source(procedure).await?.starts_with("CREATE PROCEDURE"));
    Ok(())
}

#[tokio::test]
async fn load_sources_fetches_eagerly() -> Result<()> {
    let dump = CatalogDump::from_path(NORTHWIND)?;
    let reader = SchemaReader::with_options(
        dump,
        ReaderOptions {
            load_sources: true,
            ..ReaderOptions::default()
        },
    );
    let schema = reader.read_all().await?;

    for view in &schema.views {
        assert!(view.source().is_some(), "{} has no source", view.name);
    }
    for procedure in &schema.stored_procedures {
        assert!(procedure.source().is_some(), "{} has no source", procedure.name);
    }
    Ok(())
}

#[tokio::test]
async fn data_types_lists_dialect_registry() -> Result<()> {
    let reader = northwind_reader()?;
    let types = reader.data_types();
    assert!(types.iter().any(|dt| dt.type_name == "money" && dt.is_numeric()));
    assert!(types.iter().any(|dt| dt.type_name == "datetime" && dt.is_date_time()));
    Ok(())
}
