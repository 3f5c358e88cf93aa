//! Catalog adapters and the schema reader.
//!
//! A [`CatalogAdapter`] yields raw rows from one vendor catalog; the
//! [`SchemaReader`] filters, assembles and links them into a
//! [`DatabaseSchema`].

pub mod catalog;
pub mod dump;
pub mod mapper;
pub mod options;
pub mod postgres;
pub mod reader;
pub mod sqlite;

pub use catalog::{CatalogAdapter, RawColumn, RawForeignKey, RawPrimaryKey};
pub use dump::{CatalogDump, DumpSource, DumpTable};
pub use options::ReaderOptions;
pub use postgres::PostgresCatalog;
pub use reader::SchemaReader;
pub use sqlite::SqliteCatalog;

pub use schemalens_core::DatabaseSchema;
