//! Core contracts and helpers for schemalens.
//!
//! This crate defines the schema model, the data type registry, name filters
//! and validation helpers shared by the catalog adapters, the SQL writer and
//! the CLI.

pub mod constraints;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod graph;
pub mod redaction;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{ForeignKey, ForeignKeyRef, ForeignKeyTarget, PrimaryKey, TableId};
pub use dialect::SqlType;
pub use error::{Error, Result};
pub use filter::{EntityKind, Exclusions, Filter, NamePattern, NameRule};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use redaction::redact_connection_string;
pub use schema::{Column, DatabaseSchema, StoredProcedure, Table, View, resolve_foreign_key_table};
pub use types::{ClrType, DataType, DataTypeRegistry, TargetLanguage, TypeCategory};
pub use validation::{validate_schema, validate_table};

/// Current contract version for schema snapshots.
pub const SCHEMA_VERSION: &str = "0.1";
