use thiserror::Error;

use crate::filter::EntityKind;

/// Core error type shared across schemalens crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A table, view or procedure requested by name does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
    /// Catalog metadata could not be fetched for an entity; the build was aborted.
    #[error("catalog failure while reading {entity}: {source}")]
    Catalog {
        entity: String,
        #[source]
        source: Box<Error>,
    },
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Filters, dumps or other caller-provided configuration are malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A requested feature is not supported by the dialect or table shape.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Wrap an adapter failure with the entity that was being read.
    pub fn catalog(entity: impl Into<String>, source: Error) -> Self {
        Error::Catalog {
            entity: entity.into(),
            source: Box::new(source),
        }
    }

    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Convenience alias for results returned by schemalens crates.
pub type Result<T> = std::result::Result<T, Error>;
