use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Class of named entity a filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    View,
    StoredProcedure,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Table => "table",
            EntityKind::View => "view",
            EntityKind::StoredProcedure => "stored procedure",
        })
    }
}

/// Regular expression matched against entity names.
#[derive(Debug, Clone)]
pub struct NamePattern(Regex);

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(NamePattern)
            .map_err(|err| Error::InvalidConfig(format!("invalid name pattern {pattern:?}: {err}")))
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

impl TryFrom<String> for NamePattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        NamePattern::new(&value)
    }
}

impl Serialize for NamePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for NamePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NamePattern::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// A single name predicate.
///
/// In configuration files a bare string is an exact name; tables
/// `{ prefix = "..." }` and `{ pattern = "..." }` select the other forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameRule {
    Exact(String),
    Prefix { prefix: String },
    Pattern { pattern: NamePattern },
}

impl NameRule {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameRule::Exact(exact) => exact == name,
            NameRule::Prefix { prefix } => name.starts_with(prefix.as_str()),
            NameRule::Pattern { pattern } => pattern.is_match(name),
        }
    }
}

/// Inclusion/exclusion rules for one entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub exclusions: Vec<NameRule>,
    /// When non-empty, only names matching one of these rules are kept.
    pub inclusions: Vec<NameRule>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(&mut self, name: impl Into<String>) -> &mut Self {
        self.exclusions.push(NameRule::Exact(name.into()));
        self
    }

    pub fn exclude_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.exclusions.push(NameRule::Prefix {
            prefix: prefix.into(),
        });
        self
    }

    pub fn exclude_matching(&mut self, pattern: &str) -> Result<&mut Self> {
        self.exclusions.push(NameRule::Pattern {
            pattern: NamePattern::new(pattern)?,
        });
        Ok(self)
    }

    pub fn include(&mut self, name: impl Into<String>) -> &mut Self {
        self.inclusions.push(NameRule::Exact(name.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty() && self.inclusions.is_empty()
    }

    pub fn should_include(&self, name: &str) -> bool {
        if self.exclusions.iter().any(|rule| rule.matches(name)) {
            return false;
        }
        self.inclusions.is_empty() || self.inclusions.iter().any(|rule| rule.matches(name))
    }
}

/// Per-kind filters consulted while enumerating a full schema.
///
/// Single-table reads by explicit name bypass these filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    pub table_filter: Filter,
    pub view_filter: Filter,
    pub stored_procedure_filter: Filter,
}

impl Exclusions {
    pub fn filter(&self, kind: EntityKind) -> &Filter {
        match kind {
            EntityKind::Table => &self.table_filter,
            EntityKind::View => &self.view_filter,
            EntityKind::StoredProcedure => &self.stored_procedure_filter,
        }
    }

    pub fn should_include(&self, kind: EntityKind, name: &str) -> bool {
        self.filter(kind).should_include(name)
    }
}
