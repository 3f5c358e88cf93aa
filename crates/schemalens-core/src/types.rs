use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dialect::SqlType;
use crate::schema::Column;

/// Broad semantic family of a data type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    String,
    Numeric,
    Boolean,
    DateTime,
    Binary,
    Guid,
    /// Vendor type the registry does not know; treated like a string downstream.
    Opaque,
}

/// Normalized value kind a vendor type maps onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClrType {
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Single,
    Double,
    String,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Bytes,
}

impl ClrType {
    pub fn category(self) -> TypeCategory {
        match self {
            ClrType::Boolean => TypeCategory::Boolean,
            ClrType::Byte
            | ClrType::Int16
            | ClrType::Int32
            | ClrType::Int64
            | ClrType::Decimal
            | ClrType::Single
            | ClrType::Double => TypeCategory::Numeric,
            ClrType::String => TypeCategory::String,
            ClrType::DateTime | ClrType::DateTimeOffset | ClrType::TimeSpan => {
                TypeCategory::DateTime
            }
            ClrType::Guid => TypeCategory::Guid,
            ClrType::Bytes => TypeCategory::Binary,
        }
    }

    /// Reference types in C# are nullable already and never take a `?` suffix.
    fn is_value_type(self) -> bool {
        !matches!(self, ClrType::String | ClrType::Bytes)
    }

    fn csharp_name(self) -> &'static str {
        match self {
            ClrType::Boolean => "bool",
            ClrType::Byte => "byte",
            ClrType::Int16 => "short",
            ClrType::Int32 => "int",
            ClrType::Int64 => "long",
            ClrType::Decimal => "decimal",
            ClrType::Single => "float",
            ClrType::Double => "double",
            ClrType::String => "string",
            ClrType::DateTime => "DateTime",
            ClrType::DateTimeOffset => "DateTimeOffset",
            ClrType::TimeSpan => "TimeSpan",
            ClrType::Guid => "Guid",
            ClrType::Bytes => "byte[]",
        }
    }

    fn rust_name(self) -> &'static str {
        match self {
            ClrType::Boolean => "bool",
            ClrType::Byte => "u8",
            ClrType::Int16 => "i16",
            ClrType::Int32 => "i32",
            ClrType::Int64 => "i64",
            ClrType::Decimal => "rust_decimal::Decimal",
            ClrType::Single => "f32",
            ClrType::Double => "f64",
            ClrType::String => "String",
            ClrType::DateTime => "chrono::NaiveDateTime",
            ClrType::DateTimeOffset => "chrono::DateTime<chrono::FixedOffset>",
            ClrType::TimeSpan => "chrono::NaiveTime",
            ClrType::Guid => "uuid::Uuid",
            ClrType::Bytes => "Vec<u8>",
        }
    }
}

/// Language whose type spelling `DataType::code_name` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLanguage {
    CSharp,
    Rust,
}

/// Normalized descriptor for a vendor data type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DataType {
    /// Normalized vendor name (e.g. `nvarchar`, `character varying`).
    pub type_name: String,
    pub category: TypeCategory,
    pub clr_type: ClrType,
    /// Array of `type_name` elements (`integer[]`, `text ARRAY`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_array: bool,
}

impl DataType {
    pub fn new(type_name: impl Into<String>, clr_type: ClrType) -> Self {
        Self {
            type_name: type_name.into(),
            category: clr_type.category(),
            clr_type,
            is_array: false,
        }
    }

    /// The same element type wrapped in an array.
    pub fn into_array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Descriptor for a vendor type the registry does not recognize.
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            category: TypeCategory::Opaque,
            clr_type: ClrType::String,
            is_array: false,
        }
    }

    pub fn is_string(&self) -> bool {
        self.category == TypeCategory::String
    }

    pub fn is_numeric(&self) -> bool {
        self.category == TypeCategory::Numeric
    }

    pub fn is_date_time(&self) -> bool {
        self.category == TypeCategory::DateTime
    }

    pub fn is_opaque(&self) -> bool {
        self.category == TypeCategory::Opaque
    }

    /// C# type spelling for a column of this type, honoring nullability.
    pub fn net_code_name(&self, column: &Column) -> String {
        self.code_name(column, TargetLanguage::CSharp)
    }

    pub fn code_name(&self, column: &Column, language: TargetLanguage) -> String {
        match language {
            TargetLanguage::CSharp => {
                let name = self.clr_type.csharp_name();
                if self.is_array {
                    format!("{name}[]")
                } else if column.is_nullable && self.clr_type.is_value_type() {
                    format!("{name}?")
                } else {
                    name.to_string()
                }
            }
            TargetLanguage::Rust => {
                let name = if self.is_array {
                    format!("Vec<{}>", self.clr_type.rust_name())
                } else {
                    self.clr_type.rust_name().to_string()
                };
                if column.is_nullable {
                    format!("Option<{name}>")
                } else {
                    name
                }
            }
        }
    }
}

const SQL_SERVER_TYPES: &[(&str, ClrType)] = &[
    ("bigint", ClrType::Int64),
    ("binary", ClrType::Bytes),
    ("bit", ClrType::Boolean),
    ("char", ClrType::String),
    ("date", ClrType::DateTime),
    ("datetime", ClrType::DateTime),
    ("datetime2", ClrType::DateTime),
    ("datetimeoffset", ClrType::DateTimeOffset),
    ("decimal", ClrType::Decimal),
    ("float", ClrType::Double),
    ("image", ClrType::Bytes),
    ("int", ClrType::Int32),
    ("money", ClrType::Decimal),
    ("nchar", ClrType::String),
    ("ntext", ClrType::String),
    ("numeric", ClrType::Decimal),
    ("nvarchar", ClrType::String),
    ("real", ClrType::Single),
    ("rowversion", ClrType::Bytes),
    ("smalldatetime", ClrType::DateTime),
    ("smallint", ClrType::Int16),
    ("smallmoney", ClrType::Decimal),
    ("sysname", ClrType::String),
    ("text", ClrType::String),
    ("time", ClrType::TimeSpan),
    ("timestamp", ClrType::Bytes),
    ("tinyint", ClrType::Byte),
    ("uniqueidentifier", ClrType::Guid),
    ("varbinary", ClrType::Bytes),
    ("varchar", ClrType::String),
    ("xml", ClrType::String),
];

const POSTGRES_TYPES: &[(&str, ClrType)] = &[
    ("bigint", ClrType::Int64),
    ("bigserial", ClrType::Int64),
    ("bool", ClrType::Boolean),
    ("boolean", ClrType::Boolean),
    ("bpchar", ClrType::String),
    ("bytea", ClrType::Bytes),
    ("char", ClrType::String),
    ("character", ClrType::String),
    ("character varying", ClrType::String),
    ("citext", ClrType::String),
    ("date", ClrType::DateTime),
    ("double precision", ClrType::Double),
    ("float4", ClrType::Single),
    ("float8", ClrType::Double),
    ("int2", ClrType::Int16),
    ("int4", ClrType::Int32),
    ("int8", ClrType::Int64),
    ("integer", ClrType::Int32),
    ("interval", ClrType::TimeSpan),
    ("json", ClrType::String),
    ("jsonb", ClrType::String),
    ("money", ClrType::Decimal),
    ("name", ClrType::String),
    ("numeric", ClrType::Decimal),
    ("decimal", ClrType::Decimal),
    ("real", ClrType::Single),
    ("serial", ClrType::Int32),
    ("smallint", ClrType::Int16),
    ("smallserial", ClrType::Int16),
    ("text", ClrType::String),
    ("time", ClrType::TimeSpan),
    ("time without time zone", ClrType::TimeSpan),
    ("timestamp", ClrType::DateTime),
    ("timestamp without time zone", ClrType::DateTime),
    ("timestamp with time zone", ClrType::DateTimeOffset),
    ("timestamptz", ClrType::DateTimeOffset),
    ("uuid", ClrType::Guid),
    ("varchar", ClrType::String),
    ("xml", ClrType::String),
];

const MYSQL_TYPES: &[(&str, ClrType)] = &[
    ("bigint", ClrType::Int64),
    ("binary", ClrType::Bytes),
    ("bit", ClrType::Boolean),
    ("blob", ClrType::Bytes),
    ("bool", ClrType::Boolean),
    ("boolean", ClrType::Boolean),
    ("char", ClrType::String),
    ("date", ClrType::DateTime),
    ("datetime", ClrType::DateTime),
    ("decimal", ClrType::Decimal),
    ("double", ClrType::Double),
    ("enum", ClrType::String),
    ("float", ClrType::Single),
    ("int", ClrType::Int32),
    ("integer", ClrType::Int32),
    ("json", ClrType::String),
    ("longblob", ClrType::Bytes),
    ("longtext", ClrType::String),
    ("mediumblob", ClrType::Bytes),
    ("mediumint", ClrType::Int32),
    ("mediumtext", ClrType::String),
    ("numeric", ClrType::Decimal),
    ("set", ClrType::String),
    ("smallint", ClrType::Int16),
    ("text", ClrType::String),
    ("time", ClrType::TimeSpan),
    ("timestamp", ClrType::DateTime),
    ("tinyblob", ClrType::Bytes),
    ("tinyint", ClrType::Byte),
    ("tinytext", ClrType::String),
    ("varbinary", ClrType::Bytes),
    ("varchar", ClrType::String),
    ("year", ClrType::Int16),
];

const SQLITE_TYPES: &[(&str, ClrType)] = &[
    ("bigint", ClrType::Int64),
    ("bit", ClrType::Boolean),
    ("blob", ClrType::Bytes),
    ("boolean", ClrType::Boolean),
    ("char", ClrType::String),
    ("clob", ClrType::String),
    ("date", ClrType::DateTime),
    ("datetime", ClrType::DateTime),
    ("decimal", ClrType::Decimal),
    ("double", ClrType::Double),
    ("float", ClrType::Double),
    ("guid", ClrType::Guid),
    ("image", ClrType::Bytes),
    ("int", ClrType::Int32),
    ("integer", ClrType::Int64),
    ("money", ClrType::Decimal),
    ("nchar", ClrType::String),
    ("ntext", ClrType::String),
    ("numeric", ClrType::Decimal),
    ("nvarchar", ClrType::String),
    ("real", ClrType::Double),
    ("smallint", ClrType::Int16),
    ("text", ClrType::String),
    ("tinyint", ClrType::Byte),
    ("uniqueidentifier", ClrType::Guid),
    ("varbinary", ClrType::Bytes),
    ("varchar", ClrType::String),
];

const ORACLE_TYPES: &[(&str, ClrType)] = &[
    ("binary_double", ClrType::Double),
    ("binary_float", ClrType::Single),
    ("blob", ClrType::Bytes),
    ("char", ClrType::String),
    ("clob", ClrType::String),
    ("date", ClrType::DateTime),
    ("float", ClrType::Decimal),
    ("integer", ClrType::Decimal),
    ("long", ClrType::String),
    ("nchar", ClrType::String),
    ("nclob", ClrType::String),
    ("number", ClrType::Decimal),
    ("nvarchar2", ClrType::String),
    ("raw", ClrType::Bytes),
    ("timestamp", ClrType::DateTime),
    ("timestamp with time zone", ClrType::DateTimeOffset),
    ("timestamp with local time zone", ClrType::DateTimeOffset),
    ("varchar2", ClrType::String),
    ("xmltype", ClrType::String),
];

/// Maps vendor type names of one dialect onto normalized data types.
#[derive(Debug, Clone)]
pub struct DataTypeRegistry {
    dialect: SqlType,
    known: BTreeMap<&'static str, ClrType>,
}

impl DataTypeRegistry {
    pub fn for_dialect(dialect: SqlType) -> Self {
        let table = match dialect {
            SqlType::SqlServer => SQL_SERVER_TYPES,
            SqlType::PostgreSql => POSTGRES_TYPES,
            SqlType::MySql => MYSQL_TYPES,
            SqlType::Sqlite => SQLITE_TYPES,
            SqlType::Oracle => ORACLE_TYPES,
        };
        Self {
            dialect,
            known: table.iter().copied().collect(),
        }
    }

    pub fn dialect(&self) -> SqlType {
        self.dialect
    }

    /// Every type the dialect knows about, ordered by name.
    pub fn data_types(&self) -> Vec<DataType> {
        self.known
            .iter()
            .map(|(name, clr)| DataType::new(*name, *clr))
            .collect()
    }

    /// Resolve a vendor type name. Unknown names degrade to an opaque type;
    /// array spellings resolve to their element type flagged as an array,
    /// except on SQLite where the declared type only picks an affinity.
    pub fn resolve(
        &self,
        vendor_type_name: &str,
        precision: Option<i32>,
        scale: Option<i32>,
    ) -> DataType {
        let (normalized, is_array) = split_type_name(vendor_type_name);
        let element = self.resolve_element(normalized, vendor_type_name, precision, scale);
        if is_array && self.dialect != SqlType::Sqlite {
            element.into_array()
        } else {
            element
        }
    }

    fn resolve_element(
        &self,
        normalized: String,
        vendor_type_name: &str,
        precision: Option<i32>,
        scale: Option<i32>,
    ) -> DataType {
        if let Some(clr) = self.precision_rule(&normalized, vendor_type_name, precision, scale) {
            return DataType::new(normalized, clr);
        }

        match self.known.get(normalized.as_str()) {
            Some(clr) => DataType::new(normalized, *clr),
            None if self.dialect == SqlType::Sqlite => sqlite_affinity(normalized),
            None => DataType::opaque(normalized),
        }
    }

    fn precision_rule(
        &self,
        normalized: &str,
        raw: &str,
        precision: Option<i32>,
        scale: Option<i32>,
    ) -> Option<ClrType> {
        match (self.dialect, normalized) {
            (SqlType::Oracle, "number") if scale == Some(0) => match precision {
                Some(p) if p <= 4 => Some(ClrType::Int16),
                Some(p) if p <= 9 => Some(ClrType::Int32),
                Some(p) if p <= 18 => Some(ClrType::Int64),
                _ => None,
            },
            (SqlType::MySql, "tinyint") if type_argument(raw) == Some(1) => {
                Some(ClrType::Boolean)
            }
            (SqlType::MySql, "bit") => {
                let width = type_argument(raw).or(precision).unwrap_or(1);
                if width > 1 {
                    Some(ClrType::Int64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Lower-case the name, drop `(...)` arguments, array markers and MySQL
/// modifiers, collapse whitespace.
pub fn normalize_type_name(raw: &str) -> String {
    split_type_name(raw).0
}

/// Normalized element name plus whether the spelling declared an array
/// (`integer[]`, `text[][]`, `int ARRAY[4]`).
fn split_type_name(raw: &str) -> (String, bool) {
    let mut stripped = String::with_capacity(raw.len());
    let mut parens = 0usize;
    let mut brackets = 0usize;
    let mut is_array = false;
    for ch in raw.chars() {
        match ch {
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            '[' => {
                brackets += 1;
                is_array = true;
            }
            ']' => brackets = brackets.saturating_sub(1),
            _ if parens == 0 && brackets == 0 => stripped.push(ch),
            _ => {}
        }
    }

    let lowered = stripped.to_lowercase();
    let mut words = Vec::new();
    for word in lowered.split_whitespace() {
        match word {
            "unsigned" | "zerofill" => {}
            "array" => is_array = true,
            _ => words.push(word),
        }
    }
    (words.join(" "), is_array)
}

/// First numeric argument of a type spelling, e.g. `40` in `nvarchar(40)`.
pub fn type_argument(raw: &str) -> Option<i32> {
    let start = raw.find('(')?;
    let end = raw[start..].find(')')? + start;
    raw[start + 1..end].split(',').next()?.trim().parse().ok()
}

fn sqlite_affinity(normalized: String) -> DataType {
    let clr = if normalized.contains("int") {
        ClrType::Int64
    } else if ["char", "clob", "text"]
        .iter()
        .any(|needle| normalized.contains(needle))
    {
        ClrType::String
    } else if normalized.contains("blob") {
        ClrType::Bytes
    } else if ["real", "floa", "doub"]
        .iter()
        .any(|needle| normalized.contains(needle))
    {
        ClrType::Double
    } else if normalized.is_empty() {
        return DataType::opaque(normalized);
    } else {
        ClrType::Decimal
    };
    DataType::new(normalized, clr)
}
