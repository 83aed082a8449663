use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type tag as declared in a result set's metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    VarChar,
    Date,
    Timestamp,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Decimal,
    Float,
    Boolean,
    Array,
    /// A declared type with no coercion rule. Only fails once a non-null
    /// value of this type actually has to be coerced.
    Unsupported(String),
}

impl DataType {
    pub fn from_declared(type_name: &str) -> Self {
        match Self::normalize_type_name(type_name).as_str() {
            "varchar" => DataType::VarChar,
            "date" => DataType::Date,
            "timestamp" => DataType::Timestamp,
            "tinyint" => DataType::TinyInt,
            "smallint" => DataType::SmallInt,
            "integer" => DataType::Integer,
            "bigint" => DataType::BigInt,
            "double" => DataType::Double,
            "decimal" => DataType::Decimal,
            "float" => DataType::Float,
            "boolean" => DataType::Boolean,
            "array" => DataType::Array,
            _ => DataType::Unsupported(type_name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataType::VarChar => "varchar",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::TinyInt => "tinyint",
            DataType::SmallInt => "smallint",
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Unsupported(name) => name,
        }
    }

    fn normalize_type_name(type_name: &str) -> String {
        type_name.trim().to_ascii_lowercase()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
