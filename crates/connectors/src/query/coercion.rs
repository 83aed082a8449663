use crate::{error::QueryError, query::service::ColumnInfo};
use model::{
    core::{data_type::DataType, value::Value},
    records::row::RowData,
};

/// Column name and resolved type, read once per page.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub data_type: DataType,
}

impl From<&ColumnInfo> for ColumnMeta {
    fn from(info: &ColumnInfo) -> Self {
        ColumnMeta {
            name: info.name.clone(),
            data_type: DataType::from_declared(&info.declared_type),
        }
    }
}

pub fn column_meta(columns: &[ColumnInfo]) -> Vec<ColumnMeta> {
    columns.iter().map(ColumnMeta::from).collect()
}

/// Builds a row from raw cells. Null cells are left out of the row.
pub fn decode_row(cells: &[Option<String>], columns: &[ColumnMeta]) -> Result<RowData, QueryError> {
    if cells.len() > columns.len() {
        return Err(QueryError::ColumnCountMismatch {
            expected: columns.len(),
            actual: cells.len(),
        });
    }

    let mut row = RowData::default();
    for (cell, col) in cells.iter().zip(columns) {
        if let Some(raw) = cell {
            let value = coerce_value(&col.name, raw, &col.data_type)?;
            row.push(col.name.clone(), value);
        }
    }

    Ok(row)
}

pub fn coerce_value(column: &str, raw: &str, data_type: &DataType) -> Result<Value, QueryError> {
    let failed = || QueryError::CoercionFailed {
        column: column.to_string(),
        raw_value: raw.to_string(),
    };

    let value = match data_type {
        DataType::VarChar | DataType::Date | DataType::Timestamp => Value::String(raw.to_string()),
        DataType::TinyInt | DataType::SmallInt | DataType::Integer => {
            Value::Int32(raw.parse::<i32>().map_err(|_| failed())?)
        }
        DataType::BigInt => Value::Int(raw.parse::<i64>().map_err(|_| failed())?),
        DataType::Double | DataType::Decimal => {
            if raw.contains('.') {
                Value::Float(raw.parse::<f64>().map_err(|_| failed())?)
            } else {
                Value::Int(raw.parse::<i64>().map_err(|_| failed())?)
            }
        }
        DataType::Float => {
            if raw.contains('.') {
                Value::Float32(raw.parse::<f32>().map_err(|_| failed())?)
            } else {
                Value::Int(raw.parse::<i64>().map_err(|_| failed())?)
            }
        }
        DataType::Boolean => Value::Boolean(parse_bool(raw).ok_or_else(failed)?),
        DataType::Array => Value::StringArray(split_array(raw)),
        DataType::Unsupported(name) => return Err(QueryError::UnsupportedColumnType(name.clone())),
    };

    Ok(value)
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// Elements stay untyped and embedded ", " sequences are not escaped.
fn split_array(raw: &str) -> Vec<String> {
    let inner = raw.strip_prefix('[').unwrap_or(raw);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(", ").map(str::to_string).collect()
}
