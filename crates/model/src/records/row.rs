use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// One decoded result row: column name to coerced value, in column order.
/// Null cells are not represented at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.field_values.push(FieldValue {
            name: name.into(),
            value,
        });
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values.iter().find(|f| f.name == field)
    }

    pub fn get_value(&self, field: &str) -> Option<&Value> {
        self.get(field).map(|f| &f.value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.field_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }

    /// JSON object keyed by column name. A repeated column name keeps its
    /// last value.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .field_values
            .iter()
            .map(|f| (f.name.clone(), f.value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_to_json() {
        let mut row = RowData::default();
        row.push("id", Value::Int32(7));
        row.push("name", Value::String("ada".into()));

        assert_eq!(row.len(), 2);
        assert_eq!(row.get_value("id"), Some(&Value::Int32(7)));
        assert!(row.get_value("missing").is_none());
        assert_eq!(row.to_json(), serde_json::json!({"id": 7, "name": "ada"}));
    }
}
