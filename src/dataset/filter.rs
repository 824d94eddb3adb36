use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named column of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Keeps rows whose `field` value is one of `allowed_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyOfFilter {
    pub field: Field,
    pub allowed_values: Vec<Value>,
}

impl AnyOfFilter {
    pub fn new(field: impl Into<String>, allowed_values: Vec<Value>) -> Self {
        Self {
            field: Field::new(field),
            allowed_values,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.allowed_values.iter().any(|allowed| values_match(allowed, value))
    }
}

/// Row-selection predicate: every filter must accept the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceDefinition {
    pub filters_to_apply: Vec<AnyOfFilter>,
}

impl SliceDefinition {
    pub fn new(filters_to_apply: Vec<AnyOfFilter>) -> Self {
        Self { filters_to_apply }
    }

    /// The slice that keeps every row.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: AnyOfFilter) -> Self {
        self.filters_to_apply.push(filter);
        self
    }
}

// 1 and 1.0 are the same value for filtering purposes.
fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn any_of_accepts_listed_values_only() {
        let f = AnyOfFilter::new("brand", vec![json!("A"), json!(3)]);
        assert!(f.accepts(&json!("A")));
        assert!(f.accepts(&json!(3.0)));
        assert!(!f.accepts(&json!("B")));
        assert!(!f.accepts(&Value::Null));
    }

    #[test]
    fn slice_definition_deserializes_from_toml_shape() {
        let slice: SliceDefinition = serde_json::from_value(json!({
            "filters_to_apply": [{ "field": "brand", "allowed_values": ["A"] }]
        }))
        .unwrap();
        assert_eq!(slice.filters_to_apply[0].field.name, "brand");
    }
}
