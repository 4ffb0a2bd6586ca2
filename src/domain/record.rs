//! Flat, exporter-facing records.

use serde::{ser::SerializeMap, Serialize, Serializer};

/// Scalar or list value of one exported field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    /// Single-cell rendering; lists are joined with `delimiter`. Booleans
    /// are capitalized the way existing spreadsheet imports expect.
    pub fn to_cell(&self, delimiter: &str) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Bool(true) => "True".to_owned(),
            Self::Bool(false) => "False".to_owned(),
            Self::List(values) => values.join(delimiter),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(value) => serializer.serialize_str(value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::List(values) => values.serialize(serializer),
        }
    }
}

/// Ordered mapping of field name to value. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportRecord {
    fields: Vec<(&'static str, FieldValue)>,
}

impl ExportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, FieldValue::Text(value.into())));
        self
    }

    pub fn integer(mut self, name: &'static str, value: i64) -> Self {
        self.fields.push((name, FieldValue::Integer(value)));
        self
    }

    pub fn flag(mut self, name: &'static str, value: bool) -> Self {
        self.fields.push((name, FieldValue::Bool(value)));
        self
    }

    pub fn list(mut self, name: &'static str, values: Vec<String>) -> Self {
        self.fields.push((name, FieldValue::List(values)));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for ExportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
