//! Property bag record implementation
//!
//! A [`PropertyBag`] is an ordered list of named values. It backs records
//! built in code and records decoded from JSON.
//!
//! JSON decoding follows the usual scalar mapping plus two extended forms
//! borrowed from extended JSON, since plain JSON has no exact decimals or
//! timestamps:
//! - `{"$decimal": "19.90"}` → [`Value::Decimal`]
//! - `{"$date": "2024-03-01T10:00:00Z"}` → [`Value::DateTime`]

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};

use super::{Record, RecordRef, Value};
use crate::error::RecordError;

/// Name of the identity field
const ID_FIELD: &str = "Id";

/// Ordered, in-memory record
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    id: i64,
    fields: Vec<(String, Value)>,
}

impl PropertyBag {
    /// Create an empty record with the given identity
    ///
    /// The identity is also exposed as the `Id` field.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: vec![(ID_FIELD.to_string(), Value::Int(id))],
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an existing value with the same name
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if name == ID_FIELD {
            if let Some(id) = value.as_i64() {
                self.id = id;
            }
        }
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Attach a nested record
    pub fn with_record(self, name: &str, record: PropertyBag) -> Self {
        self.with(name, Value::Record(Arc::new(record)))
    }

    /// Attach a nested record collection
    pub fn with_list(self, name: &str, records: Vec<PropertyBag>) -> Self {
        let items: Vec<RecordRef> = records
            .into_iter()
            .map(|r| Arc::new(r) as RecordRef)
            .collect();
        self.with(name, Value::List(items))
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    /// Decode a record from a JSON object
    ///
    /// # Arguments
    /// * `json` - JSON value, must be an object
    ///
    /// # Returns
    /// * `Result<PropertyBag, String>` - Decoded record or a description of the problem
    pub fn from_json(json: &JsonValue) -> Result<Self, String> {
        match json {
            JsonValue::Object(map) => Self::from_json_object(map),
            other => Err(format!("expected a JSON object, found {}", json_kind(other))),
        }
    }

    fn from_json_object(map: &Map<String, JsonValue>) -> Result<Self, String> {
        let mut bag = PropertyBag::default();
        for (key, value) in map {
            let value = convert_json(key, value)?;
            bag.set(key, value);
        }
        if !bag.fields.iter().any(|(key, _)| key == ID_FIELD) {
            bag.fields.insert(0, (ID_FIELD.to_string(), Value::Int(0)));
        }
        Ok(bag)
    }
}

impl Record for PropertyBag {
    fn id(&self) -> i64 {
        self.id
    }

    fn get(&self, name: &str) -> Result<Value, RecordError> {
        Ok(self
            .fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }
}

/// Convert one JSON field into a record value
fn convert_json(key: &str, value: &JsonValue) -> Result<Value, String> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::String(s) => Ok(Value::Text(s.clone())),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("field '{key}': number out of range")),
        },
        JsonValue::Object(map) => {
            if let Some(raw) = map.get("$decimal") {
                return parse_decimal(key, raw);
            }
            if let Some(raw) = map.get("$date") {
                return parse_date(key, raw);
            }
            let nested = PropertyBag::from_json_object(map)?;
            Ok(Value::Record(Arc::new(nested)))
        }
        JsonValue::Array(items) => {
            let mut records: Vec<RecordRef> = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    JsonValue::Object(map) => {
                        records.push(Arc::new(PropertyBag::from_json_object(map)?));
                    }
                    other => {
                        return Err(format!(
                            "field '{key}': arrays may only contain objects, found {}",
                            json_kind(other)
                        ));
                    }
                }
            }
            Ok(Value::List(records))
        }
    }
}

fn parse_decimal(key: &str, raw: &JsonValue) -> Result<Value, String> {
    let text = match raw {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        other => {
            return Err(format!(
                "field '{key}': $decimal expects a string, found {}",
                json_kind(other)
            ));
        }
    };
    Decimal::from_str(text.trim())
        .map(Value::Decimal)
        .map_err(|e| format!("field '{key}': invalid decimal '{text}': {e}"))
}

fn parse_date(key: &str, raw: &JsonValue) -> Result<Value, String> {
    let text = raw
        .as_str()
        .ok_or_else(|| format!("field '{key}': $date expects an RFC 3339 string"))?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
        .map_err(|e| format!("field '{key}': invalid date '{text}': {e}"))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
