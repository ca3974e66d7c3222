// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table entities as decoded from the OData JSON wire format.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const TYPE_ANNOTATION: &str = "@odata.type";
const METADATA_PREFIX: &str = "odata.";

/// Native property types of the table service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmType {
    String,
    Int32,
    Int64,
    Double,
    Boolean,
    DateTime,
    Guid,
    Binary,
}

impl EdmType {
    /// Returns the wire name, e.g. `Edm.Int64`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdmType::String => "Edm.String",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::Double => "Edm.Double",
            EdmType::Boolean => "Edm.Boolean",
            EdmType::DateTime => "Edm.DateTime",
            EdmType::Guid => "Edm.Guid",
            EdmType::Binary => "Edm.Binary",
        }
    }

    /// Infers the type of an unannotated JSON value.
    ///
    /// The service omits annotations for strings, booleans, 32-bit integers
    /// and doubles. Returns `None` for nulls and nested values.
    pub fn infer(value: &Value) -> Option<EdmType> {
        match value {
            Value::String(_) => Some(EdmType::String),
            Value::Bool(_) => Some(EdmType::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_i64() {
                Some(v) if i32::try_from(v).is_ok() => Some(EdmType::Int32),
                _ => Some(EdmType::Int64),
            },
            Value::Number(_) => Some(EdmType::Double),
            _ => None,
        }
    }

    /// Narrowest type that holds values of both `self` and `other`.
    ///
    /// Integers widen to `Int64`, integers and doubles to `Double`. Any other
    /// mix of kinds falls back to `String`.
    pub fn widen(self, other: EdmType) -> EdmType {
        use EdmType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Int32, Int64) | (Int64, Int32) => Int64,
            (Int32 | Int64, Double) | (Double, Int32 | Int64) => Double,
            _ => String,
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Edm.String" => Ok(EdmType::String),
            "Edm.Int32" => Ok(EdmType::Int32),
            "Edm.Int64" => Ok(EdmType::Int64),
            "Edm.Double" => Ok(EdmType::Double),
            "Edm.Boolean" => Ok(EdmType::Boolean),
            "Edm.DateTime" => Ok(EdmType::DateTime),
            "Edm.Guid" => Ok(EdmType::Guid),
            "Edm.Binary" => Ok(EdmType::Binary),
            other => Err(format!("unknown EDM type '{other}'")),
        }
    }
}

/// A single typed property of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperty {
    pub edm_type: EdmType,
    pub value: Value,
}

/// A schema-less record stored in a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    properties: BTreeMap<String, EntityProperty>,
}

impl Entity {
    /// Creates an empty entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, replacing any previous value with the same name.
    pub fn with_property(mut self, name: impl Into<String>, edm_type: EdmType, value: Value) -> Self {
        self.properties
            .insert(name.into(), EntityProperty { edm_type, value });
        self
    }

    /// Decodes an entity from its wire representation.
    ///
    /// OData metadata (`odata.etag`, `odata.id`, ...) is dropped, explicit
    /// `@odata.type` annotations win over inference and null properties are
    /// skipped since the service never stores them.
    pub fn from_wire(object: &Map<String, Value>) -> Self {
        let mut entity = Entity::new();
        for (name, value) in object {
            if name.starts_with(METADATA_PREFIX) || name.contains(TYPE_ANNOTATION) {
                continue;
            }
            let annotated = object
                .get(&format!("{name}{TYPE_ANNOTATION}"))
                .and_then(Value::as_str)
                .and_then(|t| t.parse::<EdmType>().ok());
            if let Some(edm_type) = annotated.or_else(|| EdmType::infer(value)) {
                entity = entity.with_property(name.clone(), edm_type, value.clone());
            }
        }
        entity
    }

    /// Iterates over properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &EntityProperty)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&EntityProperty> {
        self.properties.get(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Converts the entity into a plain attribute map.
    ///
    /// `Edm.Int64` values travel as strings on the wire and are turned back
    /// into numbers here when they parse.
    pub fn into_row(self) -> BTreeMap<String, Value> {
        self.properties
            .into_iter()
            .map(|(name, property)| {
                let value = match (property.edm_type, property.value) {
                    (EdmType::Int64, Value::String(s)) => match s.parse::<i64>() {
                        Ok(v) => Value::from(v),
                        Err(_) => Value::String(s),
                    },
                    (_, value) => value,
                };
                (name, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_widen_types() {
        assert_eq!(EdmType::Int32.widen(EdmType::Int32), EdmType::Int32);
        assert_eq!(EdmType::Int32.widen(EdmType::Int64), EdmType::Int64);
        assert_eq!(EdmType::Int64.widen(EdmType::Double), EdmType::Double);
        assert_eq!(EdmType::Double.widen(EdmType::Int32), EdmType::Double);
        assert_eq!(EdmType::Boolean.widen(EdmType::Int32), EdmType::String);
        assert_eq!(EdmType::DateTime.widen(EdmType::Guid), EdmType::String);
    }

    #[test]
    fn test_edm_type_parse() {
        assert_eq!("Edm.Int64".parse::<EdmType>().unwrap(), EdmType::Int64);
        assert!("Edm.Decimal".parse::<EdmType>().is_err());
        assert_eq!(EdmType::DateTime.to_string(), "Edm.DateTime");
    }

    #[test]
    fn test_infer_json_types() {
        assert_eq!(EdmType::infer(&json!("x")), Some(EdmType::String));
        assert_eq!(EdmType::infer(&json!(true)), Some(EdmType::Boolean));
        assert_eq!(EdmType::infer(&json!(42)), Some(EdmType::Int32));
        assert_eq!(EdmType::infer(&json!(5_000_000_000_i64)), Some(EdmType::Int64));
        assert_eq!(EdmType::infer(&json!(1.5)), Some(EdmType::Double));
        assert_eq!(EdmType::infer(&Value::Null), None);
    }

    #[test]
    fn test_from_wire_uses_annotations() {
        let wire = json!({
            "odata.etag": "W/\"datetime'2024-01-01'\"",
            "PartitionKey": "Orders",
            "RowKey": "42",
            "Timestamp@odata.type": "Edm.DateTime",
            "Timestamp": "2024-01-01T00:00:00.000Z",
            "Total@odata.type": "Edm.Int64",
            "Total": "255",
            "Shipped": false,
            "Note": null
        });
        let entity = Entity::from_wire(wire.as_object().unwrap());

        assert_eq!(entity.len(), 5);
        assert_eq!(entity.get("Timestamp").unwrap().edm_type, EdmType::DateTime);
        assert_eq!(entity.get("Total").unwrap().edm_type, EdmType::Int64);
        assert_eq!(entity.get("Shipped").unwrap().edm_type, EdmType::Boolean);
        assert!(entity.get("odata.etag").is_none());
        assert!(entity.get("Note").is_none());

        let row = entity.into_row();
        assert_eq!(row["Total"], json!(255));
        assert_eq!(row["PartitionKey"], json!("Orders"));
    }
}
