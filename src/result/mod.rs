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

//! Result set handling for query results.
//!
//! Every query branch reports column metadata alongside its rows, so
//! [`QueryResult::into_download`] is defined for all of them.

pub mod arrow;

pub use self::arrow::{to_record_batch, to_schema};

use crate::schema::SchemaInference;
use crate::types::{EdmType, Entity, GenericType, GenericTypeMap};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A single result row, attribute name to value.
pub type Row = BTreeMap<String, Value>;

/// A result column with its native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub native_type: EdmType,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, native_type: EdmType) -> Self {
        Self {
            name: name.into(),
            native_type,
        }
    }

    /// The framework's generic type for this column.
    pub fn generic_type(&self) -> GenericType {
        GenericTypeMap::to_generic_type(self.native_type)
    }
}

/// Rows returned by a query together with their column metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    columns: Vec<ResultColumn>,
    rows: Vec<Row>,
    inference: Option<SchemaInference>,
}

impl QueryResult {
    /// Creates an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a result set with the given columns and rows.
    pub fn new(columns: Vec<ResultColumn>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            inference: None,
        }
    }

    /// Builds a result from entities.
    ///
    /// Entities are schema-less, so the columns are the union of all
    /// properties in first-seen order. A property seen with different types
    /// gets the widened type (see [`EdmType::widen`]).
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        let mut columns: Vec<ResultColumn> = Vec::new();
        for entity in &entities {
            for (name, property) in entity.properties() {
                match columns.iter_mut().find(|c| c.name == name) {
                    Some(column) => {
                        column.native_type = column.native_type.widen(property.edm_type)
                    }
                    None => columns.push(ResultColumn::new(name, property.edm_type)),
                }
            }
        }
        let rows = entities.into_iter().map(Entity::into_row).collect();
        Self::new(columns, rows)
    }

    /// Attaches a note that the rows describe an inferred schema.
    pub fn with_inference(mut self, inference: SchemaInference) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns how the rows were inferred, if they describe a schema.
    pub fn inference(&self) -> Option<&SchemaInference> {
        self.inference.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts into the `{rows, types}` shape used for result downloads.
    pub fn into_download(self) -> DownloadedResult {
        let types = self
            .columns
            .iter()
            .map(|c| TypedColumn {
                name: c.name.clone(),
                generic_type: c.generic_type().as_str().to_string(),
            })
            .collect();
        DownloadedResult {
            rows: self.rows,
            types,
        }
    }
}

/// A column name with its generic type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub generic_type: String,
}

/// Rows plus generic column types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadedResult {
    pub rows: Vec<Row>,
    pub types: Vec<TypedColumn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_result_set() {
        let rs = QueryResult::empty();
        assert!(rs.is_empty());
        assert!(rs.columns().is_empty());
        assert!(rs.inference().is_none());
        let download = rs.into_download();
        assert!(download.rows.is_empty());
        assert!(download.types.is_empty());
    }

    #[test]
    fn test_from_entities_unions_columns() {
        let a = Entity::new()
            .with_property("PartitionKey", EdmType::String, json!("p"))
            .with_property("Qty", EdmType::Int32, json!(1));
        let b = Entity::new()
            .with_property("PartitionKey", EdmType::String, json!("p"))
            .with_property("Shipped", EdmType::Boolean, json!(true));
        let rs = QueryResult::from_entities(vec![a, b]);

        assert_eq!(rs.len(), 2);
        let names: Vec<&str> = rs.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["PartitionKey", "Qty", "Shipped"]);
        assert!(rs.rows()[1].get("Qty").is_none());
    }

    #[test]
    fn test_from_entities_widens_mixed_types() {
        let a = Entity::new().with_property("Qty", EdmType::Int32, json!(5));
        let b = Entity::new().with_property("Qty", EdmType::Int64, json!("5000000000"));
        let c = Entity::new().with_property("Flag", EdmType::Boolean, json!(true));
        let d = Entity::new().with_property("Flag", EdmType::Int32, json!(1));
        let rs = QueryResult::from_entities(vec![a, b, c, d]);

        assert_eq!(rs.columns()[0], ResultColumn::new("Qty", EdmType::Int64));
        assert_eq!(rs.columns()[1], ResultColumn::new("Flag", EdmType::String));
        let download = rs.into_download();
        assert_eq!(download.types[0].generic_type, "bigint");
    }

    #[test]
    fn test_download_maps_generic_types() {
        let rs = QueryResult::new(
            vec![
                ResultColumn::new("Total", EdmType::Int64),
                ResultColumn::new("Id", EdmType::Guid),
            ],
            vec![],
        );
        let download = rs.into_download();
        assert_eq!(download.types[0].generic_type, "bigint");
        assert_eq!(download.types[1].generic_type, "text");
        let json = serde_json::to_value(&download).unwrap();
        assert_eq!(json["types"][0]["type"], "bigint");
    }
}
