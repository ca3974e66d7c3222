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

//! Schema introspection for a schema-less backend.
//!
//! Tables carry no declared columns, so the driver samples entities and
//! reports what it saw. The outcome is always flagged as inferred through
//! [`SchemaInference`] rather than passed off as catalog metadata.

use crate::types::{EdmType, Entity, GenericType, GenericTypeMap};

/// Sentinel query text asking for every column of every table.
pub(crate) const LIST_COLUMNS_QUERY: &str = "__azuretables_information_schema_columns__";

/// Sentinel query text asking for the table list.
pub(crate) const LIST_TABLES_QUERY: &str = "__azuretables_information_schema_tables__";

/// Schema name reported for every table; the backend has no schemas.
pub const DEFAULT_SCHEMA: &str = "default";

/// Number of entities sampled per table.
pub const SAMPLE_SIZE: u32 = 1;

/// One inferred column of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column_name: String,
    pub table_name: String,
    pub table_schema: String,
    pub native_type: EdmType,
    pub data_type: GenericType,
}

/// How an inferred schema was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaInference {
    /// Tables that were inspected.
    pub tables: usize,
    /// Entities read across all tables.
    pub sampled_records: usize,
}

impl SchemaInference {
    /// Inferred schemas are never authoritative: attributes missing from the
    /// sampled entities are absent from the result.
    pub fn is_authoritative(&self) -> bool {
        false
    }

    /// Human readable note suitable for logs and result metadata.
    pub fn describe(&self) -> String {
        format!(
            "inferred from {} sampled record(s) across {} table(s), may be incomplete",
            self.sampled_records, self.tables
        )
    }
}

/// Inferred columns of a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub sampled_records: usize,
}

impl TableSchema {
    /// Derives columns from sampled entities.
    ///
    /// When samples disagree on an attribute's type the first one seen wins.
    pub fn infer(table_name: &str, samples: &[Entity]) -> Self {
        let mut columns: Vec<ColumnInfo> = Vec::new();
        for entity in samples {
            for (name, property) in entity.properties() {
                if columns.iter().any(|c| c.column_name == name) {
                    continue;
                }
                columns.push(ColumnInfo {
                    column_name: name.to_string(),
                    table_name: table_name.to_string(),
                    table_schema: DEFAULT_SCHEMA.to_string(),
                    native_type: property.edm_type,
                    data_type: GenericTypeMap::to_generic_type(property.edm_type),
                });
            }
        }
        Self {
            table_name: table_name.to_string(),
            columns,
            sampled_records: samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_columns_from_sample() {
        let sample = Entity::new()
            .with_property("PartitionKey", EdmType::String, json!("p"))
            .with_property("Total", EdmType::Int64, json!("10"))
            .with_property("Id", EdmType::Guid, json!("c9da6455-213d-42c9-9a79-3e9149a57833"));
        let schema = TableSchema::infer("Orders", &[sample]);

        assert_eq!(schema.sampled_records, 1);
        assert_eq!(schema.columns.len(), 3);
        let total = schema.columns.iter().find(|c| c.column_name == "Total").unwrap();
        assert_eq!(total.data_type, GenericType::Bigint);
        assert_eq!(total.table_schema, DEFAULT_SCHEMA);
        let id = schema.columns.iter().find(|c| c.column_name == "Id").unwrap();
        assert_eq!(id.data_type, GenericType::Text);
    }

    #[test]
    fn test_empty_table_has_no_columns() {
        let schema = TableSchema::infer("Empty", &[]);
        assert!(schema.columns.is_empty());
        assert_eq!(schema.sampled_records, 0);
    }

    #[test]
    fn test_inference_is_never_authoritative() {
        let inference = SchemaInference {
            tables: 2,
            sampled_records: 2,
        };
        assert!(!inference.is_authoritative());
        assert!(inference.describe().contains("2 sampled record(s)"));
    }
}
