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

//! Conversion of query results into Arrow record batches.

use super::{QueryResult, ResultColumn};
use crate::error::{AzureTablesErrorHelper, Result};
use crate::types::GenericType;
use arrow_array::builder::{
    BooleanBuilder, Float64Builder, Int32Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow_array::{ArrayRef, RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::DateTime;
use driverbase::error::ErrorHelper;
use serde_json::Value;
use std::sync::Arc;

const UTC: &str = "UTC";

fn data_type(column: &ResultColumn) -> DataType {
    match column.generic_type() {
        GenericType::Int => DataType::Int32,
        GenericType::Bigint => DataType::Int64,
        GenericType::Double => DataType::Float64,
        GenericType::Boolean => DataType::Boolean,
        GenericType::Datetime | GenericType::Date => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into()))
        }
        GenericType::String | GenericType::Text => DataType::Utf8,
    }
}

/// Arrow schema for a set of result columns. Every column is nullable since
/// entities need not share properties.
pub fn to_schema(columns: &[ResultColumn]) -> Schema {
    Schema::new(
        columns
            .iter()
            .map(|c| Field::new(&c.name, data_type(c), true))
            .collect::<Vec<_>>(),
    )
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_timestamp_micros(value: &Value) -> Option<i64> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.timestamp_micros())
}

fn build_column(result: &QueryResult, column: &ResultColumn) -> ArrayRef {
    let values = result.rows().iter().map(|row| row.get(&column.name));
    let len = result.len();
    match data_type(column) {
        DataType::Int32 => {
            let mut builder = Int32Builder::with_capacity(len);
            for v in values {
                builder.append_option(v.and_then(as_i64).and_then(|v| i32::try_from(v).ok()));
            }
            Arc::new(builder.finish())
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(len);
            for v in values {
                builder.append_option(v.and_then(as_i64));
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(len);
            for v in values {
                builder.append_option(v.and_then(Value::as_f64));
            }
            Arc::new(builder.finish())
        }
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(len);
            for v in values {
                builder.append_option(v.and_then(Value::as_bool));
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp(_, _) => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(len).with_timezone(UTC);
            for v in values {
                builder.append_option(v.and_then(as_timestamp_micros));
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::with_capacity(len, len * 16);
            for v in values {
                match v {
                    Some(Value::String(s)) => builder.append_value(s),
                    Some(Value::Null) | None => builder.append_null(),
                    Some(other) => builder.append_value(other.to_string()),
                }
            }
            Arc::new(builder.finish())
        }
    }
}

/// Converts a query result into a single record batch.
pub fn to_record_batch(result: &QueryResult) -> Result<RecordBatch> {
    let schema: SchemaRef = Arc::new(to_schema(result.columns()));
    let arrays: Vec<ArrayRef> = result
        .columns()
        .iter()
        .map(|c| build_column(result, c))
        .collect();
    let options = RecordBatchOptions::new().with_row_count(Some(result.len()));
    RecordBatch::try_new_with_options(schema, arrays, &options).map_err(|e| {
        AzureTablesErrorHelper::invalid_state()
            .message(format!("could not build record batch: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Row;
    use crate::types::{EdmType, Entity};
    use arrow_array::{Array, Int64Array, StringArray, TimestampMicrosecondArray};
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_result_batch() {
        let batch = to_record_batch(&QueryResult::empty()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 0);
    }

    #[test]
    fn test_typed_columns() {
        let result = QueryResult::new(
            vec![
                ResultColumn::new("RowKey", EdmType::String),
                ResultColumn::new("Total", EdmType::Int64),
                ResultColumn::new("Timestamp", EdmType::DateTime),
            ],
            vec![
                row(&[
                    ("RowKey", json!("1")),
                    ("Total", json!(255)),
                    ("Timestamp", json!("2024-01-01T00:00:00Z")),
                ]),
                row(&[("RowKey", json!("2")), ("Total", json!("7"))]),
            ],
        );
        let batch = to_record_batch(&result).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let keys = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(keys.value(1), "2");

        let totals = batch.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(totals.value(0), 255);
        assert_eq!(totals.value(1), 7);

        let stamps = batch
            .column(2)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(stamps.value(0), 1_704_067_200_000_000);
        assert!(stamps.is_null(1));
    }

    #[test]
    fn test_mixed_integer_widths_keep_values() {
        let result = QueryResult::from_entities(vec![
            Entity::new().with_property("Qty", EdmType::Int32, json!(5)),
            Entity::new().with_property("Qty", EdmType::Int64, json!("5000000000")),
        ]);
        let batch = to_record_batch(&result).unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);

        let qty = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(qty.null_count(), 0);
        assert_eq!(qty.value(0), 5);
        assert_eq!(qty.value(1), 5_000_000_000);
    }
}
