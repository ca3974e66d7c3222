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

//! Statement implementation for the Azure Tables ADBC driver.

use crate::error::AzureTablesErrorHelper;
use crate::result::{to_record_batch, to_schema, QueryResult};
use crate::tables::TableStorageDriver;
use adbc_core::error::Result;
use adbc_core::options::{OptionStatement, OptionValue};
use adbc_core::Optionable;
use arrow_array::{
    Array, BooleanArray, Float64Array, Int32Array, Int64Array, LargeStringArray, RecordBatch,
    RecordBatchIterator, RecordBatchReader, StringArray,
};
use arrow_schema::{DataType, Schema};
use driverbase::error::ErrorHelper;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Represents a query that can be executed against the table service.
///
/// The query text is either a native filter expression, whose first bound
/// parameter names the table, or one of the synthetic schema queries.
/// Parameters are bound as a single-row batch, one column per parameter.
#[derive(Debug)]
pub struct Statement {
    driver: Arc<TableStorageDriver>,
    runtime: Arc<Runtime>,
    query: Option<String>,
    params: Vec<Value>,
}

impl Statement {
    /// Creates a new Statement.
    pub(crate) fn new(driver: Arc<TableStorageDriver>, runtime: Arc<Runtime>) -> Self {
        Self {
            driver,
            runtime,
            query: None,
            params: Vec::new(),
        }
    }

    /// Returns the current query text.
    pub fn sql_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the bound parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn run(&self) -> Result<QueryResult> {
        let query = self.query.as_deref().ok_or_else(|| {
            AzureTablesErrorHelper::invalid_state()
                .message("no query has been set")
                .to_adbc()
        })?;
        self.runtime
            .block_on(self.driver.query(query, &self.params))
            .map_err(|e| e.to_adbc())
    }
}

fn param_value(array: &dyn Array) -> Result<Value> {
    if array.is_null(0) {
        return Ok(Value::Null);
    }
    let any = array.as_any();
    let value = match array.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| Value::from(a.value(0))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| Value::from(a.value(0))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Value::from(a.value(0))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Value::from(a.value(0))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| Value::from(a.value(0))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::from(a.value(0))),
        _ => None,
    };
    value.ok_or_else(|| {
        AzureTablesErrorHelper::invalid_argument()
            .message(format!("unsupported parameter type {}", array.data_type()))
            .to_adbc()
    })
}

impl Optionable for Statement {
    type Option = OptionStatement;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        Err(AzureTablesErrorHelper::set_unknown_option(&key).to_adbc())
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Statement for Statement {
    fn set_sql_query(&mut self, query: impl AsRef<str>) -> Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> Result<()> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("Substrait plans")
            .to_adbc())
    }

    fn prepare(&mut self) -> Result<()> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("prepare")
            .to_adbc())
    }

    fn get_parameter_schema(&self) -> Result<Schema> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("get_parameter_schema")
            .to_adbc())
    }

    fn bind(&mut self, batch: RecordBatch) -> Result<()> {
        if batch.num_rows() != 1 {
            return Err(AzureTablesErrorHelper::invalid_argument()
                .message(format!(
                    "parameters must be bound as a single row, got {} rows",
                    batch.num_rows()
                ))
                .to_adbc());
        }
        self.params = batch
            .columns()
            .iter()
            .map(|column| param_value(column.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn bind_stream(&mut self, _stream: Box<dyn RecordBatchReader + Send>) -> Result<()> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("bind_stream")
            .to_adbc())
    }

    fn execute(&mut self) -> Result<impl RecordBatchReader + Send> {
        let result = self.run()?;
        let batch = to_record_batch(&result).map_err(|e| e.to_adbc())?;
        let schema = batch.schema();
        Ok(RecordBatchIterator::new(vec![Ok(batch)], schema))
    }

    fn execute_update(&mut self) -> Result<Option<i64>> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("execute_update - the driver does not write to tables")
            .to_adbc())
    }

    fn execute_schema(&mut self) -> Result<Schema> {
        let result = self.run()?;
        Ok(to_schema(result.columns()))
    }

    fn execute_partitions(&mut self) -> Result<adbc_core::PartitionedResult> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("execute_partitions")
            .to_adbc())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use adbc_core::Statement as _;
    use arrow_schema::Field;

    fn statement() -> Statement {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        Statement::new(
            Arc::new(TableStorageDriver::new(DriverConfig::default())),
            Arc::new(runtime),
        )
    }

    #[test]
    fn test_statement_set_query() {
        let mut stmt = statement();
        stmt.set_sql_query("PartitionKey eq ?").unwrap();
        assert_eq!(stmt.sql_query(), Some("PartitionKey eq ?"));
    }

    #[test]
    fn test_statement_execute_without_query() {
        let mut stmt = statement();
        assert!(stmt.execute().is_err());
    }

    #[test]
    fn test_statement_select_returns_empty() {
        let mut stmt = statement();
        stmt.set_sql_query("SELECT * FROM (").unwrap();
        let mut reader = stmt.execute().unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 0);
    }

    #[test]
    fn test_statement_bind_single_row() {
        let mut stmt = statement();
        let schema = Arc::new(Schema::new(vec![
            Field::new("table", DataType::Utf8, false),
            Field::new("key", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Orders"])),
                Arc::new(Int64Array::from(vec![Some(42)])),
            ],
        )
        .unwrap();
        stmt.bind(batch).unwrap();
        assert_eq!(stmt.params(), &[Value::from("Orders"), Value::from(42)]);
    }

    #[test]
    fn test_statement_bind_rejects_multiple_rows() {
        let mut stmt = statement();
        let schema = Arc::new(Schema::new(vec![Field::new("table", DataType::Utf8, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a", "b"]))])
                .unwrap();
        assert!(stmt.bind(batch).is_err());
    }

    #[test]
    fn test_statement_execute_update_not_supported() {
        let mut stmt = statement();
        stmt.set_sql_query("PartitionKey eq ?").unwrap();
        assert!(stmt.execute_update().is_err());
    }
}
