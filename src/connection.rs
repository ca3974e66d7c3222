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

//! Connection implementation for the Azure Tables ADBC driver.

use crate::client::TableService;
use crate::config::DriverConfig;
use crate::error::AzureTablesErrorHelper;
use crate::result::{to_schema, ResultColumn};
use crate::statement::Statement;
use crate::tables::TableStorageDriver;
use adbc_core::error::Result;
use adbc_core::options::{InfoCode, ObjectDepth, OptionConnection, OptionValue};
use adbc_core::Optionable;
use arrow_array::{RecordBatch, RecordBatchIterator, RecordBatchReader};
use arrow_schema::{ArrowError, Schema};
use driverbase::error::ErrorHelper;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Represents a connection to a table service account.
///
/// The table service itself is connectionless; the Connection owns the
/// [`TableStorageDriver`] and the runtime its requests are driven on.
/// Statements created from it share both.
#[derive(Debug)]
pub struct Connection {
    driver: Arc<TableStorageDriver>,
    runtime: Arc<Runtime>,
}

/// Type alias for our empty reader used in stub implementations.
type EmptyReader =
    RecordBatchIterator<std::vec::IntoIter<std::result::Result<RecordBatch, ArrowError>>>;

fn new_runtime() -> crate::error::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            AzureTablesErrorHelper::io()
                .message(e.to_string())
                .context("start async runtime")
        })
}

impl Connection {
    /// Creates a new Connection with the given configuration.
    pub(crate) fn new(config: DriverConfig) -> crate::error::Result<Self> {
        Ok(Self {
            driver: Arc::new(TableStorageDriver::new(config)),
            runtime: Arc::new(new_runtime()?),
        })
    }

    /// Creates a Connection over an existing service.
    pub fn with_service(
        config: DriverConfig,
        service: Arc<dyn TableService>,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            driver: Arc::new(TableStorageDriver::with_service(config, service)),
            runtime: Arc::new(new_runtime()?),
        })
    }

    /// Returns the underlying driver.
    pub fn driver(&self) -> &TableStorageDriver {
        &self.driver
    }

    /// Checks that the service is reachable.
    pub fn test_connection(&self) -> Result<bool> {
        self.runtime
            .block_on(self.driver.test_connection())
            .map_err(|e| e.to_adbc())
    }

    /// Lists all tables of the account.
    pub fn get_tables(&self) -> Result<Vec<String>> {
        self.runtime
            .block_on(self.driver.get_tables())
            .map_err(|e| e.to_adbc())
    }

    /// Returns a read-only signed URL for `table`.
    pub fn get_sas_token(&self, table: &str) -> Result<String> {
        self.driver.get_sas_token(table).map_err(|e| e.to_adbc())
    }
}

impl Optionable for Connection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        match key {
            OptionConnection::AutoCommit => {
                // Every entity operation is its own transaction
                Ok(())
            }
            _ => Err(AzureTablesErrorHelper::set_unknown_option(&key).to_adbc()),
        }
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

impl adbc_core::Connection for Connection {
    type StatementType = Statement;

    fn new_statement(&mut self) -> Result<Self::StatementType> {
        Ok(Statement::new(self.driver.clone(), self.runtime.clone()))
    }

    fn cancel(&mut self) -> Result<()> {
        // Requests always run to completion
        Ok(())
    }

    fn get_info(&self, codes: Option<HashSet<InfoCode>>) -> Result<impl RecordBatchReader + Send> {
        use driverbase::InfoBuilder;

        let mut builder = InfoBuilder::new();

        // Filter by requested codes or return all if none specified
        let return_all = codes.is_none();
        let codes = codes.unwrap_or_default();

        if return_all || codes.contains(&InfoCode::DriverName) {
            builder.add_string(InfoCode::DriverName as u32, "Azure Tables ADBC Driver");
        }
        if return_all || codes.contains(&InfoCode::DriverVersion) {
            builder.add_string(InfoCode::DriverVersion as u32, env!("CARGO_PKG_VERSION"));
        }
        if return_all || codes.contains(&InfoCode::VendorName) {
            builder.add_string(InfoCode::VendorName as u32, "Azure Table Storage");
        }

        Ok(builder.build())
    }

    fn get_objects(
        &self,
        _depth: ObjectDepth,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _table_type: Option<Vec<&str>>,
        _column_name: Option<&str>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            AzureTablesErrorHelper::not_implemented()
                .message("get_objects")
                .to_adbc(),
        )
    }

    /// Infers the schema of `table_name` from a sampled entity. The result
    /// may miss properties that the sampled entity does not carry.
    fn get_table_schema(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        table_name: &str,
    ) -> Result<Schema> {
        let inferred = self
            .runtime
            .block_on(self.driver.infer_table(table_name))
            .map_err(|e| e.to_adbc())?;
        let columns: Vec<ResultColumn> = inferred
            .columns
            .iter()
            .map(|c| ResultColumn::new(c.column_name.clone(), c.native_type))
            .collect();
        Ok(to_schema(&columns))
    }

    fn get_table_types(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            AzureTablesErrorHelper::not_implemented()
                .message("get_table_types")
                .to_adbc(),
        )
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            AzureTablesErrorHelper::not_implemented()
                .message("read_partition")
                .to_adbc(),
        )
    }

    fn commit(&mut self) -> Result<()> {
        // Nothing is ever written
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Err(AzureTablesErrorHelper::not_implemented()
            .message("rollback - the table service has no transactions")
            .to_adbc())
    }

    fn get_statistic_names(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            AzureTablesErrorHelper::not_implemented()
                .message("get_statistic_names")
                .to_adbc(),
        )
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(
            AzureTablesErrorHelper::not_implemented()
                .message("get_statistics")
                .to_adbc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbc_core::Connection as _;

    fn connection() -> Connection {
        Connection::new(DriverConfig::default()).unwrap()
    }

    #[test]
    fn test_connection_new_statement() {
        let mut conn = connection();
        assert!(conn.new_statement().is_ok());
    }

    #[test]
    fn test_connection_get_info() {
        let conn = connection();
        let result = conn.get_info(None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_connection_commit() {
        let mut conn = connection();
        assert!(conn.commit().is_ok());
    }

    #[test]
    fn test_connection_rollback() {
        let mut conn = connection();
        assert!(conn.rollback().is_err());
    }

    #[test]
    fn test_connection_without_account_fails_lazily() {
        let conn = connection();
        assert!(conn.test_connection().is_err());
    }
}
