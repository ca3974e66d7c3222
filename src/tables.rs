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

//! The table storage driver.
//!
//! [`TableStorageDriver`] adapts a partition/row keyed table service to the
//! row/column driver contract of the orchestration framework. Query text is
//! dispatched as follows:
//!
//! 1. the information schema sentinel returns inferred columns of every table,
//! 2. the table list sentinel returns table names,
//! 3. the framework's time bucket probe is answered locally,
//! 4. any other `SELECT` is parsed for diagnostics and returns no rows,
//! 5. everything else is a native filter: `params[0]` names the table and the
//!    remaining params fill the `?` placeholders.

use crate::auth::{SharedKeyCredential, TableSasBuilder};
use crate::client::{validate_table_name, TableService, TableServiceClient};
use crate::config::DriverConfig;
use crate::dialect::TableQueryDialect;
use crate::error::{AzureTablesErrorHelper, Result};
use crate::filter;
use crate::result::{DownloadedResult, QueryResult, ResultColumn, Row};
use crate::schema::{
    SchemaInference, TableSchema, DEFAULT_SCHEMA, LIST_COLUMNS_QUERY, LIST_TABLES_QUERY,
    SAMPLE_SIZE,
};
use crate::types::EdmType;
use chrono::Utc;
use driverbase::error::ErrorHelper;
use serde_json::Value;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Column name of the time bucket probe result.
const BUCKET_COLUMN: &str = "bucket";

/// Column descriptor in [`TableStorageDriver::tables_schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
}

/// `schema -> table -> columns`.
pub type TablesSchema = BTreeMap<String, BTreeMap<String, Vec<ColumnDescriptor>>>;

/// Driver over a single table service account.
pub struct TableStorageDriver {
    config: DriverConfig,
    service: OnceCell<Arc<dyn TableService>>,
}

impl std::fmt::Debug for TableStorageDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStorageDriver")
            .field("config", &self.config)
            .field("connected", &self.service.initialized())
            .finish()
    }
}

impl TableStorageDriver {
    /// Creates a driver that connects on first use.
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            service: OnceCell::new(),
        }
    }

    /// Creates a driver from environment variables only.
    pub fn from_env() -> Self {
        Self::new(DriverConfig::from_env())
    }

    /// Creates a driver over an already constructed service.
    pub fn with_service(config: DriverConfig, service: Arc<dyn TableService>) -> Self {
        Self {
            config,
            service: OnceCell::new_with(Some(service)),
        }
    }

    /// Environment variables the driver reads.
    pub fn driver_env_variables() -> &'static [&'static str] {
        DriverConfig::env_variables()
    }

    /// Returns the driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Returns the dialect companion.
    pub fn dialect(&self) -> TableQueryDialect {
        TableQueryDialect::new(self.config.use_utc)
    }

    /// Whether the driver was configured as read-only.
    pub fn read_only(&self) -> bool {
        self.config.read_only
    }

    /// Placeholder text for the parameter at `index`.
    pub fn param(&self, _index: usize) -> &'static str {
        filter::PLACEHOLDER
    }

    /// Query text that lists every column of every table.
    pub fn information_schema_query(&self) -> &'static str {
        LIST_COLUMNS_QUERY
    }

    /// Resolves the service handle, creating the HTTP client once.
    async fn service(&self) -> Result<&Arc<dyn TableService>> {
        self.service
            .get_or_try_init(|| async {
                debug!(account = ?self.config.account_name, "connecting to table service");
                let client = TableServiceClient::from_config(&self.config)?;
                Ok::<Arc<dyn TableService>, crate::error::Error>(Arc::new(client))
            })
            .await
    }

    /// Checks that the service is reachable with the configured credentials.
    pub async fn test_connection(&self) -> Result<bool> {
        self.service().await?.list_tables(Some(1)).await?;
        Ok(true)
    }

    /// Lists all table names of the account.
    pub async fn get_tables(&self) -> Result<Vec<String>> {
        self.service().await?.list_tables(None).await
    }

    /// Table names as `table_name` rows. The schema is ignored.
    pub async fn get_tables_query(&self, _schema_name: &str) -> Result<QueryResult> {
        self.list_tables_result().await
    }

    /// Succeeds without doing anything: the backend has no schemas.
    pub async fn create_schema_if_not_exists(&self, schema_name: &str) -> Result<()> {
        debug!(schema_name, "schemas are not supported, nothing to create");
        Ok(())
    }

    /// Runs `query_text` and returns rows with column metadata.
    pub async fn query(&self, query_text: &str, params: &[Value]) -> Result<QueryResult> {
        if query_text == LIST_COLUMNS_QUERY {
            return self.list_columns_result().await;
        }
        if query_text == LIST_TABLES_QUERY {
            return self.list_tables_result().await;
        }
        if is_time_bucket_probe(query_text) {
            debug!("answering time bucket probe locally");
            return Ok(time_bucket_result(Utc::now().timestamp_millis()));
        }
        if starts_with_select(query_text) {
            log_select_parse(query_text);
            return Ok(QueryResult::empty());
        }
        self.filter_query(query_text, params).await
    }

    /// Runs `query_text` and converts the result to `{rows, types}`.
    pub async fn download_query_results(
        &self,
        query_text: &str,
        params: &[Value],
    ) -> Result<DownloadedResult> {
        Ok(self.query(query_text, params).await?.into_download())
    }

    /// Inferred columns grouped by schema and table.
    pub async fn tables_schema(&self) -> Result<TablesSchema> {
        let mut schema = TablesSchema::new();
        for table in self.infer_tables().await? {
            let columns = table
                .columns
                .iter()
                .map(|c| ColumnDescriptor {
                    name: c.column_name.clone(),
                    data_type: c.data_type.as_str().to_string(),
                })
                .collect();
            schema
                .entry(DEFAULT_SCHEMA.to_string())
                .or_default()
                .insert(table.table_name, columns);
        }
        Ok(schema)
    }

    /// Samples entities of one table to infer its columns.
    pub async fn infer_table(&self, table: &str) -> Result<TableSchema> {
        let samples = self
            .service()
            .await?
            .query_entities(table, None, Some(SAMPLE_SIZE))
            .await?;
        Ok(TableSchema::infer(table, &samples))
    }

    /// Returns a read-only signed URL for `table`.
    pub fn get_sas_token(&self, table: &str) -> Result<String> {
        validate_table_name(table)?;
        let credential = SharedKeyCredential::new(
            self.config.require_account()?,
            self.config.require_access_key()?,
        )?;
        let expiry = self.config.sas_expiry_at(Utc::now());
        TableSasBuilder::new(table, expiry).sign_url(&self.config.table_endpoint()?, &credential)
    }

    async fn infer_tables(&self) -> Result<Vec<TableSchema>> {
        let tables = self.get_tables().await?;
        let mut schemas = Vec::with_capacity(tables.len());
        for table in &tables {
            schemas.push(self.infer_table(table).await?);
        }
        Ok(schemas)
    }

    async fn list_tables_result(&self) -> Result<QueryResult> {
        let rows = self
            .get_tables()
            .await?
            .into_iter()
            .map(|name| single_value_row("table_name", Value::String(name)))
            .collect();
        Ok(QueryResult::new(
            vec![ResultColumn::new("table_name", EdmType::String)],
            rows,
        ))
    }

    async fn list_columns_result(&self) -> Result<QueryResult> {
        let tables = self.infer_tables().await?;
        let inference = SchemaInference {
            tables: tables.len(),
            sampled_records: tables.iter().map(|t| t.sampled_records).sum(),
        };
        debug!(note = %inference.describe(), "listed columns");

        let rows = tables
            .into_iter()
            .flat_map(|t| t.columns)
            .map(|c| {
                Row::from([
                    ("column_name".to_string(), Value::String(c.column_name)),
                    ("table_name".to_string(), Value::String(c.table_name)),
                    ("table_schema".to_string(), Value::String(c.table_schema)),
                    (
                        "data_type".to_string(),
                        Value::String(c.data_type.as_str().to_string()),
                    ),
                ])
            })
            .collect();
        let columns = ["column_name", "table_name", "table_schema", "data_type"]
            .into_iter()
            .map(|name| ResultColumn::new(name, EdmType::String))
            .collect();
        Ok(QueryResult::new(columns, rows).with_inference(inference))
    }

    async fn filter_query(&self, filter_text: &str, params: &[Value]) -> Result<QueryResult> {
        let (table, values) = match params.split_first() {
            Some((Value::String(table), values)) => (table.as_str(), values),
            Some((other, _)) => {
                return Err(AzureTablesErrorHelper::invalid_argument()
                    .message(format!("first parameter must be a table name, got {other}")))
            }
            None => {
                return Err(AzureTablesErrorHelper::invalid_argument()
                    .message("filter queries need the table name as first parameter"))
            }
        };
        let bound = filter::bind(filter_text, values)?;
        let bound = bound.trim();
        let filter = (!bound.is_empty()).then_some(bound);
        debug!(table, ?filter, limit = self.config.query_limit, "filter query");

        let entities = self
            .service()
            .await?
            .query_entities(table, filter, Some(self.config.query_limit))
            .await?;
        Ok(QueryResult::from_entities(entities))
    }
}

fn single_value_row(name: &str, value: Value) -> Row {
    Row::from([(name.to_string(), value)])
}

/// Whether the text opens with the `SELECT` keyword. Filters on properties
/// such as `Selected` or `SelectionId` do not count.
fn starts_with_select(query_text: &str) -> bool {
    let text = query_text.trim_start();
    match (text.get(..6), text.get(6..)) {
        (Some(head), Some(rest)) => {
            head.eq_ignore_ascii_case("select")
                && rest
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
        }
        _ => false,
    }
}

/// Recognizes the framework's refresh probe, e.g.
/// `SELECT FLOOR(EXTRACT(EPOCH FROM NOW()) / 10) as refresh_key`.
fn is_time_bucket_probe(query_text: &str) -> bool {
    let normalized: String = query_text
        .to_ascii_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    normalized.starts_with("SELECT")
        && normalized.contains("FLOOR(")
        && normalized.contains(")/10")
        && [
            "NOW()",
            "UNIX_TIMESTAMP(",
            "CURRENT_TIMESTAMP",
            "GETDATE()",
            "EXTRACT(EPOCH",
        ]
            .iter()
            .any(|clock| normalized.contains(clock))
}

fn time_bucket_result(now_millis: i64) -> QueryResult {
    QueryResult::new(
        vec![ResultColumn::new(BUCKET_COLUMN, EdmType::Int64)],
        vec![single_value_row(
            BUCKET_COLUMN,
            Value::from(now_millis.div_euclid(10)),
        )],
    )
}

fn log_select_parse(query_text: &str) {
    match Parser::parse_sql(&GenericDialect {}, query_text) {
        Ok(statements) => debug!(
            statements = statements.len(),
            "SQL is not executed against the table service, returning no rows"
        ),
        Err(e) => warn!(error = %e, "could not parse SELECT statement, returning no rows"),
    }
}
