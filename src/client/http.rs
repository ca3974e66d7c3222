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

//! HTTP client implementation for the table service REST API.

use super::{validate_table_name, wire, TableService, SERVICE_VERSION};
use crate::auth::{AuthProvider, SharedKeyCredential};
use crate::config::DriverConfig;
use crate::error::{transport_error, AzureTablesErrorHelper, Result};
use crate::types::Entity;
use async_trait::async_trait;
use chrono::Utc;
use driverbase::error::ErrorHelper;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const ACCEPT_FULL_METADATA: &str = "application/json;odata=fullmetadata";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";
const NEXT_TABLE_NAME: &str = "x-ms-continuation-NextTableName";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-NextRowKey";

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10 * 60),
            user_agent: format!("azuretables-adbc-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for communicating with a table service endpoint.
#[derive(Debug)]
pub struct TableServiceClient {
    config: HttpClientConfig,
    endpoint: String,
    account: String,
    auth_provider: Arc<dyn AuthProvider>,
    http: reqwest::Client,
}

impl TableServiceClient {
    /// Creates a new client for `endpoint`.
    pub fn new(
        config: HttpClientConfig,
        endpoint: impl Into<String>,
        account: impl Into<String>,
        auth_provider: Arc<dyn AuthProvider>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| transport_error(e, "build HTTP client"))?;
        Ok(Self {
            config,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            account: account.into(),
            auth_provider,
            http,
        })
    }

    /// Creates a shared-key client from a driver configuration.
    pub fn from_config(config: &DriverConfig) -> Result<Self> {
        let account = config.require_account()?;
        let credential = SharedKeyCredential::new(account, config.require_access_key()?)?;
        let http_config = HttpClientConfig {
            timeout: config.request_timeout,
            ..HttpClientConfig::default()
        };
        Self::new(
            http_config,
            config.table_endpoint()?,
            account,
            Arc::new(credential),
        )
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Path of the endpoint itself, non-empty for path-style (emulator) URLs.
    fn endpoint_path(&self) -> &str {
        let without_scheme = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        match without_scheme.find('/') {
            Some(idx) => without_scheme[idx + 1..].trim_end_matches('/'),
            None => "",
        }
    }

    fn headers(&self, resource: &str) -> Result<HeaderMap> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let signed_resource = match self.endpoint_path() {
            "" => resource.to_string(),
            prefix => format!("{prefix}/{resource}"),
        };
        let authorization = self.auth_provider.get_auth_header(&date, &signed_resource)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FULL_METADATA));
        headers.insert("x-ms-version", HeaderValue::from_static(SERVICE_VERSION));
        headers.insert("dataserviceversion", HeaderValue::from_static(DATA_SERVICE_VERSION));
        headers.insert(
            "maxdataserviceversion",
            HeaderValue::from_static(DATA_SERVICE_VERSION),
        );
        headers.insert("x-ms-date", header_value(&date)?);
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        Ok(headers)
    }

    /// Issues a GET against `resource` and returns the continuation headers
    /// together with the response body.
    async fn get(&self, resource: &str, query: &[(&str, String)]) -> Result<(HeaderMap, String)> {
        let mut url = format!("{}/{resource}", self.endpoint);
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&encoded);
        }
        debug!(account = %self.account, %url, "table service request");

        let response = self
            .http
            .get(&url)
            .headers(self.headers(resource)?)
            .send()
            .await
            .map_err(|e| transport_error(e, &format!("reach table service at {}", self.endpoint)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, "read table service response"))?;

        if !status.is_success() {
            return Err(wire::parse_service_error(status.as_u16(), &body));
        }
        Ok((headers, body))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        AzureTablesErrorHelper::invalid_argument().message(format!("invalid header value: {e}"))
    })
}

fn continuation(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A response page: headers carrying continuation tokens, plus the body.
pub(crate) type Page = (HeaderMap, String);

/// Source of response pages for the paging loops below.
#[async_trait]
pub(crate) trait PageSource: Send + Sync {
    async fn fetch(&self, resource: &str, query: &[(&'static str, String)]) -> Result<Page>;
}

#[async_trait]
impl PageSource for TableServiceClient {
    async fn fetch(&self, resource: &str, query: &[(&'static str, String)]) -> Result<Page> {
        self.get(resource, query).await
    }
}

/// Lists table names, following `NextTableName` unless `top` is set.
pub(crate) async fn list_table_pages(
    source: &dyn PageSource,
    top: Option<u32>,
) -> Result<Vec<String>> {
    let mut tables = Vec::new();
    let mut next_table: Option<String> = None;
    loop {
        let mut query = Vec::new();
        if let Some(top) = top {
            query.push(("$top", top.to_string()));
        }
        if let Some(next) = next_table.take() {
            query.push(("NextTableName", next));
        }
        let (headers, body) = source.fetch("Tables", &query).await?;
        tables.extend(wire::parse_table_names(&body)?);

        next_table = continuation(&headers, NEXT_TABLE_NAME);
        if next_table.is_none() || top.is_some() {
            break;
        }
    }
    debug!(count = tables.len(), "listed tables");
    Ok(tables)
}

/// Queries entities of `table`, following partition/row continuations until
/// `top` entities were read or the service reports no more pages.
pub(crate) async fn query_entity_pages(
    source: &dyn PageSource,
    table: &str,
    filter: Option<&str>,
    top: Option<u32>,
) -> Result<Vec<Entity>> {
    validate_table_name(table)?;
    let resource = format!("{table}()");
    let limit = top.map(|t| t as usize);

    let mut entities = Vec::new();
    let mut next_keys: Option<(String, Option<String>)> = None;
    loop {
        let mut query = Vec::new();
        if let Some(filter) = filter {
            query.push(("$filter", filter.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("$top", (limit - entities.len()).to_string()));
        }
        if let Some((partition, row)) = next_keys.take() {
            query.push(("NextPartitionKey", partition));
            if let Some(row) = row {
                query.push(("NextRowKey", row));
            }
        }
        let (headers, body) = source.fetch(&resource, &query).await?;
        entities.extend(wire::parse_entities(&body)?);

        // The service may return a short page with a continuation even
        // when $top has not been reached yet.
        let done = limit.is_some_and(|l| entities.len() >= l);
        next_keys = continuation(&headers, NEXT_PARTITION_KEY)
            .map(|pk| (pk, continuation(&headers, NEXT_ROW_KEY)));
        if done || next_keys.is_none() {
            break;
        }
    }
    if let Some(limit) = limit {
        entities.truncate(limit);
    }
    debug!(table, count = entities.len(), "queried entities");
    Ok(entities)
}

#[async_trait]
impl TableService for TableServiceClient {
    async fn list_tables(&self, top: Option<u32>) -> Result<Vec<String>> {
        list_table_pages(self, top).await
    }

    async fn query_entities(
        &self,
        table: &str,
        filter: Option<&str>,
        top: Option<u32>,
    ) -> Result<Vec<Entity>> {
        query_entity_pages(self, table, filter, top).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use reqwest::header::HeaderName;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Request = (String, Vec<(&'static str, String)>);

    /// Replays canned pages and records each request.
    #[derive(Default)]
    struct ScriptedPages {
        pages: Mutex<VecDeque<Page>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedPages {
        fn page(self, continuations: &[(&str, &str)], body: &str) -> Self {
            let mut headers = HeaderMap::new();
            for (name, value) in continuations {
                headers.insert(
                    HeaderName::from_bytes(name.as_bytes()).unwrap(),
                    HeaderValue::from_str(value).unwrap(),
                );
            }
            self.pages
                .lock()
                .unwrap()
                .push_back((headers, body.to_string()));
            self
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch(&self, resource: &str, query: &[(&'static str, String)]) -> Result<Page> {
            self.requests
                .lock()
                .unwrap()
                .push((resource.to_string(), query.to_vec()));
            self.pages.lock().unwrap().pop_front().ok_or_else(|| {
                AzureTablesErrorHelper::io().message("no more pages scripted")
            })
        }
    }

    fn tables_body(names: &[&str]) -> String {
        let value: Vec<_> = names
            .iter()
            .map(|n| serde_json::json!({ "TableName": n }))
            .collect();
        serde_json::json!({ "value": value }).to_string()
    }

    fn entities_body(row_keys: std::ops::RangeInclusive<u32>) -> String {
        let value: Vec<_> = row_keys
            .map(|k| serde_json::json!({ "PartitionKey": "p", "RowKey": k.to_string() }))
            .collect();
        serde_json::json!({ "value": value }).to_string()
    }

    #[tokio::test]
    async fn test_list_tables_follows_continuation() {
        let pages = ScriptedPages::default()
            .page(&[(NEXT_TABLE_NAME, "Orders")], &tables_body(&["Invoices"]))
            .page(&[], &tables_body(&["Orders", "Users"]));

        let tables = list_table_pages(&pages, None).await.unwrap();
        assert_eq!(tables, vec!["Invoices", "Orders", "Users"]);

        let requests = pages.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], ("Tables".to_string(), vec![]));
        assert_eq!(
            requests[1].1,
            vec![("NextTableName", "Orders".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_tables_with_top_reads_one_page() {
        let pages = ScriptedPages::default()
            .page(&[(NEXT_TABLE_NAME, "Orders")], &tables_body(&["Invoices"]));

        let tables = list_table_pages(&pages, Some(1)).await.unwrap();
        assert_eq!(tables, vec!["Invoices"]);
        assert_eq!(pages.requests()[0].1, vec![("$top", "1".to_string())]);
    }

    #[tokio::test]
    async fn test_short_entity_page_with_continuation() {
        let pages = ScriptedPages::default()
            .page(
                &[(NEXT_PARTITION_KEY, "p"), (NEXT_ROW_KEY, "3")],
                &entities_body(1..=2),
            )
            .page(&[(NEXT_PARTITION_KEY, "p")], &entities_body(3..=6));

        let entities = query_entity_pages(&pages, "Orders", Some("PartitionKey eq 'p'"), Some(5))
            .await
            .unwrap();
        assert_eq!(entities.len(), 5);
        assert_eq!(
            entities[4].get("RowKey").unwrap().value,
            serde_json::json!("5")
        );

        let requests = pages.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "Orders()");
        assert_eq!(
            requests[0].1,
            vec![
                ("$filter", "PartitionKey eq 'p'".to_string()),
                ("$top", "5".to_string()),
            ]
        );
        assert_eq!(
            requests[1].1,
            vec![
                ("$filter", "PartitionKey eq 'p'".to_string()),
                ("$top", "3".to_string()),
                ("NextPartitionKey", "p".to_string()),
                ("NextRowKey", "3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unbounded_entity_query_reads_all_pages() {
        let pages = ScriptedPages::default()
            .page(&[(NEXT_PARTITION_KEY, "p")], &entities_body(1..=3))
            .page(&[], &entities_body(4..=4));

        let entities = query_entity_pages(&pages, "Orders", None, None)
            .await
            .unwrap();
        assert_eq!(entities.len(), 4);
        assert_eq!(pages.requests()[1].1, vec![("NextPartitionKey", "p".to_string())]);
    }

    #[tokio::test]
    async fn test_entity_query_rejects_bad_table_name() {
        let pages = ScriptedPages::default();
        assert!(query_entity_pages(&pages, "1-bad", None, Some(5))
            .await
            .is_err());
        assert!(pages.requests().is_empty());
    }

    fn driver_config() -> DriverConfig {
        DriverConfig::default()
            .with_account("myaccount")
            .with_access_key(BASE64.encode(b"secret-key"))
    }

    #[test]
    fn test_http_client_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.user_agent.starts_with("azuretables-adbc-rust/"));
    }

    #[test]
    fn test_client_from_config() {
        let client = TableServiceClient::from_config(&driver_config()).unwrap();
        assert_eq!(client.endpoint(), "https://myaccount.table.core.windows.net");
        assert_eq!(client.endpoint_path(), "");
        assert_eq!(client.config().timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_client_requires_credentials() {
        assert!(TableServiceClient::from_config(&DriverConfig::default()).is_err());
        let no_key = DriverConfig::default().with_account("myaccount");
        assert!(TableServiceClient::from_config(&no_key).is_err());
    }

    #[test]
    fn test_path_style_endpoint() {
        let config = driver_config().with_endpoint("http://127.0.0.1:10002/devstoreaccount1/");
        let client = TableServiceClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint_path(), "devstoreaccount1");
        let headers = client.headers("Tables").unwrap();
        assert!(headers
            .get(AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("SharedKeyLite myaccount:"));
        assert_eq!(headers.get("x-ms-version").unwrap(), SERVICE_VERSION);
    }
}
