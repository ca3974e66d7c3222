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

//! JSON response bodies of the table service.

use crate::error::{service_error, AzureTablesErrorHelper, Error, Result};
use crate::types::Entity;
use driverbase::error::ErrorHelper;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct TableListResponse {
    #[serde(default)]
    value: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    #[serde(rename = "TableName")]
    table_name: String,
}

#[derive(Debug, Deserialize)]
struct EntityListResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "odata.error")]
    error: ServiceErrorBody,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    code: Option<String>,
    message: Option<ServiceErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorMessage {
    value: String,
}

fn invalid_body(err: serde_json::Error, what: &str) -> Error {
    AzureTablesErrorHelper::io()
        .message(format!("malformed {what} response: {err}"))
}

/// Parses the body of a `Query Tables` response.
pub fn parse_table_names(body: &str) -> Result<Vec<String>> {
    let response: TableListResponse =
        serde_json::from_str(body).map_err(|e| invalid_body(e, "table list"))?;
    Ok(response.value.into_iter().map(|t| t.table_name).collect())
}

/// Parses the body of a `Query Entities` response.
pub fn parse_entities(body: &str) -> Result<Vec<Entity>> {
    let response: EntityListResponse =
        serde_json::from_str(body).map_err(|e| invalid_body(e, "entity query"))?;
    Ok(response.value.iter().map(Entity::from_wire).collect())
}

/// Builds an error from a non-success response.
///
/// Bodies that are not OData errors (e.g. from proxies) are reported verbatim.
pub fn parse_service_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => {
            let message = response
                .error
                .message
                .map(|m| m.value)
                .unwrap_or_else(|| "no message".to_string());
            // Service messages carry a RequestId/Time trailer on extra lines.
            let first_line = message.lines().next().unwrap_or_default();
            service_error(status, response.error.code.as_deref(), first_line)
        }
        Err(_) => service_error(status, None, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdmType;

    #[test]
    fn test_parse_table_names() {
        let body = r#"{"odata.metadata":"https://x/$metadata#Tables","value":[{"TableName":"Orders"},{"TableName":"Invoices"}]}"#;
        assert_eq!(parse_table_names(body).unwrap(), vec!["Orders", "Invoices"]);
        assert!(parse_table_names(r#"{"value":[]}"#).unwrap().is_empty());
        assert!(parse_table_names("<html>").is_err());
    }

    #[test]
    fn test_parse_entities() {
        let body = r#"{"value":[
            {"odata.etag":"W/\"x\"","PartitionKey":"Orders","RowKey":"1",
             "Timestamp@odata.type":"Edm.DateTime","Timestamp":"2024-01-01T00:00:00Z",
             "Qty":3}
        ]}"#;
        let entities = parse_entities(body).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].get("Qty").unwrap().edm_type, EdmType::Int32);
        assert_eq!(
            entities[0].get("Timestamp").unwrap().edm_type,
            EdmType::DateTime
        );
    }

    #[test]
    fn test_parse_service_error() {
        let body = r#"{"odata.error":{"code":"TableNotFound","message":{"lang":"en-US","value":"The table specified does not exist.\nRequestId:abc\nTime:2024"}}}"#;
        let display = format!("{}", parse_service_error(404, body));
        assert!(display.contains("TableNotFound"));
        assert!(display.contains("The table specified does not exist."));
        assert!(!display.contains("RequestId"));

        let display = format!("{}", parse_service_error(502, "Bad Gateway"));
        assert!(display.contains("502"));
        assert!(display.contains("Bad Gateway"));
    }
}
