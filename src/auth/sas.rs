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

//! Table-scoped shared access signatures.

use super::SharedKeyCredential;
use crate::client::SERVICE_VERSION;
use crate::error::{AzureTablesErrorHelper, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use driverbase::error::ErrorHelper;

/// Builds a read-only, https-only signature for a single table.
#[derive(Debug, Clone)]
pub struct TableSasBuilder {
    table: String,
    permissions: String,
    start: Option<DateTime<Utc>>,
    expiry: DateTime<Utc>,
}

impl TableSasBuilder {
    /// Creates a builder granting query access to `table` until `expiry`.
    pub fn new(table: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            table: table.into(),
            permissions: "r".to_string(),
            start: None,
            expiry,
        }
    }

    /// Sets the time from which the signature is valid.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Returns the expiry of the signature.
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    fn string_to_sign(&self, account: &str) -> String {
        let start = self.start.map(format_time).unwrap_or_default();
        let resource = format!("/table/{}/{}", account, self.table.to_lowercase());
        // Identifier, IP and the partition/row key ranges are left empty.
        [
            self.permissions.as_str(),
            start.as_str(),
            format_time(self.expiry).as_str(),
            resource.as_str(),
            "",
            "",
            "https",
            SERVICE_VERSION,
            "",
            "",
            "",
            "",
        ]
        .join("\n")
    }

    /// Signs the builder and returns the query string, without leading `?`.
    pub fn sign(&self, credential: &SharedKeyCredential) -> Result<String> {
        if self.table.is_empty() {
            return Err(AzureTablesErrorHelper::invalid_argument()
                .message("a table name is required for a shared access signature"));
        }
        if let Some(start) = self.start {
            if start >= self.expiry {
                return Err(AzureTablesErrorHelper::invalid_argument()
                    .message("signature expiry must be after its start"));
            }
        }
        let signature = credential.sign(&self.string_to_sign(credential.account()))?;

        let mut pairs = vec![
            ("sv", SERVICE_VERSION.to_string()),
            ("tn", self.table.clone()),
            ("sp", self.permissions.clone()),
        ];
        if let Some(start) = self.start {
            pairs.push(("st", format_time(start)));
        }
        pairs.push(("se", format_time(self.expiry)));
        pairs.push(("spr", "https".to_string()));
        pairs.push(("sig", signature));

        Ok(pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&"))
    }

    /// Signs the builder and returns the full table URL below `endpoint`.
    pub fn sign_url(&self, endpoint: &str, credential: &SharedKeyCredential) -> Result<String> {
        let query = self.sign(credential)?;
        Ok(format!(
            "{}/{}?{query}",
            endpoint.trim_end_matches('/'),
            self.table
        ))
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
