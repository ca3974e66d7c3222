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

//! Clients for the table service REST API.

pub mod http;
pub mod wire;

pub use http::{HttpClientConfig, TableServiceClient};

use crate::error::{AzureTablesErrorHelper, Result};
use crate::types::Entity;
use async_trait::async_trait;
use driverbase::error::ErrorHelper;
use std::fmt::Debug;

/// REST API version used for requests and signatures.
pub const SERVICE_VERSION: &str = "2019-02-02";

/// Operations the driver needs from a table service.
///
/// Implementations must be safe for concurrent use: the driver shares one
/// handle between all in-flight queries without further coordination.
#[async_trait]
pub trait TableService: Send + Sync + Debug {
    /// Lists table names, up to `top` when given, otherwise all of them.
    async fn list_tables(&self, top: Option<u32>) -> Result<Vec<String>>;

    /// Queries entities of `table` matching the optional OData `filter`.
    async fn query_entities(
        &self,
        table: &str,
        filter: Option<&str>,
        top: Option<u32>,
    ) -> Result<Vec<Entity>>;
}

/// Checks a table name against the service's naming rules.
///
/// Names are 3 to 63 ASCII alphanumerics and start with a letter. Rejecting
/// anything else keeps names safe to splice into request paths.
pub fn validate_table_name(name: &str) -> Result<()> {
    let valid = (3..=63).contains(&name.len())
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(AzureTablesErrorHelper::invalid_argument()
            .message(format!("invalid table name '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("Orders").is_ok());
        assert!(validate_table_name("abc123").is_ok());
        assert!(validate_table_name("ab").is_err());
        assert!(validate_table_name("1Orders").is_err());
        assert!(validate_table_name("Orders()/../x").is_err());
        assert!(validate_table_name(&"a".repeat(64)).is_err());
    }
}
