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

//! Driver configuration.
//!
//! A [`DriverConfig`] starts from environment defaults and is then
//! overridden by explicit settings (builder methods or ADBC options). Once it
//! is handed to a [`TableStorageDriver`](crate::tables::TableStorageDriver)
//! it is never modified.

use crate::error::{AzureTablesErrorHelper, Result};
use chrono::{DateTime, Utc};
use driverbase::error::ErrorHelper;
use std::time::Duration;

/// Host suffix of the storage account (`windows.net`).
pub const ENV_HOST: &str = "CUBEJS_DB_HOST";
/// Storage account name.
pub const ENV_ACCOUNT: &str = "CUBEJS_DB_NAME";
/// Base64 encoded account key.
pub const ENV_ACCESS_KEY: &str = "CUBEJS_DB_PASS";
/// Alternate table endpoint domain, e.g. a Cosmos DB Table API account.
pub const ENV_DOMAIN: &str = "CUBEJS_DB_DOMAIN";

const DEFAULT_HOST: &str = "windows.net";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const DEFAULT_QUERY_LIMIT: u32 = 5;
const DEFAULT_SAS_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Connection settings for a table service account.
#[derive(Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Storage account name.
    pub account_name: Option<String>,
    /// Base64 encoded shared account key.
    pub access_key: Option<String>,
    /// Host suffix used to build the default endpoint.
    pub host: String,
    /// Alternate endpoint domain. Blank values are ignored.
    pub domain: Option<String>,
    /// Full endpoint URL, takes precedence over `host` and `domain`.
    pub endpoint: Option<String>,
    /// Request timeout handed to the HTTP client.
    pub request_timeout: Duration,
    /// Dialect option, kept for the framework. The backend stores UTC only.
    pub use_utc: bool,
    /// Reported through `read_only()`.
    pub read_only: bool,
    /// Maximum number of entities returned by a filter query.
    pub query_limit: u32,
    /// Fixed expiry for issued shared access signatures.
    pub sas_expiry: Option<DateTime<Utc>>,
    /// Lifetime of a signature when no fixed expiry is configured.
    pub sas_lifetime: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            account_name: None,
            access_key: None,
            host: DEFAULT_HOST.to_string(),
            domain: None,
            endpoint: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            use_utc: false,
            read_only: false,
            query_limit: DEFAULT_QUERY_LIMIT,
            sas_expiry: None,
            sas_lifetime: DEFAULT_SAS_LIFETIME,
        }
    }
}

// The access key never appears in logs.
impl std::fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("account_name", &self.account_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("domain", &self.domain)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("use_utc", &self.use_utc)
            .field("read_only", &self.read_only)
            .field("query_limit", &self.query_limit)
            .field("sas_expiry", &self.sas_expiry)
            .field("sas_lifetime", &self.sas_lifetime)
            .finish()
    }
}

impl DriverConfig {
    /// Names of the environment variables consulted by [`DriverConfig::from_env`].
    pub fn env_variables() -> &'static [&'static str] {
        &[ENV_HOST, ENV_ACCOUNT, ENV_ACCESS_KEY, ENV_DOMAIN]
    }

    /// Builds a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = non_blank(lookup(ENV_HOST)) {
            config.host = host;
        }
        config.account_name = non_blank(lookup(ENV_ACCOUNT));
        config.access_key = non_blank(lookup(ENV_ACCESS_KEY));
        config.domain = non_blank(lookup(ENV_DOMAIN));
        config
    }

    /// Sets the storage account name.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_name = Some(account.into());
        self
    }

    /// Sets the shared account key.
    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    /// Sets an explicit endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the alternate endpoint domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = non_blank(Some(domain.into()));
        self
    }

    /// Marks the driver as read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Pins the expiry of issued shared access signatures.
    pub fn with_sas_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.sas_expiry = Some(expiry);
        self
    }

    /// Returns the account name or an error if it is missing.
    pub fn require_account(&self) -> Result<&str> {
        self.account_name.as_deref().ok_or_else(|| {
            AzureTablesErrorHelper::invalid_state()
                .message(format!("storage account is not set ({ENV_ACCOUNT})"))
        })
    }

    /// Returns the account key or an error if it is missing.
    pub fn require_access_key(&self) -> Result<&str> {
        self.access_key.as_deref().ok_or_else(|| {
            AzureTablesErrorHelper::invalid_state()
                .message(format!("access key is not set ({ENV_ACCESS_KEY})"))
        })
    }

    /// Resolves the base URL of the table service, without a trailing slash.
    pub fn table_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        let account = self.require_account()?;
        match &self.domain {
            Some(domain) if domain.contains("://") => {
                Ok(domain.trim_end_matches('/').to_string())
            }
            Some(domain) => Ok(format!("https://{account}.table.{domain}")),
            None => Ok(format!("https://{account}.table.core.{}", self.host)),
        }
    }

    /// Expiry for a signature issued at `now`.
    pub fn sas_expiry_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.sas_expiry {
            Some(expiry) => expiry,
            None => {
                now + chrono::Duration::from_std(self.sas_lifetime)
                    .unwrap_or_else(|_| chrono::Duration::hours(1))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(600));
        assert!(!config.use_utc);
        assert!(!config.read_only);
        assert_eq!(config.query_limit, 5);
        assert_eq!(config.host, "windows.net");
    }

    #[test]
    fn test_from_lookup_ignores_blank_domain() {
        let config = DriverConfig::from_lookup(lookup(&[
            (ENV_ACCOUNT, "myaccount"),
            (ENV_ACCESS_KEY, "a2V5"),
            (ENV_DOMAIN, "   "),
        ]));
        assert_eq!(config.account_name.as_deref(), Some("myaccount"));
        assert_eq!(config.access_key.as_deref(), Some("a2V5"));
        assert!(config.domain.is_none());
        assert_eq!(
            config.table_endpoint().unwrap(),
            "https://myaccount.table.core.windows.net"
        );
    }

    #[test]
    fn test_explicit_overrides_env() {
        let config = DriverConfig::from_lookup(lookup(&[(ENV_ACCOUNT, "fromenv")]))
            .with_account("explicit")
            .with_read_only(true);
        assert_eq!(config.account_name.as_deref(), Some("explicit"));
        assert!(config.read_only);
    }

    #[test]
    fn test_endpoint_resolution() {
        let cosmos = DriverConfig::default()
            .with_account("acct")
            .with_domain("cosmos.azure.com");
        assert_eq!(
            cosmos.table_endpoint().unwrap(),
            "https://acct.table.cosmos.azure.com"
        );

        let explicit = DriverConfig::default().with_endpoint("http://127.0.0.1:10002/devstore/");
        assert_eq!(
            explicit.table_endpoint().unwrap(),
            "http://127.0.0.1:10002/devstore"
        );

        assert!(DriverConfig::default().table_endpoint().is_err());
    }

    #[test]
    fn test_sas_expiry() {
        let fixed = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let config = DriverConfig::default().with_sas_expiry(fixed);
        assert_eq!(config.sas_expiry_at(now), fixed);
        assert_eq!(
            DriverConfig::default().sas_expiry_at(now),
            now + chrono::Duration::hours(1)
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let config = DriverConfig::default().with_access_key("c2VjcmV0");
        assert!(!format!("{config:?}").contains("c2VjcmV0"));
    }
}
