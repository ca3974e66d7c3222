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

//! Database implementation for the Azure Tables ADBC driver.

use crate::config::DriverConfig;
use crate::connection::Connection;
use crate::error::AzureTablesErrorHelper;
use adbc_core::error::Result;
use adbc_core::options::{OptionConnection, OptionDatabase, OptionValue};
use adbc_core::Optionable;
use driverbase::error::ErrorHelper;
use std::time::Duration;

pub const OPTION_ACCOUNT: &str = "azuretables.account";
pub const OPTION_ACCESS_KEY: &str = "azuretables.access_key";
pub const OPTION_HOST: &str = "azuretables.host";
pub const OPTION_DOMAIN: &str = "azuretables.domain";
pub const OPTION_REQUEST_TIMEOUT_MS: &str = "azuretables.request_timeout_ms";
pub const OPTION_USE_UTC: &str = "azuretables.use_utc";
pub const OPTION_READ_ONLY: &str = "azuretables.read_only";
pub const OPTION_QUERY_LIMIT: &str = "azuretables.query_limit";

/// Represents a database instance that holds connection configuration.
///
/// A Database is created from a Driver and is used to establish Connections.
/// It starts from the environment defaults of [`DriverConfig::from_env`];
/// options set on the Database override them.
#[derive(Debug, Default)]
pub struct Database {
    config: DriverConfig,
}

impl Database {
    /// Creates a new Database with environment defaults.
    pub fn new() -> Self {
        Self::with_config(DriverConfig::from_env())
    }

    /// Creates a new Database from an explicit configuration.
    pub fn with_config(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}

fn string_value(key: &OptionDatabase, value: OptionValue) -> Result<String> {
    match value {
        OptionValue::String(s) => Ok(s),
        other => Err(AzureTablesErrorHelper::set_invalid_option(key, &other).to_adbc()),
    }
}

fn int_value(key: &OptionDatabase, value: OptionValue) -> Result<i64> {
    match value {
        OptionValue::Int(v) if v >= 0 => Ok(v),
        OptionValue::String(ref s) => s
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| AzureTablesErrorHelper::set_invalid_option(key, &value).to_adbc()),
        other => Err(AzureTablesErrorHelper::set_invalid_option(key, &other).to_adbc()),
    }
}

fn bool_value(key: &OptionDatabase, value: OptionValue) -> Result<bool> {
    match value {
        OptionValue::String(ref s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(AzureTablesErrorHelper::set_invalid_option(key, &value).to_adbc()),
        },
        OptionValue::Int(v) => Ok(v != 0),
        other => Err(AzureTablesErrorHelper::set_invalid_option(key, &other).to_adbc()),
    }
}

fn not_set(name: &str) -> adbc_core::error::Error {
    AzureTablesErrorHelper::invalid_state()
        .message(format!("option '{name}' is not set"))
        .to_adbc()
}

impl Optionable for Database {
    type Option = OptionDatabase;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> Result<()> {
        match key {
            OptionDatabase::Uri => {
                self.config.endpoint = Some(string_value(&key, value)?);
                Ok(())
            }
            OptionDatabase::Other(ref s) => match s.as_str() {
                OPTION_ACCOUNT => {
                    self.config.account_name = Some(string_value(&key, value)?);
                    Ok(())
                }
                OPTION_ACCESS_KEY => {
                    self.config.access_key = Some(string_value(&key, value)?);
                    Ok(())
                }
                OPTION_HOST => {
                    self.config.host = string_value(&key, value)?;
                    Ok(())
                }
                OPTION_DOMAIN => {
                    let domain = string_value(&key, value)?;
                    self.config = std::mem::take(&mut self.config).with_domain(domain);
                    Ok(())
                }
                OPTION_REQUEST_TIMEOUT_MS => {
                    let millis = int_value(&key, value)?;
                    self.config.request_timeout = Duration::from_millis(millis as u64);
                    Ok(())
                }
                OPTION_USE_UTC => {
                    self.config.use_utc = bool_value(&key, value)?;
                    Ok(())
                }
                OPTION_READ_ONLY => {
                    self.config.read_only = bool_value(&key, value)?;
                    Ok(())
                }
                OPTION_QUERY_LIMIT => {
                    let limit = int_value(&key, value)?;
                    self.config.query_limit = u32::try_from(limit)
                        .ok()
                        .filter(|l| *l > 0)
                        .ok_or_else(|| {
                            AzureTablesErrorHelper::invalid_argument()
                                .message(format!("option '{OPTION_QUERY_LIMIT}' must be positive"))
                                .to_adbc()
                        })?;
                    Ok(())
                }
                _ => Err(AzureTablesErrorHelper::set_unknown_option(&key).to_adbc()),
            },
            _ => Err(AzureTablesErrorHelper::set_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        match key {
            OptionDatabase::Uri => self.config.endpoint.clone().ok_or_else(|| not_set("uri")),
            OptionDatabase::Other(ref s) => match s.as_str() {
                OPTION_ACCOUNT => self
                    .config
                    .account_name
                    .clone()
                    .ok_or_else(|| not_set(OPTION_ACCOUNT)),
                OPTION_HOST => Ok(self.config.host.clone()),
                OPTION_DOMAIN => self.config.domain.clone().ok_or_else(|| not_set(OPTION_DOMAIN)),
                OPTION_USE_UTC => Ok(self.config.use_utc.to_string()),
                OPTION_READ_ONLY => Ok(self.config.read_only.to_string()),
                // The access key is write-only.
                _ => Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc()),
            },
            _ => Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        match key {
            OptionDatabase::Other(ref s) => match s.as_str() {
                OPTION_REQUEST_TIMEOUT_MS => Ok(self.config.request_timeout.as_millis() as i64),
                OPTION_QUERY_LIMIT => Ok(i64::from(self.config.query_limit)),
                _ => Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc()),
            },
            _ => Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc()),
        }
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(AzureTablesErrorHelper::get_unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Database for Database {
    type ConnectionType = Connection;

    fn new_connection(&self) -> Result<Self::ConnectionType> {
        Connection::new(self.config.clone()).map_err(|e| e.to_adbc())
    }

    fn new_connection_with_opts(
        &self,
        opts: impl IntoIterator<Item = (OptionConnection, OptionValue)>,
    ) -> Result<Self::ConnectionType> {
        let mut connection = self.new_connection()?;
        for (key, value) in opts {
            connection.set_option(key, value)?;
        }
        Ok(connection)
    }
}
