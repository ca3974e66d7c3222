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

//! Azure Tables ADBC Driver for Rust
//!
//! This crate provides an ADBC (Arrow Database Connectivity) driver for
//! Azure Table Storage and the Cosmos DB Table API.
//!
//! ## Overview
//!
//! The driver implements the standard ADBC traits from `adbc_core`:
//! - [`Driver`] - Entry point for creating database connections
//! - [`Database`] - Holds connection configuration
//! - [`Connection`] - Owns the table service handle
//! - [`Statement`] - Filter and schema query execution
//!
//! Underneath, [`TableStorageDriver`] exposes the async driver contract of
//! the query orchestration framework (`test_connection`, `query`,
//! `get_tables`, `download_query_results`, `get_sas_token`, ...).
//!
//! Table storage has no SQL. Query text is a native filter expression such
//! as `PartitionKey eq ?`; the first bound parameter names the table and the
//! rest fill the placeholders. At most `azuretables.query_limit` entities
//! are returned.
//!
//! ## Example
//!
//! ```ignore
//! use azuretables_adbc::Driver;
//! use adbc_core::Driver as _;
//!
//! let mut driver = Driver::new();
//! let mut database = driver.new_database()?;
//! database.set_option(OptionDatabase::Other("azuretables.account".into()), OptionValue::String("myaccount".into()))?;
//! database.set_option(OptionDatabase::Other("azuretables.access_key".into()), OptionValue::String("base64key==".into()))?;
//!
//! let mut connection = database.new_connection()?;
//! let mut statement = connection.new_statement()?;
//! statement.set_sql_query("PartitionKey eq ?")?;
//! statement.bind(params)?; // ["Orders", "42"]
//! let result = statement.execute()?;
//! ```
//!
//! ## Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `uri` | | Full table endpoint URL |
//! | `azuretables.account` | `CUBEJS_DB_NAME` | Storage account name |
//! | `azuretables.access_key` | `CUBEJS_DB_PASS` | Base64 account key |
//! | `azuretables.host` | `CUBEJS_DB_HOST`, `windows.net` | Endpoint host suffix |
//! | `azuretables.domain` | `CUBEJS_DB_DOMAIN` | Alternate endpoint domain |
//! | `azuretables.request_timeout_ms` | 600000 | HTTP request timeout |
//! | `azuretables.use_utc` | false | Dialect UTC option |
//! | `azuretables.read_only` | false | Reported read-only flag |
//! | `azuretables.query_limit` | 5 | Maximum entities per filter query |

pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod database;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod filter;
pub mod result;
pub mod schema;
pub mod statement;
pub mod tables;
pub mod types;

pub use config::DriverConfig;
pub use connection::Connection;
pub use database::Database;
pub use driver::Driver;
pub use error::{AzureTablesErrorHelper, Error, Result};
pub use statement::Statement;
pub use tables::TableStorageDriver;
