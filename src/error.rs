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

//! Error types for the Azure Tables ADBC driver.
//!
//! This module uses the driverbase error framework to provide consistent,
//! informative error messages that integrate with the ADBC error model.
//! Backend failures (transport, authentication, rejected filters) are
//! surfaced unchanged through these types; the driver never retries.

use driverbase::error::ErrorHelper;

/// Error helper for Azure Tables driver errors.
///
/// This type implements the driverbase `ErrorHelper` trait to provide
/// consistent error formatting with the driver name prefix.
#[derive(Clone)]
pub struct AzureTablesErrorHelper;

impl ErrorHelper for AzureTablesErrorHelper {
    const NAME: &'static str = "AzureTables";
}

/// The error type for Azure Tables ADBC driver operations.
pub type Error = driverbase::error::Error<AzureTablesErrorHelper>;

/// A convenient alias for Results with Azure Tables errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Wraps a transport-level failure from the HTTP client.
pub(crate) fn transport_error(err: reqwest::Error, context: &str) -> Error {
    AzureTablesErrorHelper::io()
        .message(err.to_string())
        .context(context.to_string())
}

/// Wraps a failure reported by the table service itself.
///
/// Client errors (4xx other than auth) are treated as invalid arguments since
/// they almost always stem from a malformed filter or an unknown table.
pub(crate) fn service_error(status: u16, code: Option<&str>, message: &str) -> Error {
    let text = match code {
        Some(code) => format!("table service returned {status} ({code}): {message}"),
        None => format!("table service returned {status}: {message}"),
    };
    match status {
        400 | 404 | 409 => AzureTablesErrorHelper::invalid_argument().message(text),
        _ => AzureTablesErrorHelper::io().message(text),
    }
}
