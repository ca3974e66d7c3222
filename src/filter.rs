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

//! Placeholder substitution for native filter expressions.
//!
//! Filter expressions use the table service's OData syntax
//! (`PartitionKey eq ? and Total gt ?`). Each `?` outside a quoted literal is
//! replaced by the next parameter rendered as an OData literal.

use crate::error::{AzureTablesErrorHelper, Result};
use driverbase::error::ErrorHelper;
use serde_json::Value;

/// Placeholder token for filter parameters.
pub const PLACEHOLDER: &str = "?";

/// Renders a parameter as an OData literal.
pub fn literal(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Value::Number(n) if n.is_f64() => Ok(n.to_string()),
        Value::Number(n) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Ok(v.to_string()),
            None => Ok(format!("{n}L")),
        },
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(AzureTablesErrorHelper::invalid_argument()
            .message("null cannot be used as a filter parameter")),
        Value::Array(_) | Value::Object(_) => Err(AzureTablesErrorHelper::invalid_argument()
            .message(format!("unsupported filter parameter {value}"))),
    }
}

/// Substitutes `params` into the placeholders of `filter`.
///
/// The number of placeholders must match the number of parameters exactly.
pub fn bind(filter: &str, params: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(filter.len());
    let mut params_iter = params.iter();
    let mut in_literal = false;
    let mut used = 0usize;

    for ch in filter.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                let value = params_iter.next().ok_or_else(|| {
                    AzureTablesErrorHelper::invalid_argument().message(format!(
                        "filter has more placeholders than the {} parameter(s) given",
                        params.len()
                    ))
                })?;
                out.push_str(&literal(value)?);
                used += 1;
            }
            _ => out.push(ch),
        }
    }

    if used != params.len() {
        return Err(AzureTablesErrorHelper::invalid_argument().message(format!(
            "filter has {used} placeholder(s) but {} parameter(s) were given",
            params.len()
        )));
    }
    Ok(out)
}
