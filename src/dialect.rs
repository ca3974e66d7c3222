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

//! Query dialect companion.
//!
//! The table service has no SQL time or date functions. Instead of silently
//! returning expressions unchanged, the dialect reports which capabilities are
//! missing so callers can decide to do the work themselves; the rendering
//! methods still pass their input through for callers that don't check.

use std::fmt;
use std::str::FromStr;

/// Native temporal capabilities of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectCapabilities {
    pub time_zone_conversion: bool,
    pub timestamp_cast: bool,
    pub date_cast: bool,
    pub interval_arithmetic: bool,
    pub time_grouping: bool,
    pub identifier_escaping: bool,
}

impl DialectCapabilities {
    /// True when the backend supports none of the temporal operations.
    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }
}

/// Time granularities understood by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// Interval code used when rendering time buckets.
    pub fn interval_code(&self) -> &'static str {
        match self {
            Granularity::Second => "ss",
            Granularity::Minute => "mm",
            Granularity::Hour => "HH24",
            Granularity::Day => "DD",
            Granularity::Week => "W",
            Granularity::Month => "MM",
            Granularity::Year => "YY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" => Ok(Granularity::Second),
            "minute" => Ok(Granularity::Minute),
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

/// Dialect companion of [`TableStorageDriver`](crate::tables::TableStorageDriver).
#[derive(Debug, Clone, Copy, Default)]
pub struct TableQueryDialect {
    use_utc: bool,
}

impl TableQueryDialect {
    pub fn new(use_utc: bool) -> Self {
        Self { use_utc }
    }

    /// Whether the caller asked for UTC handling.
    pub fn use_utc(&self) -> bool {
        self.use_utc
    }

    /// All temporal capabilities are absent.
    pub fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities::default()
    }

    pub fn convert_tz(&self, field: &str) -> String {
        field.to_string()
    }

    pub fn time_stamp_cast(&self, value: &str) -> String {
        value.to_string()
    }

    pub fn date_time_cast(&self, value: &str) -> String {
        value.to_string()
    }

    pub fn add_interval(&self, date: &str, _interval: &str) -> String {
        date.to_string()
    }

    pub fn subtract_interval(&self, date: &str, _interval: &str) -> String {
        date.to_string()
    }

    pub fn time_grouped_column(&self, _granularity: Granularity, dimension: &str) -> String {
        dimension.to_string()
    }

    pub fn escape_column_name(&self, name: &str) -> String {
        name.to_string()
    }
}
