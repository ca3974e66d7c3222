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

//! Mapping between the framework's generic column types and native types.

use super::entity::EdmType;
use std::fmt;
use std::str::FromStr;

/// Backend-agnostic column types understood by the orchestration framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericType {
    String,
    Int,
    Bigint,
    Double,
    Datetime,
    Date,
    Boolean,
    Text,
}

impl GenericType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenericType::String => "string",
            GenericType::Int => "int",
            GenericType::Bigint => "bigint",
            GenericType::Double => "double",
            GenericType::Datetime => "datetime",
            GenericType::Date => "date",
            GenericType::Boolean => "boolean",
            GenericType::Text => "text",
        }
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenericType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenericTypeMap::ENTRIES
            .iter()
            .map(|(generic, _)| *generic)
            .find(|generic| generic.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown generic type '{s}'"))
    }
}

/// Fixed lookup between generic and native column types.
///
/// Every generic type maps to exactly one native type. Native types are not
/// unique (`string` and `text` both store as `Edm.String`), so the reverse
/// lookup returns the first generic type in table order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTypeMap;

impl GenericTypeMap {
    const ENTRIES: [(GenericType, EdmType); 8] = [
        (GenericType::String, EdmType::String),
        (GenericType::Int, EdmType::Int32),
        (GenericType::Bigint, EdmType::Int64),
        (GenericType::Double, EdmType::Double),
        (GenericType::Datetime, EdmType::DateTime),
        (GenericType::Date, EdmType::DateTime),
        (GenericType::Boolean, EdmType::Boolean),
        (GenericType::Text, EdmType::String),
    ];

    /// Native type used to store a generic type.
    pub fn from_generic_type(generic: GenericType) -> EdmType {
        Self::ENTRIES
            .iter()
            .find(|(g, _)| *g == generic)
            .map(|(_, native)| *native)
            .unwrap_or(EdmType::String)
    }

    /// First generic type stored as `native`, if any.
    pub fn lookup_generic(native: EdmType) -> Option<GenericType> {
        Self::ENTRIES
            .iter()
            .find(|(_, n)| *n == native)
            .map(|(generic, _)| *generic)
    }

    /// Generic type for a native type, falling back to `text` when unmapped.
    pub fn to_generic_type(native: EdmType) -> GenericType {
        Self::lookup_generic(native).unwrap_or(GenericType::Text)
    }

    /// Like [`GenericTypeMap::to_generic_type`] but for a raw wire type name.
    pub fn to_generic_type_name(native: &str) -> GenericType {
        native
            .parse::<EdmType>()
            .map(Self::to_generic_type)
            .unwrap_or(GenericType::Text)
    }
}
