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

//! ADBC Driver implementation for Azure Table Storage.

use crate::config::DriverConfig;
use crate::database::Database;
use adbc_core::error::Result;
use adbc_core::options::{OptionDatabase, OptionValue};
use adbc_core::Optionable;

/// The main entry point for the Azure Tables ADBC driver.
///
/// The Driver is responsible for creating Database instances, which in turn
/// create Connections. Unless the Driver was given explicit defaults, new
/// databases pick up the `CUBEJS_DB_*` environment variables.
#[derive(Debug, Default)]
pub struct Driver {
    defaults: Option<DriverConfig>,
}

impl Driver {
    /// Creates a new Driver instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Driver whose databases start from `defaults` instead of
    /// the environment.
    pub fn with_defaults(defaults: DriverConfig) -> Self {
        Self {
            defaults: Some(defaults),
        }
    }

    fn database(&self) -> Database {
        match &self.defaults {
            Some(defaults) => Database::with_config(defaults.clone()),
            None => Database::new(),
        }
    }
}

impl adbc_core::Driver for Driver {
    type DatabaseType = Database;

    fn new_database(&mut self) -> Result<Self::DatabaseType> {
        Ok(self.database())
    }

    fn new_database_with_opts(
        &mut self,
        opts: impl IntoIterator<Item = (OptionDatabase, OptionValue)>,
    ) -> Result<Self::DatabaseType> {
        let mut database = self.database();
        for (key, value) in opts {
            database.set_option(key, value)?;
        }
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbc_core::Driver as _;

    #[test]
    fn test_driver_new_database() {
        let mut driver = Driver::new();
        assert!(driver.new_database().is_ok());
    }

    #[test]
    fn test_driver_new_database_with_opts() {
        let mut driver = Driver::new();
        let opts = [(
            OptionDatabase::Uri,
            OptionValue::String("http://127.0.0.1:10002/devstoreaccount1".into()),
        )];
        let database = driver.new_database_with_opts(opts).unwrap();
        assert_eq!(
            database.config().endpoint.as_deref(),
            Some("http://127.0.0.1:10002/devstoreaccount1")
        );
    }

    #[test]
    fn test_driver_defaults_override_environment() {
        let mut driver = Driver::with_defaults(DriverConfig::default().with_account("preset"));
        let database = driver.new_database().unwrap();
        assert_eq!(database.config().account_name.as_deref(), Some("preset"));
    }

    #[test]
    fn test_driver_rejects_unknown_option() {
        let mut driver = Driver::new();
        let opts = [(
            OptionDatabase::Other("azuretables.bogus".into()),
            OptionValue::String("x".into()),
        )];
        assert!(driver.new_database_with_opts(opts).is_err());
    }
}
