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

//! Shared account key authentication.

use super::AuthProvider;
use crate::error::{AzureTablesErrorHelper, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use driverbase::error::ErrorHelper;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Shared key authentication provider.
///
/// Signs requests with the `SharedKeyLite` scheme of the table service and
/// is also used to sign shared access signatures.
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyCredential {
    /// Creates a credential from an account name and a base64 account key.
    pub fn new(account: impl Into<String>, key: &str) -> Result<Self> {
        let key = BASE64.decode(key.trim()).map_err(|e| {
            AzureTablesErrorHelper::invalid_argument()
                .message(format!("access key is not valid base64: {e}"))
        })?;
        Ok(Self {
            account: account.into(),
            key,
        })
    }

    /// Returns the account name.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Computes the base64 HMAC-SHA256 signature of `string_to_sign`.
    pub fn sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|e| {
            AzureTablesErrorHelper::invalid_argument()
                .message(format!("unusable access key: {e}"))
        })?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl AuthProvider for SharedKeyCredential {
    fn get_auth_header(&self, date: &str, resource: &str) -> Result<String> {
        let string_to_sign = format!("{date}\n/{}/{resource}", self.account);
        Ok(format!(
            "SharedKeyLite {}:{}",
            self.account,
            self.sign(&string_to_sign)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> SharedKeyCredential {
        SharedKeyCredential::new("myaccount", &BASE64.encode(b"secret-key")).unwrap()
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(SharedKeyCredential::new("myaccount", "not base64!").is_err());
    }

    #[test]
    fn test_auth_header_format() {
        let header = credential()
            .get_auth_header("Mon, 01 Jan 2024 00:00:00 GMT", "Tables")
            .unwrap();
        assert!(header.starts_with("SharedKeyLite myaccount:"));
        let signature = header.rsplit(':').next().unwrap();
        assert_eq!(BASE64.decode(signature).unwrap().len(), 32);
    }

    #[test]
    fn test_signature_depends_on_resource() {
        let cred = credential();
        let date = "Mon, 01 Jan 2024 00:00:00 GMT";
        assert_eq!(
            cred.get_auth_header(date, "Tables").unwrap(),
            cred.get_auth_header(date, "Tables").unwrap()
        );
        assert_ne!(
            cred.get_auth_header(date, "Tables").unwrap(),
            cred.get_auth_header(date, "Orders()").unwrap()
        );
    }

    #[test]
    fn test_debug_hides_key() {
        assert!(!format!("{:?}", credential()).contains("secret"));
    }
}
