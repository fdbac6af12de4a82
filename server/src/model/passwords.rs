// Postboard
// Copyright 2025 The Postboard Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! The `Password` and `HashedPassword` data types.

use base64::engine::general_purpose;
use base64::Engine;
use pbkdf2::pbkdf2_hmac_array;
use postboard_core::env::{get_optional_var, get_required_var};
use postboard_core::model::{ModelError, ModelResult};
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

/// Maximum length of a password.
pub(crate) const MAX_PASSWORD_LENGTH: usize = 50;

/// Number of bytes in the derived key.
const DERIVED_KEY_LENGTH: usize = 32;

/// Default number of PBKDF2 iterations when not overridden by configuration.
const DEFAULT_HASH_ITERS: u32 = 600_000;

/// Configuration for the password hashing scheme.
///
/// The salt and iteration count are fixed per deployment, which makes hashing deterministic
/// for a given configuration.  Changing either invalidates all stored credentials.
#[derive(Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct PasswordOptions {
    /// Salt mixed into every derived key.
    pub(crate) salt: String,

    /// Number of PBKDF2 iterations to perform.
    pub(crate) iterations: u32,
}

impl fmt::Debug for PasswordOptions {
    /// Manual implementation to keep the salt out of the logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordOptions").field("iterations", &self.iterations).finish()
    }
}

impl PasswordOptions {
    /// Creates a new set of options from environment variables.
    pub(crate) fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            salt: get_required_var::<String>(prefix, "HASH_SALT")?,
            iterations: get_optional_var::<u32>(prefix, "HASH_ITERS")?
                .unwrap_or(DEFAULT_HASH_ITERS),
        })
    }
}

/// Derives the raw key for `password` under `opts`.
fn derive(password: &str, opts: &PasswordOptions) -> [u8; DERIVED_KEY_LENGTH] {
    pbkdf2_hmac_array::<Sha256, DERIVED_KEY_LENGTH>(
        password.as_bytes(),
        opts.salt.as_bytes(),
        opts.iterations,
    )
}

/// An opaque type to hold a password, protecting it from leaking into logs.
#[derive(Deserialize, PartialEq)]
#[serde(transparent)]
#[cfg_attr(test, derive(Clone, serde::Serialize))]
pub(crate) struct Password(String);

impl Password {
    /// Creates a new password from a literal string.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() > MAX_PASSWORD_LENGTH {
            return Err(ModelError("Password is too long".to_owned()));
        }
        Ok(Password(s))
    }

    /// Returns a string view of the password.
    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Hashes the password after validating that it is sufficiently complex via the `validator`
    /// hook.  Consumes the password because there is no context in which keeping the password
    /// alive once we have generated its hash is correct.
    pub(crate) fn validate_and_hash(
        self,
        validator: fn(&str) -> Option<&'static str>,
        opts: &PasswordOptions,
    ) -> ModelResult<HashedPassword> {
        if let Some(error) = validator(&self.0) {
            return Err(ModelError(format!("Weak password: {}", error)));
        }
        Ok(HashedPassword::new(general_purpose::STANDARD.encode(derive(&self.0, opts))))
    }

    /// Verifies if this password matches a given `hash` in constant time.
    ///
    /// A stored hash that cannot be decoded counts as a mismatch, not as an error: there is
    /// nothing the caller could do differently and we do not want to leak hash details.
    pub(crate) fn verify(self, hash: &HashedPassword, opts: &PasswordOptions) -> bool {
        let candidate = derive(&self.0, opts);
        match general_purpose::STANDARD.decode(hash.as_str()) {
            Ok(stored) => candidate[..].ct_eq(&stored[..]).into(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
impl From<&'static str> for Password {
    /// Creates a new password from a hardcoded string, which must be valid.
    fn from(s: &'static str) -> Self {
        Password::new(s).expect("Hardcoded passwords must be valid")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed password")
    }
}

/// An opaque type to hold a hashed password, protecting it from leaking into logs.
#[derive(Clone, PartialEq)]
pub(crate) struct HashedPassword(String);

impl HashedPassword {
    /// Creates a new hashed password from a literal string.
    pub(crate) fn new<S: Into<String>>(s: S) -> Self {
        HashedPassword(s.into())
    }

    /// Returns a string view of the hash.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed hash")
    }
}
