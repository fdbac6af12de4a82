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

//! Issuance and verification of the signed tokens that back authentication.
//!
//! Tokens are stateless: there is no server-side session store, so a token's validity is fully
//! determined by its signature and its expiry claim.  A consequence of this design is that
//! issuing a new token pair does not invalidate previously-issued refresh tokens; they remain
//! usable until their natural expiry.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use postboard_core::env::{get_optional_var, get_required_var};
use postboard_core::model::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// Default lifetime of access tokens when not overridden by configuration.
const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Default lifetime of refresh tokens when not overridden by configuration.
const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Errors raised when a token fails verification.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum TokenError {
    /// The token was well-formed and correctly signed but its expiry time has passed.
    #[error("Token expired")]
    Expired,

    /// The token was malformed, carried an invalid signature or had bad claims.
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Result type for this module.
pub(crate) type TokenResult<T> = Result<T, TokenError>;

/// Configuration for the token service.
#[derive(Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct TokenOptions {
    /// Symmetric secret used to sign and verify tokens.
    pub(crate) secret: String,

    /// Lifetime of the access tokens we issue.
    pub(crate) access_ttl: Duration,

    /// Lifetime of the refresh tokens we issue.
    pub(crate) refresh_ttl: Duration,
}

impl fmt::Debug for TokenOptions {
    /// Manual implementation to keep the signing secret out of the logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenOptions")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenOptions {
    /// Creates a new set of options from environment variables.
    pub(crate) fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            secret: get_required_var::<String>(prefix, "TOKEN_SECRET")?,
            access_ttl: get_optional_var::<Duration>(prefix, "ACCESS_TOKEN_TTL")?
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL),
            refresh_ttl: get_optional_var::<Duration>(prefix, "REFRESH_TOKEN_TTL")?
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL),
        })
    }
}

/// The claims carried by every token we issue.
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// Email address of the authenticated user.
    email: String,

    /// Expiry time as Unix seconds.
    exp: i64,
}

/// An access/refresh token pair as handed out after a successful login or refresh.
#[derive(Debug, PartialEq)]
pub(crate) struct TokenPair {
    /// Short-lived token used to authenticate individual requests.
    pub(crate) access: String,

    /// Long-lived token used solely to obtain a new pair.
    pub(crate) refresh: String,
}

/// Signs a single token for `email` expiring at `exp`.
fn encode(opts: &TokenOptions, email: &EmailAddress, exp: OffsetDateTime) -> TokenResult<String> {
    let claims = Claims { email: email.as_str().to_owned(), exp: exp.unix_timestamp() };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(opts.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Invalid(e.to_string()))
}

/// Issues a new access/refresh token pair for `email`.
///
/// Both tokens carry the same identity claim and differ only in their expiry times, which are
/// computed relative to the caller-provided `now`.
pub(crate) fn issue(
    opts: &TokenOptions,
    email: &EmailAddress,
    now: OffsetDateTime,
) -> TokenResult<TokenPair> {
    Ok(TokenPair {
        access: encode(opts, email, now + opts.access_ttl)?,
        refresh: encode(opts, email, now + opts.refresh_ttl)?,
    })
}

/// Verifies `token` and returns the email claim embedded in it.
///
/// Expiry is checked against the caller-provided `now` with zero leeway instead of against the
/// system clock so that callers with an injected clock get consistent behavior.
pub(crate) fn verify(
    opts: &TokenOptions,
    token: &str,
    now: OffsetDateTime,
) -> TokenResult<EmailAddress> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp"]);

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(opts.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| TokenError::Invalid(e.to_string()))?;

    if data.claims.exp <= now.unix_timestamp() {
        return Err(TokenError::Expired);
    }

    EmailAddress::new(data.claims.email).map_err(|e| TokenError::Invalid(e.to_string()))
}
