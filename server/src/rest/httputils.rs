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

//! Utilities to deal with HTTP authorization.

use http::header::HeaderMap;
use postboard_core::rest::{get_unique_header, RestError, RestResult, AUTHORIZATION_SCHEME};

/// Validates that the `Authorization` HTTP header carries a bearer credential and returns its
/// opaque payload.  The payload is not verified here in any way; that's the driver's job.
pub(crate) fn get_bearer_auth(headers: &HeaderMap) -> RestResult<&str> {
    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => {
            return Err(RestError::unauthorized("Missing Authorization header"));
        }
        Err(e) => return Err(RestError::unauthorized(e.to_string())),
    };

    let authz = match authz.to_str() {
        Ok(value) => value,
        Err(e) => {
            return Err(RestError::unauthorized(format!(
                "Bad encoding in Authorization header: {}",
                e
            )));
        }
    };

    let mut fields = authz.splitn(2, ' ');
    let scheme = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Err(RestError::unauthorized("Bad Authorization header: missing scheme"));
        }
    };
    let payload = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Err(RestError::unauthorized("Bad Authorization header: missing payload"));
        }
    };
    assert!(fields.next().is_none());

    if scheme != AUTHORIZATION_SCHEME {
        return Err(RestError::unauthorized("Unsupported scheme"));
    }

    Ok(payload)
}
