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

//! API to authenticate a user and obtain a token pair.

use crate::driver::Driver;
use crate::model::Password;
use crate::token::TokenPair;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};
use postboard_core::model::EmailAddress;
use postboard_core::rest::RestError;
use serde::{Deserialize, Serialize};

/// Message sent to the server to log in.
#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct LoginRequest {
    /// Email address the account was registered with.
    pub(crate) email: EmailAddress,

    /// Password in plain text form.
    pub(crate) password: Password,
}

/// Message returned by the server carrying a token pair.  Shared with the token refresh API,
/// which hands out the same kind of response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub(crate) struct TokenPairResponse {
    /// Short-lived token used to authenticate individual requests.
    pub(crate) access: String,

    /// Long-lived token used solely to obtain a new pair.
    pub(crate) refresh: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self { access: pair.access, refresh: pair.refresh }
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Form(request): Form<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let pair = driver.login(request.email, request.password).await?;
    Ok(Json(TokenPairResponse::from(pair)))
}
