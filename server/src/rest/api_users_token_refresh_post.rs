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

//! API to exchange a refresh token for a new token pair.

use crate::driver::Driver;
use crate::rest::api_users_login_post::TokenPairResponse;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Form, Json};
use postboard_core::rest::RestError;
use serde::Deserialize;

/// Message sent to the server to refresh a session.
#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct RefreshRequest {
    /// The refresh token obtained at login time or from a previous refresh.
    pub(crate) refresh_token: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Form(request): Form<RefreshRequest>,
) -> Result<impl IntoResponse, RestError> {
    let pair = driver.refresh(&request.refresh_token).await?;
    Ok(Json(TokenPairResponse::from(pair)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use postboard_core::rest::testutils::OneShotBuilder;
    use postboard_core::test_payload_must_be_form;
    use std::time::Duration;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/users/token/refresh/".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let (_user, pair) = context.do_test_login("someone").await;

        // Let the access token expire; the refresh token remains valid for longer.
        context.clock().advance(Duration::from_secs(2 * 60 * 60));

        let request = RefreshRequest { refresh_token: pair.refresh };
        let response = OneShotBuilder::new(context.app(), route())
            .send_form(request)
            .await
            .expect_json::<TokenPairResponse>()
            .await;

        // The fresh access token must identify the original account.
        let view = OneShotBuilder::new(context.app(), (http::Method::GET, "/users/me/"))
            .with_bearer_auth(&response.access)
            .send_empty()
            .await
            .expect_json::<crate::model::UserView>()
            .await;
        assert_eq!("someone", view.username.as_str());
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let context = TestContext::setup().await;

        let (_user, pair) = context.do_test_login("someone").await;

        context.clock().advance(Duration::from_secs(25 * 60 * 60));

        let request = RefreshRequest { refresh_token: pair.refresh };
        OneShotBuilder::new(context.app(), route())
            .send_form(request)
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("expired")
            .await;
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let context = TestContext::setup().await;

        let request = RefreshRequest { refresh_token: "not-a-token".to_owned() };
        OneShotBuilder::new(context.app(), route())
            .send_form(request)
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid token")
            .await;
    }

    test_payload_must_be_form!(TestContext::setup().await.into_app(), route());
}
