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

//! API to query the profile of the authenticated user.

use crate::driver::Driver;
use crate::rest::get_bearer_auth;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use postboard_core::rest::{EmptyBody, RestError};

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    _body: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;
    let view = driver.get_current_user(token).await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use crate::model::UserView;
    use crate::rest::testutils::*;
    use axum::http;
    use postboard_core::rest::testutils::OneShotBuilder;
    use std::time::Duration;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/users/me/".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let (user, pair) = context.do_test_login("someone").await;

        let view = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(&pair.access)
            .send_empty()
            .await
            .expect_json::<UserView>()
            .await;
        assert_eq!(user.id(), view.id);
        assert_eq!(user.email(), &view.email);
    }

    #[tokio::test]
    async fn test_missing_auth() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Missing Authorization header")
            .await;
    }

    #[tokio::test]
    async fn test_expired_token() {
        let context = TestContext::setup().await;

        let (_user, pair) = context.do_test_login("someone").await;

        context.clock().advance(Duration::from_secs(2 * 60 * 60));

        OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(&pair.access)
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("expired")
            .await;
    }
}
