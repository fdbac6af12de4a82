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

//! API to toggle the favorite mark of the authenticated user on a post.

use crate::driver::Driver;
use crate::model::PostId;
use crate::rest::get_bearer_auth;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use postboard_core::rest::{EmptyBody, RestError};

/// PATCH handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<PostId>,
    headers: HeaderMap,
    _body: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;
    driver.toggle_favorite(token, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::db;
    use crate::rest::testutils::*;
    use axum::http;
    use postboard_core::rest::testutils::OneShotBuilder;

    fn route(id: crate::model::PostId) -> (http::Method, String) {
        (http::Method::PATCH, format!("/posts/{}/like/", id.as_i32()))
    }

    #[tokio::test]
    async fn test_toggle_on_and_off() {
        let context = TestContext::setup().await;

        let (_owner, owner_pair) = context.do_test_login("owner").await;
        let (liker, liker_pair) = context.do_test_login("liker").await;

        let created = context
            .driver()
            .create_post(&owner_pair.access, "Hello".to_owned(), None)
            .await
            .unwrap();

        OneShotBuilder::new(context.app(), route(created.id))
            .with_bearer_auth(&liker_pair.access)
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;
        let favorites =
            db::list_post_favorites(&mut context.ex().await, created.id).await.unwrap();
        assert_eq!(vec![liker.id()], favorites);

        // A second toggle removes the mark again.
        OneShotBuilder::new(context.app(), route(created.id))
            .with_bearer_auth(&liker_pair.access)
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;
        let favorites =
            db::list_post_favorites(&mut context.ex().await, created.id).await.unwrap();
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn test_own_post() {
        let context = TestContext::setup().await;

        let (_owner, pair) = context.do_test_login("owner").await;
        let created =
            context.driver().create_post(&pair.access, "Hello".to_owned(), None).await.unwrap();

        OneShotBuilder::new(context.app(), route(created.id))
            .with_bearer_auth(&pair.access)
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("own post")
            .await;
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        let (_user, pair) = context.do_test_login("someone").await;

        OneShotBuilder::new(context.app(), route(crate::model::PostId::new(123)))
            .with_bearer_auth(&pair.access)
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
    }

    #[tokio::test]
    async fn test_missing_auth() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(crate::model::PostId::new(1)))
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Missing Authorization header")
            .await;
    }
}
