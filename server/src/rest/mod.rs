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

//! REST interface for the posting service.

use crate::driver::Driver;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

mod api_posts_create_post;
mod api_posts_id_delete;
mod api_posts_id_get;
mod api_posts_id_like_patch;
mod api_posts_id_update_put;
mod api_posts_list_get;
mod api_posts_me_get;
mod api_users_id_get;
mod api_users_list_get;
mod api_users_login_post;
mod api_users_me_delete;
mod api_users_me_get;
mod api_users_me_update_put;
mod api_users_register_post;
mod api_users_token_refresh_post;
mod files;
mod httputils;
#[cfg(test)]
mod testutils;

pub(crate) use httputils::get_bearer_auth;

/// Creates the router for the service.
///
/// The `driver` is a configured instance of the business logic and `images_dir` is the
/// directory under which uploaded images are stored and from which they are served.
pub(crate) fn app(driver: Driver, images_dir: PathBuf) -> Router {
    use axum::routing::{get, patch, post, put};

    let images_dir = Arc::new(images_dir);

    let upload_router = Router::new()
        .route("/users/register/", post(api_users_register_post::handler))
        .route("/users/me/update/", put(api_users_me_update_put::handler))
        .route("/posts/create/", post(api_posts_create_post::handler))
        .route("/posts/:id/update/", put(api_posts_id_update_put::handler))
        .with_state((driver.clone(), Arc::clone(&images_dir)));

    let images_router = Router::new()
        .nest_service("/images/avatar", ServeDir::new(images_dir.join(files::AVATAR_SUBDIR)))
        .nest_service("/images/picture", ServeDir::new(images_dir.join(files::PICTURE_SUBDIR)));

    Router::new()
        .route("/users/login/", post(api_users_login_post::handler))
        .route("/users/token/refresh/", post(api_users_token_refresh_post::handler))
        .route("/users/list/", get(api_users_list_get::handler))
        .route(
            "/users/me/",
            get(api_users_me_get::handler).delete(api_users_me_delete::handler),
        )
        .route("/users/:id/", get(api_users_id_get::handler))
        .route("/posts/list/", get(api_posts_list_get::handler))
        .route("/posts/me/", get(api_posts_me_get::handler))
        .route(
            "/posts/:id/",
            get(api_posts_id_get::handler).delete(api_posts_id_delete::handler),
        )
        .route("/posts/:id/like/", patch(api_posts_id_like_patch::handler))
        .with_state(driver)
        .merge(upload_router)
        .merge(images_router)
}

#[cfg(test)]
mod tests {
    use super::api_users_login_post::{LoginRequest, TokenPairResponse};
    use super::testutils::*;
    use crate::model::{PostView, UserView};
    use http::{Method, StatusCode};
    use postboard_core::rest::testutils::*;

    /// Exercises the full lifecycle of the service: registration, login, posting and liking.
    #[tokio::test]
    async fn test_e2e_post_and_like_flow() {
        let context = TestContext::setup().await;

        let form = MultipartBuilder::default()
            .text("username", "usera")
            .text("email", "a@x.com")
            .text("password", "Abc12345EFG")
            .text("password_repeat", "Abc12345EFG");
        let user_a = OneShotBuilder::new(context.app(), (Method::POST, "/users/register/"))
            .send_multipart(form)
            .await
            .expect_status(StatusCode::CREATED)
            .expect_json::<UserView>()
            .await;

        let request = LoginRequest { email: "a@x.com".into(), password: "Abc12345EFG".into() };
        let pair_a = OneShotBuilder::new(context.app(), (Method::POST, "/users/login/"))
            .send_form(request)
            .await
            .expect_json::<TokenPairResponse>()
            .await;

        let form = MultipartBuilder::default().text("text", "Hello, world!");
        let post = OneShotBuilder::new(context.app(), (Method::POST, "/posts/create/"))
            .with_bearer_auth(&pair_a.access)
            .send_multipart(form)
            .await
            .expect_status(StatusCode::CREATED)
            .expect_json::<PostView>()
            .await;

        let posts = OneShotBuilder::new(context.app(), (Method::GET, "/posts/list/"))
            .send_empty()
            .await
            .expect_json::<Vec<PostView>>()
            .await;
        assert_eq!(1, posts.len());
        assert_eq!(post.id, posts[0].id);
        assert_eq!(Some(user_a.id), posts[0].owner_id);

        let form = MultipartBuilder::default()
            .text("username", "userb")
            .text("email", "b@x.com")
            .text("password", "Abc12345EFG")
            .text("password_repeat", "Abc12345EFG");
        let user_b = OneShotBuilder::new(context.app(), (Method::POST, "/users/register/"))
            .send_multipart(form)
            .await
            .expect_status(StatusCode::CREATED)
            .expect_json::<UserView>()
            .await;

        let request = LoginRequest { email: "b@x.com".into(), password: "Abc12345EFG".into() };
        let pair_b = OneShotBuilder::new(context.app(), (Method::POST, "/users/login/"))
            .send_form(request)
            .await
            .expect_json::<TokenPairResponse>()
            .await;

        let uri = format!("/posts/{}/like/", post.id.as_i32());
        OneShotBuilder::new(context.app(), (Method::PATCH, uri))
            .with_bearer_auth(&pair_b.access)
            .send_empty()
            .await
            .expect_status(StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        let uri = format!("/posts/{}/", post.id.as_i32());
        let post = OneShotBuilder::new(context.app(), (Method::GET, uri))
            .send_empty()
            .await
            .expect_json::<PostView>()
            .await;
        assert_eq!(vec![user_b.id], post.favorites);

        // Liking your own post must fail.
        let uri = format!("/posts/{}/like/", post.id.as_i32());
        OneShotBuilder::new(context.app(), (Method::PATCH, uri))
            .with_bearer_auth(&pair_a.access)
            .send_empty()
            .await
            .expect_status(StatusCode::BAD_REQUEST)
            .expect_error("own post")
            .await;
    }
}
