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

//! API to register a new user account.

use crate::driver::Driver;
use crate::model::{Age, Password, Registration};
use crate::rest::files::{self, FormData};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use postboard_core::model::{EmailAddress, Username};
use postboard_core::rest::RestError;
use std::path::PathBuf;
use std::sync::Arc;

/// POST handler for this API.
///
/// The request is a multipart form because it may carry an avatar image alongside the text
/// fields.  The avatar is saved to disk before the account exists, so a failed registration
/// can leave an orphaned image behind; those are harmless and can be garbage-collected
/// offline.
pub(crate) async fn handler(
    State((driver, images_dir)): State<(Driver, Arc<PathBuf>)>,
    multipart: Multipart,
) -> Result<impl IntoResponse, RestError> {
    let mut form = FormData::read(multipart).await?;

    let username = Username::new(form.require_text("username")?)?;
    let email = EmailAddress::new(form.require_text("email")?)?;

    let password = Password::new(form.require_text("password")?)?;
    let password_repeat = Password::new(form.require_text("password_repeat")?)?;
    if password != password_repeat {
        return Err(RestError::InvalidRequest("Passwords do not match".to_owned()));
    }

    let name = form.take_text("name");
    let surname = form.take_text("surname");
    let age = match form.take_text("age") {
        Some(text) => {
            let age = text
                .parse::<i16>()
                .map_err(|e| RestError::InvalidRequest(format!("Invalid age: {}", e)))?;
            Some(Age::new(age)?)
        }
        None => None,
    };

    let avatar = match form.take_file("avatar") {
        Some(file) => Some(files::save_file(&images_dir, files::AVATAR_SUBDIR, file).await?),
        None => None,
    };

    let registration = Registration { email, username, password, name, surname, age, avatar };
    let view = driver.register(registration).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[cfg(test)]
mod tests {
    use crate::model::UserView;
    use crate::rest::testutils::*;
    use axum::http;
    use postboard_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/users/register/".to_owned())
    }

    /// Returns a form with the mandatory registration fields filled in.
    fn minimal_form(username: &str, email: &str) -> MultipartBuilder {
        MultipartBuilder::default()
            .text("username", username)
            .text("email", email)
            .text("password", "Abc12345EFG")
            .text("password_repeat", "Abc12345EFG")
    }

    #[tokio::test]
    async fn test_ok_minimal() {
        let context = TestContext::setup().await;

        let view = OneShotBuilder::new(context.app(), route())
            .send_multipart(minimal_form("someone", "someone@example.com"))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<UserView>()
            .await;

        assert_eq!("someone", view.username.as_str());
        assert_eq!(None, view.name);
        assert_eq!(None, view.avatar);
        assert!(view.liked_posts.is_empty());
        assert!(view.created_posts.is_empty());
    }

    #[tokio::test]
    async fn test_ok_all_fields_and_avatar() {
        let context = TestContext::setup().await;

        let form = minimal_form("someone", "someone@example.com")
            .text("name", "John")
            .text("surname", "Doe")
            .text("age", "30")
            .file("avatar", "me.png", &mime::IMAGE_PNG, b"not really a png");
        let view = OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<UserView>()
            .await;

        assert_eq!(Some("John".to_owned()), view.name);
        assert_eq!(Some("Doe".to_owned()), view.surname);

        let avatar = view.avatar.unwrap();
        assert!(avatar.starts_with("/images/avatar/"));
        assert!(avatar.ends_with(".png"));

        // The uploaded bytes must have landed in the images directory.
        let name = avatar.rsplit('/').next().unwrap();
        let saved =
            tokio::fs::read(context.images_path().join("avatar").join(name)).await.unwrap();
        assert_eq!(b"not really a png".to_vec(), saved);
    }

    #[tokio::test]
    async fn test_missing_mandatory_field() {
        let context = TestContext::setup().await;

        let form = MultipartBuilder::default()
            .text("username", "someone")
            .text("password", "Abc12345EFG")
            .text("password_repeat", "Abc12345EFG");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Missing field email")
            .await;
    }

    #[tokio::test]
    async fn test_passwords_do_not_match() {
        let context = TestContext::setup().await;

        let form = MultipartBuilder::default()
            .text("username", "someone")
            .text("email", "someone@example.com")
            .text("password", "Abc12345EFG")
            .text("password_repeat", "Xyz12345EFG");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Passwords do not match")
            .await;
    }

    #[tokio::test]
    async fn test_weak_password() {
        let context = TestContext::setup().await;

        let form = MultipartBuilder::default()
            .text("username", "someone")
            .text("email", "someone@example.com")
            .text("password", "weak")
            .text("password_repeat", "weak");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Weak password")
            .await;
    }

    #[tokio::test]
    async fn test_invalid_age() {
        let context = TestContext::setup().await;

        let form = minimal_form("someone", "someone@example.com").text("age", "not a number");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Invalid age")
            .await;
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let context = TestContext::setup().await;

        context.create_test_user("someone").await;

        let form = minimal_form("somebody", "someone@example.com");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("already registered")
            .await;
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let context = TestContext::setup().await;

        context.create_test_user("someone").await;

        let form = minimal_form("someone", "other@example.com");
        OneShotBuilder::new(context.app(), route())
            .send_multipart(form)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("already taken")
            .await;
    }
}
