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

//! API to update the profile of the authenticated user.

use crate::driver::Driver;
use crate::model::{Age, UserPatch};
use crate::rest::files::{self, FormData};
use crate::rest::get_bearer_auth;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use postboard_core::rest::RestError;
use std::path::PathBuf;
use std::sync::Arc;

/// PUT handler for this API.
pub(crate) async fn handler(
    State((driver, images_dir)): State<(Driver, Arc<PathBuf>)>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;

    let mut form = FormData::read(multipart).await?;

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

    let patch = UserPatch { name, surname, age, avatar };
    driver.update_current_user(token, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}
