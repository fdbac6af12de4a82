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

//! API to update an existing post.

use crate::driver::Driver;
use crate::model::PostId;
use crate::rest::files::{self, FormData};
use crate::rest::get_bearer_auth;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use postboard_core::rest::RestError;
use std::path::PathBuf;
use std::sync::Arc;

/// PUT handler for this API.
pub(crate) async fn handler(
    State((driver, images_dir)): State<(Driver, Arc<PathBuf>)>,
    Path(id): Path<PostId>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;

    let mut form = FormData::read(multipart).await?;

    let text = form.take_text("text");
    let image = match form.take_file("picture") {
        Some(file) => Some(files::save_file(&images_dir, files::PICTURE_SUBDIR, file).await?),
        None => None,
    };

    driver.update_post(token, id, text, image).await?;
    Ok(StatusCode::NO_CONTENT)
}
