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

//! Handling of `multipart/form-data` requests and of the image files they upload.

use axum::extract::multipart::Multipart;
use bytes::Bytes;
use log::warn;
use postboard_core::rest::{RestError, RestResult};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use uuid::Uuid;

/// Subdirectory of the images directory where user avatars are stored.
pub(crate) const AVATAR_SUBDIR: &str = "avatar";

/// Subdirectory of the images directory where post pictures are stored.
pub(crate) const PICTURE_SUBDIR: &str = "picture";

/// A file received as part of a multipart form.
pub(crate) struct UploadedFile {
    /// File name as reported by the client, used only to preserve the extension.
    pub(crate) filename: String,

    /// Raw contents of the file.
    pub(crate) content: Bytes,
}

/// The decoded contents of a multipart form: plain text fields keyed by name and uploaded
/// files keyed by field name.
#[derive(Default)]
pub(crate) struct FormData {
    /// Plain text fields.
    fields: HashMap<String, String>,

    /// Uploaded files.
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Reads all parts of `multipart` into memory.
    pub(crate) async fn read(mut multipart: Multipart) -> RestResult<Self> {
        let mut data = FormData::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    return Err(RestError::InvalidRequest(format!("Invalid form: {}", e)));
                }
            };

            let name = match field.name() {
                Some(name) => name.to_owned(),
                None => return Err(RestError::InvalidRequest("Unnamed form field".to_owned())),
            };

            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let content = field.bytes().await.map_err(|e| {
                        RestError::InvalidRequest(format!("Invalid form: {}", e))
                    })?;
                    data.files.insert(name, UploadedFile { filename, content });
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        RestError::InvalidRequest(format!("Invalid form: {}", e))
                    })?;
                    data.fields.insert(name, text);
                }
            }
        }
        Ok(data)
    }

    /// Extracts the optional text field `name` from the form.
    pub(crate) fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Extracts the mandatory text field `name` from the form.
    pub(crate) fn require_text(&mut self, name: &str) -> RestResult<String> {
        self.fields
            .remove(name)
            .ok_or_else(|| RestError::InvalidRequest(format!("Missing field {}", name)))
    }

    /// Extracts the optional file field `name` from the form.
    pub(crate) fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Persists `file` under the `subdir` subdirectory of `images_dir` with a freshly generated
/// name that preserves the original extension, and returns the URL path under which the file
/// can be retrieved.
pub(crate) async fn save_file(
    images_dir: &Path,
    subdir: &str,
    file: UploadedFile,
) -> RestResult<String> {
    let name = match Path::new(&file.filename).extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    let dir = images_dir.join(subdir);
    let path = dir.join(&name);
    let result = async {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&path, &file.content).await
    }
    .await;
    if let Err(e) = result {
        warn!("Failed to save uploaded file {}: {}", path.display(), e);
        return Err(RestError::InvalidRequest(format!("Cannot save uploaded file: {}", e)));
    }

    Ok(format!("/images/{}/{}", subdir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_file_preserves_extension() {
        let dir = tempfile::tempdir().unwrap();

        let file = UploadedFile {
            filename: "photo.png".to_owned(),
            content: Bytes::from_static(b"not really a png"),
        };
        let url = save_file(dir.path(), AVATAR_SUBDIR, file).await.unwrap();

        assert!(url.starts_with("/images/avatar/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let saved = tokio::fs::read(dir.path().join(AVATAR_SUBDIR).join(name)).await.unwrap();
        assert_eq!(b"not really a png".to_vec(), saved);
    }

    #[tokio::test]
    async fn test_save_file_no_extension() {
        let dir = tempfile::tempdir().unwrap();

        let file =
            UploadedFile { filename: "photo".to_owned(), content: Bytes::from_static(b"data") };
        let url = save_file(dir.path(), PICTURE_SUBDIR, file).await.unwrap();

        let name = url.rsplit('/').next().unwrap();
        assert!(!name.contains('.'));
    }

    #[tokio::test]
    async fn test_save_file_generates_unique_names() {
        let dir = tempfile::tempdir().unwrap();

        let mut urls = vec![];
        for _ in 0..2 {
            let file = UploadedFile {
                filename: "photo.png".to_owned(),
                content: Bytes::from_static(b"data"),
            };
            urls.push(save_file(dir.path(), PICTURE_SUBDIR, file).await.unwrap());
        }
        assert!(urls[0] != urls[1]);
    }

    #[tokio::test]
    async fn test_save_file_io_error() {
        let dir = tempfile::tempdir().unwrap();

        // Occupy the subdirectory path with a file to force the creation to fail.
        tokio::fs::write(dir.path().join(AVATAR_SUBDIR), b"in the way").await.unwrap();

        let file =
            UploadedFile { filename: "photo.png".to_owned(), content: Bytes::from_static(b"data") };
        match save_file(dir.path(), AVATAR_SUBDIR, file).await {
            Err(RestError::InvalidRequest(msg)) => assert!(msg.contains("Cannot save")),
            e => panic!("{:?}", e),
        }
    }
}
