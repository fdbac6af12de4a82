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

//! Extends the driver with the operations on posts.

use crate::db::{self, NewPost, Repo};
use crate::driver::{post_view, Driver};
use crate::model::{PostId, PostPatch, PostView};
use postboard_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Creates a new post owned by the user identified by `token`.
    pub(crate) async fn create_post(
        self,
        token: &str,
        text: String,
        image: Option<String>,
    ) -> DriverResult<PostView> {
        if text.is_empty() {
            return Err(DriverError::InvalidInput("Post text cannot be empty".to_owned()));
        }

        let mut ex = self.db.ex().await?;
        let user = self.session_user(&mut ex, token).await?;

        let post = db::Posts::create(
            &mut ex,
            NewPost { text, image, owner_id: user.id(), created_at: self.clock.now_utc() },
        )
        .await?;

        post_view(&mut ex, post).await
    }

    /// Returns the public view of the post `id`.
    pub(crate) async fn get_post(self, id: PostId) -> DriverResult<PostView> {
        let mut ex = self.db.ex().await?;
        let post = db::Posts::get_by_id(&mut ex, id).await?;
        post_view(&mut ex, post).await
    }

    /// Returns the public views of all posts.
    pub(crate) async fn list_posts(self) -> DriverResult<Vec<PostView>> {
        let mut ex = self.db.ex().await?;
        let posts = db::Posts::list(&mut ex).await?;
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(post_view(&mut ex, post).await?);
        }
        Ok(views)
    }

    /// Returns the public views of the posts created by the user identified by `token`.
    pub(crate) async fn list_own_posts(self, token: &str) -> DriverResult<Vec<PostView>> {
        let mut ex = self.db.ex().await?;
        let user = self.session_user(&mut ex, token).await?;
        let posts = db::list_posts_by_owner(&mut ex, user.id()).await?;
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(post_view(&mut ex, post).await?);
        }
        Ok(views)
    }

    /// Applies new content to the post `id` on behalf of the user identified by `token`.
    ///
    /// Only the owner may modify a post, and posts that lost their owner cannot be modified
    /// by anyone.  The modification time is always bumped.
    pub(crate) async fn update_post(
        self,
        token: &str,
        id: PostId,
        text: Option<String>,
        image: Option<String>,
    ) -> DriverResult<()> {
        if let Some(text) = text.as_deref() {
            if text.is_empty() {
                return Err(DriverError::InvalidInput("Post text cannot be empty".to_owned()));
            }
        }

        let mut ex = self.db.ex().await?;
        let user = self.session_user(&mut ex, token).await?;

        let post = db::Posts::get_by_id(&mut ex, id).await?;
        if post.owner_id() != Some(user.id()) {
            return Err(DriverError::Forbidden("Only the owner can modify a post".to_owned()));
        }

        let patch = PostPatch { text, image, updated_at: self.clock.now_utc() };
        Ok(db::Posts::update(&mut ex, id, patch).await?)
    }

    /// Deletes the post `id` on behalf of the user identified by `token`.
    ///
    /// Only the owner may delete a post.  The favorites recorded against the post go away
    /// with it, all within one transaction.
    pub(crate) async fn delete_post(self, token: &str, id: PostId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let user = self.session_user(tx.ex(), token).await?;

        let post = db::Posts::get_by_id(tx.ex(), id).await?;
        if post.owner_id() != Some(user.id()) {
            return Err(DriverError::Forbidden("Only the owner can delete a post".to_owned()));
        }

        db::unlink_post_favorites(tx.ex(), id).await?;
        db::Posts::delete(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(())
    }
}
