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

//! Extends the driver with the `toggle_favorite` method.

use crate::db::{self, Repo};
use crate::driver::Driver;
use crate::model::PostId;
use postboard_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Toggles whether the post `id` is a favorite of the user identified by `token`.
    ///
    /// Users cannot mark their own posts as favorites.  The membership check and the write
    /// run under a single transaction so that two concurrent toggles cannot both observe the
    /// same state; if they do race from separate connections, the composite primary key on
    /// the join table rejects the duplicate insertion.
    pub(crate) async fn toggle_favorite(self, token: &str, id: PostId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let user = self.session_user(tx.ex(), token).await?;

        let post = db::Posts::get_by_id(tx.ex(), id).await?;
        if post.owner_id() == Some(user.id()) {
            return Err(DriverError::InvalidInput(
                "Cannot mark your own post as a favorite".to_owned(),
            ));
        }

        if db::is_favorite(tx.ex(), user.id(), id).await? {
            db::remove_favorite(tx.ex(), user.id(), id).await?;
        } else {
            db::add_favorite(tx.ex(), user.id(), id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_toggle_favorite_pair_is_idempotent() {
        let context = TestContext::setup().await;

        let (_owner, owner_pair) = context.do_test_login("owner").await;
        let (other, other_pair) = context.do_test_login("other").await;

        let post = context
            .driver()
            .create_post(&owner_pair.access, "Hello".to_owned(), None)
            .await
            .unwrap();

        context.driver().toggle_favorite(&other_pair.access, post.id).await.unwrap();
        assert_eq!(
            vec![other.id()],
            db::list_post_favorites(&mut context.ex().await, post.id).await.unwrap()
        );

        context.driver().toggle_favorite(&other_pair.access, post.id).await.unwrap();
        assert!(db::list_post_favorites(&mut context.ex().await, post.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_toggle_favorite_own_post() {
        let context = TestContext::setup().await;

        let (_owner, pair) = context.do_test_login("owner").await;

        let post =
            context.driver().create_post(&pair.access, "Hello".to_owned(), None).await.unwrap();

        match context.driver().toggle_favorite(&pair.access, post.id).await {
            Err(DriverError::InvalidInput(msg)) => assert!(msg.contains("own post")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_toggle_favorite_ownerless_post_is_allowed() {
        let context = TestContext::setup().await;

        let (owner, owner_pair) = context.do_test_login("owner").await;
        let (other, other_pair) = context.do_test_login("other").await;

        let post = context
            .driver()
            .create_post(&owner_pair.access, "Hello".to_owned(), None)
            .await
            .unwrap();
        db::detach_user_posts(&mut context.ex().await, owner.id()).await.unwrap();

        context.driver().toggle_favorite(&other_pair.access, post.id).await.unwrap();
        assert_eq!(
            vec![other.id()],
            db::list_post_favorites(&mut context.ex().await, post.id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_toggle_favorite_unknown_post() {
        let context = TestContext::setup().await;

        let (_user, pair) = context.do_test_login("someone").await;

        match context.driver().toggle_favorite(&pair.access, PostId::new(123)).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_toggle_favorite_requires_auth() {
        let context = TestContext::setup().await;

        match context.driver().toggle_favorite("not-a-token", PostId::new(1)).await {
            Err(DriverError::Unauthorized(_)) => (),
            e => panic!("{:?}", e),
        }
    }
}
