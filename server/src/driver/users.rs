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

//! Extends the driver with the operations on user accounts.

use crate::db::{self, Repo};
use crate::driver::{user_view, Driver};
use crate::model::{validate_profile_text, UserId, UserPatch, UserView};
use postboard_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Returns the public view of the user identified by `token`.
    pub(crate) async fn get_current_user(self, token: &str) -> DriverResult<UserView> {
        let mut ex = self.db.ex().await?;
        let user = self.session_user(&mut ex, token).await?;
        user_view(&mut ex, user).await
    }

    /// Returns the public view of the user `id`.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<UserView> {
        let mut ex = self.db.ex().await?;
        let user = db::Users::get_by_id(&mut ex, id).await?;
        user_view(&mut ex, user).await
    }

    /// Returns the public views of all registered users.
    pub(crate) async fn list_users(self) -> DriverResult<Vec<UserView>> {
        let mut ex = self.db.ex().await?;
        let users = db::Users::list(&mut ex).await?;
        let mut views = Vec::with_capacity(users.len());
        for user in users {
            views.push(user_view(&mut ex, user).await?);
        }
        Ok(views)
    }

    /// Applies `patch` to the profile of the user identified by `token`.
    ///
    /// An empty patch is accepted and leaves the profile untouched.
    pub(crate) async fn update_current_user(
        self,
        token: &str,
        patch: UserPatch,
    ) -> DriverResult<()> {
        if let Some(name) = patch.name.as_deref() {
            validate_profile_text("Name", name)
                .map_err(|e| DriverError::InvalidInput(e.to_string()))?;
        }
        if let Some(surname) = patch.surname.as_deref() {
            validate_profile_text("Surname", surname)
                .map_err(|e| DriverError::InvalidInput(e.to_string()))?;
        }

        let mut ex = self.db.ex().await?;
        let user = self.session_user(&mut ex, token).await?;

        if patch.is_empty() {
            return Ok(());
        }

        Ok(db::Users::update(&mut ex, user.id(), patch).await?)
    }

    /// Deletes the account of the user identified by `token`.
    ///
    /// The user's favorites go away with the account but their posts survive with a cleared
    /// ownership, all within one transaction.
    pub(crate) async fn delete_current_user(self, token: &str) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let user = self.session_user(tx.ex(), token).await?;

        db::unlink_user_favorites(tx.ex(), user.id()).await?;
        db::detach_user_posts(tx.ex(), user.id()).await?;
        db::Users::delete(tx.ex(), user.id()).await?;

        tx.commit().await?;
        Ok(())
    }
}
