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

//! Business logic for the posting service.

use crate::db;
use crate::model::{PasswordOptions, Post, PostView, User, UserView};
use crate::token::{self, TokenOptions};
use postboard_core::clocks::Clock;
use postboard_core::db::{Db, DbError, Executor};
use postboard_core::driver::{DriverError, DriverResult};
use std::sync::Arc;

mod favorites;
mod login;
mod posts;
mod refresh;
mod register;
#[cfg(test)]
pub(crate) mod testutils;
mod users;

/// Minimum length of a password.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum number of uppercase letters a password must carry.
const MIN_PASSWORD_UPPERCASE: usize = 3;

/// Minimum number of digits a password must carry.
const MIN_PASSWORD_DIGITS: usize = 1;

/// Checks that a candidate password is strong enough to be accepted.
///
/// Returns `None` when the password is acceptable or a message describing the violated rule.
/// The maximum length is enforced by the `Password` type itself at construction time.
pub(crate) fn validate_password(password: &str) -> Option<&'static str> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Some("Password must be at least 8 characters long");
    }
    if password.chars().filter(|c| c.is_ascii_uppercase()).count() < MIN_PASSWORD_UPPERCASE {
        return Some("Password must contain at least 3 uppercase letters");
    }
    if password.chars().filter(|c| c.is_ascii_digit()).count() < MIN_PASSWORD_DIGITS {
        return Some("Password must contain at least 1 digit");
    }
    None
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Configuration of the password hashing scheme.
    password_opts: PasswordOptions,

    /// Configuration of the token service.
    token_opts: TokenOptions,
}

impl Driver {
    /// Creates a new driver backed by the given dependencies.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        password_opts: PasswordOptions,
        token_opts: TokenOptions,
    ) -> Self {
        Self { db, clock, password_opts, token_opts }
    }

    /// Resolves the user that `token` identifies.
    ///
    /// This is the gate that every operation requiring authentication goes through: the token
    /// must verify against the signing secret and must not have expired, and the user it
    /// references must still exist.
    async fn session_user(&self, ex: &mut Executor, token: &str) -> DriverResult<User> {
        let email = token::verify(&self.token_opts, token, self.clock.now_utc())
            .map_err(|e| DriverError::Unauthorized(e.to_string()))?;

        match db::get_user_by_email(ex, &email).await {
            Ok(user) => Ok(user),
            Err(DbError::NotFound) => {
                Err(DriverError::NotFound("User no longer exists".to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reshapes `user` into its public view, resolving its post relations.
pub(crate) async fn user_view(ex: &mut Executor, user: User) -> DriverResult<UserView> {
    let liked_posts = db::list_liked_posts(ex, user.id()).await?;
    let created_posts = db::list_created_posts(ex, user.id()).await?;
    Ok(UserView {
        id: user.id(),
        email: user.email().clone(),
        username: user.username().clone(),
        name: user.name().map(str::to_owned),
        surname: user.surname().map(str::to_owned),
        age: user.age(),
        avatar: user.avatar().map(str::to_owned),
        liked_posts,
        created_posts,
    })
}

/// Reshapes `post` into its public view, resolving its favorites relation.
pub(crate) async fn post_view(ex: &mut Executor, post: Post) -> DriverResult<PostView> {
    let favorites = db::list_post_favorites(ex, post.id()).await?;
    Ok(PostView {
        id: post.id(),
        text: post.text().to_owned(),
        image: post.image().map(str::to_owned),
        owner_id: post.owner_id(),
        created_at: post.created_at().unix_timestamp(),
        updated_at: post.updated_at().unix_timestamp(),
        favorites,
    })
}
