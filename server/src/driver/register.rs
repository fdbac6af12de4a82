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

//! Extends the driver with the `register` method.

use crate::db::{self, NewUser, Repo};
use crate::driver::{validate_password, Driver};
use crate::model::{validate_profile_text, Registration, UserView};
use postboard_core::db::DbError;
use postboard_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Creates a new user account from `data` and returns its public view.
    ///
    /// The uniqueness checks and the insertion run under a single transaction.  The unique
    /// constraints on the `users` table act as the backstop for registrations racing each
    /// other from separate connections.
    pub(crate) async fn register(self, data: Registration) -> DriverResult<UserView> {
        if let Some(name) = data.name.as_deref() {
            validate_profile_text("Name", name)
                .map_err(|e| DriverError::InvalidInput(e.to_string()))?;
        }
        if let Some(surname) = data.surname.as_deref() {
            validate_profile_text("Surname", surname)
                .map_err(|e| DriverError::InvalidInput(e.to_string()))?;
        }

        let password = data
            .password
            .validate_and_hash(validate_password, &self.password_opts)
            .map_err(|e| DriverError::InvalidInput(e.to_string()))?;

        let mut tx = self.db.begin().await?;

        match db::get_user_by_email(tx.ex(), &data.email).await {
            Ok(_) => {
                return Err(DriverError::AlreadyExists("Email is already registered".to_owned()))
            }
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }

        match db::get_user_by_username(tx.ex(), &data.username).await {
            Ok(_) => {
                return Err(DriverError::AlreadyExists("Username is already taken".to_owned()))
            }
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }

        let user = db::Users::create(
            tx.ex(),
            NewUser {
                email: data.email,
                username: data.username,
                password,
                name: data.name,
                surname: data.surname,
                age: data.age,
                avatar: data.avatar,
            },
        )
        .await?;

        tx.commit().await?;

        // A freshly created account has no post relations yet.
        Ok(UserView {
            id: user.id(),
            email: user.email().clone(),
            username: user.username().clone(),
            name: user.name().map(str::to_owned),
            surname: user.surname().map(str::to_owned),
            age: user.age(),
            avatar: user.avatar().map(str::to_owned),
            liked_posts: vec![],
            created_posts: vec![],
        })
    }
}
