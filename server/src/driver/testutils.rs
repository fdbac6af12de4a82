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

//! Utilities to help testing the business logic.

use crate::db::{self, Repo};
use crate::driver::Driver;
use crate::model::{Password, PasswordOptions, Registration, User};
use crate::token::{TokenOptions, TokenPair};
use postboard_core::clocks::testutils::SettableClock;
use postboard_core::db::{Db, Executor};
use postboard_core::model::{EmailAddress, Username};
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;

/// Password accepted by the strength validator that all test users are created with.
pub(crate) const TEST_PASSWORD: &str = "Abc12345EFG";

/// Returns a set of password hashing options with well-known values for testing.  The
/// iteration count is tiny to keep the tests fast.
pub(crate) fn test_password_opts() -> PasswordOptions {
    PasswordOptions { salt: "the-salt".to_owned(), iterations: 8 }
}

/// Returns a set of token options with well-known values for testing.
pub(crate) fn test_token_opts() -> TokenOptions {
    TokenOptions {
        secret: "test-secret".to_owned(),
        access_ttl: Duration::from_secs(60 * 60),
        refresh_ttl: Duration::from_secs(24 * 60 * 60),
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock the driver is backed by, for tests to manipulate the current time.
    pub(crate) clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(postboard_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(datetime!(2025-06-01 10:00:00 UTC)));

        let driver =
            Driver::new(db.clone(), clock.clone(), test_password_opts(), test_token_opts());

        TestContext { db, clock, driver }
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Syntactic sugar to register a user whose email and username derive from `username`.
    pub(crate) async fn create_test_user(&self, username: &str) -> User {
        let view = self
            .driver()
            .register(Registration {
                email: EmailAddress::new(format!("{}@example.com", username)).unwrap(),
                username: Username::new(username).unwrap(),
                password: Password::new(TEST_PASSWORD).unwrap(),
                name: None,
                surname: None,
                age: None,
                avatar: None,
            })
            .await
            .unwrap();

        db::Users::get_by_id(&mut self.ex().await, view.id).await.unwrap()
    }

    /// Syntactic sugar to register `username` and log them in.
    pub(crate) async fn do_test_login(&self, username: &str) -> (User, TokenPair) {
        let user = self.create_test_user(username).await;
        let pair = self
            .driver()
            .login(user.email().clone(), Password::new(TEST_PASSWORD).unwrap())
            .await
            .unwrap();
        (user, pair)
    }
}
