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

//! Extends the driver with the `login` method.

use crate::db;
use crate::driver::Driver;
use crate::model::Password;
use crate::token::{self, TokenPair};
use postboard_core::db::DbError;
use postboard_core::driver::{DriverError, DriverResult};
use postboard_core::model::EmailAddress;

impl Driver {
    /// Authenticates the user registered under `email` and hands out a fresh token pair.
    pub(crate) async fn login(
        self,
        email: EmailAddress,
        password: Password,
    ) -> DriverResult<TokenPair> {
        let mut ex = self.db.ex().await?;

        let user = match db::get_user_by_email(&mut ex, &email).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound("Unknown email".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        if !password.verify(user.password(), &self.password_opts) {
            return Err(DriverError::Unauthorized("Invalid password".to_owned()));
        }

        token::issue(&self.token_opts, user.email(), self.clock.now_utc())
            .map_err(|e| DriverError::BackendError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::token;
    use postboard_core::clocks::Clock;

    #[tokio::test]
    async fn test_login_ok() {
        let context = TestContext::setup().await;

        let user = context.create_test_user("someone").await;

        let pair = context
            .driver()
            .login(user.email().clone(), Password::new(TEST_PASSWORD).unwrap())
            .await
            .unwrap();

        // Both tokens must resolve back to the identity that logged in.
        let now = context.clock.now_utc();
        assert_eq!(
            user.email(),
            &token::verify(&test_token_opts(), &pair.access, now).unwrap()
        );
        assert_eq!(
            user.email(),
            &token::verify(&test_token_opts(), &pair.refresh, now).unwrap()
        );
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let context = TestContext::setup().await;

        let result = context
            .driver()
            .login(EmailAddress::from("nobody@example.com"), Password::from(TEST_PASSWORD))
            .await;
        match result {
            Err(DriverError::NotFound(msg)) => assert!(msg.contains("Unknown email")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_login_invalid_password() {
        let context = TestContext::setup().await;

        let user = context.create_test_user("someone").await;

        let result = context
            .driver()
            .login(user.email().clone(), Password::from("Bad12345EFG"))
            .await;
        match result {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("Invalid password")),
            e => panic!("{:?}", e),
        }
    }
}
