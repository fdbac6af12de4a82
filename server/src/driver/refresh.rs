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

//! Extends the driver with the `refresh` method.

use crate::driver::Driver;
use crate::token::{self, TokenPair};
use postboard_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Exchanges a valid refresh token for a brand new token pair.
    ///
    /// The old refresh token is not invalidated by this exchange and remains usable until its
    /// natural expiry.  See the `token` module for the rationale.
    pub(crate) async fn refresh(self, refresh_token: &str) -> DriverResult<TokenPair> {
        let mut ex = self.db.ex().await?;

        let user = self.session_user(&mut ex, refresh_token).await?;

        token::issue(&self.token_opts, user.email(), self.clock.now_utc())
            .map_err(|e| DriverError::BackendError(e.to_string()))
    }
}
