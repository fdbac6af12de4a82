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

//! Utilities to help testing the REST layer.

use crate::driver::testutils as driver_testutils;
use crate::driver::Driver;
use crate::model::User;
use crate::rest::app;
use crate::token::TokenPair;
use axum::Router;
use postboard_core::clocks::testutils::SettableClock;
use postboard_core::db::Executor;
use std::sync::Arc;

/// State of a running test, wrapping the driver-level context with a router and a temporary
/// directory for uploaded images.
pub(crate) struct TestContext {
    /// The driver-level context, providing direct access to the database and the clock.
    inner: driver_testutils::TestContext,

    /// Temporary directory holding the images saved by upload requests.  Deleted when the
    /// context goes away.
    images_dir: tempfile::TempDir,

    /// The application under test.
    app: Router,
}

impl TestContext {
    /// Initializes the application using an in-memory database, a settable clock and a
    /// temporary images directory.
    pub(crate) async fn setup() -> Self {
        let inner = driver_testutils::TestContext::setup().await;
        let images_dir = tempfile::tempdir().unwrap();
        let app = app(inner.driver(), images_dir.path().to_path_buf());
        TestContext { inner, images_dir, app }
    }

    /// Gets a copy of the app router to issue a request against.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app router.  For use by the payload validation
    /// test macros, which need nothing else from the context.
    pub(crate) fn into_app(self) -> Router {
        // Leak the images directory so that it outlives the router we hand out.
        let _ = self.images_dir.keep();
        self.app
    }

    /// Gets the clock backing the app.
    pub(crate) fn clock(&self) -> &Arc<SettableClock> {
        &self.inner.clock
    }

    /// Gets a copy of the driver backing the app.
    pub(crate) fn driver(&self) -> Driver {
        self.inner.driver()
    }

    /// Gets a direct executor against the database backing the app.
    pub(crate) async fn ex(&self) -> Executor {
        self.inner.ex().await
    }

    /// Gets the directory where upload requests store their images.
    pub(crate) fn images_path(&self) -> &std::path::Path {
        self.images_dir.path()
    }

    /// Syntactic sugar to register a user whose email and username derive from `username`.
    pub(crate) async fn create_test_user(&self, username: &str) -> User {
        self.inner.create_test_user(username).await
    }

    /// Syntactic sugar to register `username` and log them in.
    pub(crate) async fn do_test_login(&self, username: &str) -> (User, TokenPair) {
        self.inner.do_test_login(username).await
    }
}
