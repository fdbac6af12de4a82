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

//! REST service for a social posting application.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use postboard_core::clocks::SystemClock;
use postboard_core::db::Db;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod db;
mod driver;
use driver::Driver;
mod model;
use model::PasswordOptions;
mod rest;
use rest::app;
mod token;
use token::TokenOptions;

/// Environment variable prefix under which the service configuration lives.
const ENV_PREFIX: &str = "POSTBOARD";

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose
/// many crate-internal types to the public, which in turn would make dead code detection
/// harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    images_dir: PathBuf,
) -> Result<(), Box<dyn Error>> {
    db::init_schema(&mut db.ex().await?).await?;

    let password_opts = PasswordOptions::from_env(ENV_PREFIX)?;
    let token_opts = TokenOptions::from_env(ENV_PREFIX)?;

    let clock = Arc::from(SystemClock::default());
    let driver = Driver::new(db, clock, password_opts, token_opts);

    // The browser frontend is served from a different origin than the API.
    let app = app(driver, images_dir).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(bind_addr.into()).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
