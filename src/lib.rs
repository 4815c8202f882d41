// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mall Directory: browse shops and offers, sign in, list new shops.
//!
//! This crate provides the session, view and activity-log services of the
//! mall directory, backed by Firestore and Firebase Authentication, and an
//! HTTP surface that serves the page and its controls.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::{LogSink, MallStore};
use services::{ActivityLogger, AuthProvider, SessionManager};
use std::sync::Arc;
use views::ViewController;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub logger: ActivityLogger,
    pub views: ViewController,
}

impl AppState {
    /// Wire the services together. Must be called inside a Tokio runtime.
    pub fn compose(
        config: Config,
        store: Arc<dyn MallStore>,
        log_sink: Arc<dyn LogSink>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let session = Arc::new(SessionManager::start(auth, Arc::clone(&store)));
        let logger = ActivityLogger::start(log_sink, session.subscribe());
        let views = ViewController::new(store, Arc::clone(&session), logger.clone());

        Self {
            config,
            session,
            logger,
            views,
        }
    }
}
