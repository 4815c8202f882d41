// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session, activity log and authentication providers.

pub mod auth_provider;
pub mod identity_toolkit;
pub mod local_auth;
pub mod logger;
pub mod session;

pub use auth_provider::{AuthProvider, ProviderState};
pub use identity_toolkit::IdentityToolkitClient;
pub use local_auth::LocalAuthProvider;
pub use logger::ActivityLogger;
pub use session::SessionManager;
