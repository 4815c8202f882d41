// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication provider seam.
//!
//! The provider owns credentials and tokens. It pushes identity changes
//! through a `watch` channel; the session task is its only consumer that
//! writes application state.

use crate::error::Result;
use crate::models::Identity;
use futures_util::future::BoxFuture;
use tokio::sync::watch;

/// Identity state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderState {
    /// The provider has not delivered its first notification yet
    Pending,
    SignedOut,
    SignedIn(Identity),
}

impl ProviderState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ProviderState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }
}

pub trait AuthProvider: Send + Sync {
    /// Exchange email and password for an identity.
    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>>;

    /// Create a new identity; the provider signs it in.
    fn create_account<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>>;

    /// Delete the currently signed-in identity.
    fn delete_account(&self) -> BoxFuture<'_, Result<()>>;

    fn sign_out(&self) -> BoxFuture<'_, Result<()>>;

    /// Subscribe to identity changes. The current state is visible immediately.
    fn watch_state(&self) -> watch::Receiver<ProviderState>;

    fn current_identity(&self) -> Option<Identity> {
        self.watch_state().borrow().identity().cloned()
    }
}
