// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process authentication provider for local runs without Firebase.
//!
//! Accounts live in memory only. Passwords are kept as salted SHA-256
//! digests, never in clear.

use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::services::auth_provider::{AuthProvider, ProviderState};
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

/// Same minimum as Firebase Authentication.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_digest: String,
}

pub struct LocalAuthProvider {
    /// Keyed by lowercased email
    accounts: DashMap<String, Account>,
    state: watch::Sender<ProviderState>,
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ProviderState::SignedOut);
        Self {
            accounts: DashMap::new(),
            state,
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn digest(uid: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(uid.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let account = self
            .accounts
            .get(&email.to_lowercase())
            .map(|a| a.value().clone())
            .ok_or(AppError::InvalidCredentials)?;

        if Self::digest(&account.uid, password) != account.password_digest {
            return Err(AppError::InvalidCredentials);
        }

        let identity = Identity {
            uid: account.uid,
            email: Some(account.email),
        };
        self.state
            .send_replace(ProviderState::SignedIn(identity.clone()));
        Ok(identity)
    }

    fn create(&self, email: &str, password: &str) -> Result<Identity> {
        if !email.contains('@') {
            return Err(AppError::AuthProvider("INVALID_EMAIL".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::AuthProvider(format!(
                "WEAK_PASSWORD : Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let key = email.to_lowercase();
        let uid = uuid::Uuid::new_v4().simple().to_string();
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AppError::AuthProvider("EMAIL_EXISTS".to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Account {
                    uid: uid.clone(),
                    email: email.to_string(),
                    password_digest: Self::digest(&uid, password),
                });
            }
        }

        let identity = Identity {
            uid,
            email: Some(email.to_string()),
        };
        tracing::info!(uid = %identity.uid, "Local account created");
        self.state
            .send_replace(ProviderState::SignedIn(identity.clone()));
        Ok(identity)
    }

    fn delete_current(&self) -> Result<()> {
        let uid = self
            .state
            .borrow()
            .identity()
            .map(|i| i.uid.clone())
            .ok_or(AppError::NoSession)?;

        self.accounts.retain(|_, account| account.uid != uid);
        self.state.send_replace(ProviderState::SignedOut);
        tracing::info!(uid = %uid, "Local account deleted");
        Ok(())
    }
}

impl AuthProvider for LocalAuthProvider {
    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        futures_util::future::ready(self.sign_in(email, password)).boxed()
    }

    fn create_account<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        futures_util::future::ready(self.create(email, password)).boxed()
    }

    fn delete_account(&self) -> BoxFuture<'_, Result<()>> {
        futures_util::future::ready(self.delete_current()).boxed()
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<()>> {
        self.state.send_replace(ProviderState::SignedOut);
        futures_util::future::ready(Ok(())).boxed()
    }

    fn watch_state(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }
}
