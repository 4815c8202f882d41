// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session management.
//!
//! A dedicated task is the only writer of the session value. It applies, in
//! delivery order:
//! 1. Results of imperative calls (login, register, logout), sent over a
//!    command channel and acknowledged once applied
//! 2. Identity changes pushed by the authentication provider
//!
//! Readers observe snapshots through a `watch` channel.
//!
//! Providers also push `SignedIn` for sign-ins the application started
//! itself. While such a call is in flight those pushes are skipped; the call
//! publishes the complete session (with profile name) when it finishes. If
//! the last in-flight call goes away without publishing (its future was
//! dropped), the skipped push is applied then.

use crate::db::MallStore;
use crate::error::{AppError, Result};
use crate::models::{Identity, Session, SessionState, UserProfile};
use crate::services::auth_provider::{AuthProvider, ProviderState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// A state transition requested by an imperative call.
struct Apply {
    state: SessionState,
    applied: oneshot::Sender<()>,
}

enum Command {
    Apply(Apply),
    /// An in-flight call finished, with or without applying a state
    Settled,
}

/// Owns the current-user identity.
pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn MallStore>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    /// Number of login/register calls currently talking to the provider
    in_flight: Arc<AtomicUsize>,
}

/// Marks an imperative sign-in as in flight until dropped.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
    commands: &'a mpsc::UnboundedSender<Command>,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, commands: &'a mpsc::UnboundedSender<Command>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter, commands }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        let _ = self.commands.send(Command::Settled);
    }
}

impl SessionManager {
    /// Start the session task. Must be called inside a Tokio runtime.
    pub fn start(auth: Arc<dyn AuthProvider>, store: Arc<dyn MallStore>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SessionState::Unauthenticated);
        let in_flight = Arc::new(AtomicUsize::new(0));

        tokio::spawn(run_session_task(
            command_rx,
            auth.watch_state(),
            Arc::clone(&store),
            state_tx,
            Arc::clone(&in_flight),
        ));

        Self {
            auth,
            store,
            commands,
            state,
            in_flight,
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Resolve with the provider's identity once it has reported a state.
    ///
    /// Fails with `NoSession` when the provider reports nobody signed in,
    /// so callers can tell "anonymous" from "still loading".
    pub async fn check_auth_state(&self) -> Result<Identity> {
        let mut provider = self.auth.watch_state();
        let reported = provider
            .wait_for(|state| *state != ProviderState::Pending)
            .await
            .map_err(|_| AppError::AuthProvider("Provider stopped".to_string()))?
            .clone();

        match reported {
            ProviderState::SignedIn(identity) => {
                let profile = self.store.user_profile(&identity.uid).await?;
                let name = profile.and_then(|p| p.name);
                self.apply(SessionState::Authenticated(Session {
                    identity: identity.clone(),
                    name,
                }))
                .await?;
                Ok(identity)
            }
            _ => {
                self.apply(SessionState::Unauthenticated).await?;
                Err(AppError::NoSession)
            }
        }
    }

    /// Sign in with email and password. The session is unchanged on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let _in_flight = InFlight::enter(&self.in_flight, &self.commands);
        let identity = self
            .auth
            .sign_in_with_password(email, password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

        let name = match self.store.user_profile(&identity.uid).await {
            Ok(profile) => profile.and_then(|p| p.name),
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Profile lookup failed");
                None
            }
        };

        let session = Session { identity, name };
        self.apply(SessionState::Authenticated(session.clone())).await?;
        tracing::info!(uid = %session.identity.uid, "User logged in");
        Ok(session)
    }

    /// Create an identity and its profile document.
    ///
    /// If the profile write fails the new identity is deleted again so no
    /// account exists without a profile.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let _in_flight = InFlight::enter(&self.in_flight, &self.commands);
        let identity = self
            .auth
            .create_account(email, password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Registration failed"))?;

        let profile = UserProfile::new_user(name, email, chrono::Utc::now());
        if let Err(e) = self.store.set_user_profile(&identity.uid, &profile).await {
            tracing::error!(
                uid = %identity.uid,
                error = %e,
                "Profile write failed, rolling back identity"
            );
            if let Err(rollback) = self.auth.delete_account().await {
                tracing::error!(
                    uid = %identity.uid,
                    error = %rollback,
                    "Identity rollback failed; account has no profile"
                );
            }
            self.apply(SessionState::Unauthenticated).await?;
            return Err(e);
        }

        let session = Session {
            identity,
            name: Some(name.to_string()),
        };
        self.apply(SessionState::Authenticated(session.clone())).await?;
        tracing::info!(uid = %session.identity.uid, "User registered");
        Ok(session)
    }

    /// Sign out. The local session is cleared even if the provider fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.auth.sign_out().await;
        self.apply(SessionState::Unauthenticated).await?;

        match &result {
            Ok(()) => tracing::info!("User logged out"),
            Err(e) => tracing::warn!(error = %e, "Provider sign-out failed; local session cleared"),
        }
        result
    }

    /// Hand a transition to the session task and wait until it is visible.
    async fn apply(&self, state: SessionState) -> Result<()> {
        let (applied, done) = oneshot::channel();
        self.commands
            .send(Command::Apply(Apply { state, applied }))
            .map_err(|_| anyhow::anyhow!("Session task stopped; state change dropped"))?;
        done.await
            .map_err(|_| anyhow::anyhow!("Session task stopped before applying state"))?;
        Ok(())
    }
}

async fn run_session_task(
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut provider: watch::Receiver<ProviderState>,
    store: Arc<dyn MallStore>,
    state: watch::Sender<SessionState>,
    in_flight: Arc<AtomicUsize>,
) {
    let initial = provider.borrow_and_update().clone();
    apply_provider_state(initial, store.as_ref(), &state).await;

    let mut provider_open = true;
    // A sign-in push was skipped and no call has published since
    let mut skipped = false;
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(Command::Apply(Apply { state: next, applied })) => {
                    skipped = false;
                    state.send_replace(next);
                    let _ = applied.send(());
                }
                Some(Command::Settled) => {
                    if !skipped || in_flight.load(Ordering::SeqCst) > 0 {
                        continue;
                    }
                    skipped = false;
                    tracing::debug!("Applying sign-in push left by an abandoned call");
                    let current = provider.borrow_and_update().clone();
                    apply_provider_state(current, store.as_ref(), &state).await;
                }
            },
            changed = provider.changed(), if provider_open => {
                if changed.is_err() {
                    provider_open = false;
                    continue;
                }
                let pushed = provider.borrow_and_update().clone();
                if matches!(pushed, ProviderState::SignedIn(_))
                    && in_flight.load(Ordering::SeqCst) > 0
                {
                    tracing::debug!("Sign-in push left to the in-flight call");
                    skipped = true;
                    continue;
                }
                apply_provider_state(pushed, store.as_ref(), &state).await;
            }
        }
    }

    tracing::debug!("Session task finished");
}

async fn apply_provider_state(
    pushed: ProviderState,
    store: &dyn MallStore,
    state: &watch::Sender<SessionState>,
) {
    match pushed {
        ProviderState::Pending => {}
        ProviderState::SignedOut => {
            if state.borrow().is_authenticated() {
                tracing::info!("Provider reported sign-out");
            }
            state.send_replace(SessionState::Unauthenticated);
        }
        ProviderState::SignedIn(identity) => {
            let name = match store.user_profile(&identity.uid).await {
                Ok(profile) => profile.and_then(|p| p.name),
                Err(e) => {
                    tracing::warn!(uid = %identity.uid, error = %e, "Profile lookup failed");
                    None
                }
            };
            state.send_replace(SessionState::Authenticated(Session { identity, name }));
        }
    }
}
