// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle tests.
//!
//! These tests verify that:
//! 1. The initial auth check distinguishes "signed out" from a session
//! 2. Login/registration/logout publish the right session state
//! 3. Registration never leaves an identity without a profile
//! 4. Provider pushes and imperative calls settle on the last delivered one

use mall_directory::error::AppError;
use mall_directory::models::{SessionState, UserProfile};
use mall_directory::services::{AuthProvider, ProviderState};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{identity, seeded_store, test_app, test_app_with, FakeAuth, Failure, Op, PASSWORD};

fn profile(name: &str) -> UserProfile {
    UserProfile::new_user(name, "ann@example.com", chrono::Utc::now())
}

/// Wait until the published session satisfies `pred`.
async fn wait_for_session(
    app: &common::TestApp,
    pred: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let mut rx = app.state.session.subscribe();
    let state = rx.wait_for(pred).await.expect("session task alive");
    state.clone()
}

// ═══════════════════════════════════════════════════════════════════════════
// INITIAL AUTH STATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_check_auth_state_without_identity_fails() {
    let app = test_app();

    let err = app.state.session.check_auth_state().await.unwrap_err();
    assert!(matches!(err, AppError::NoSession));
    assert_eq!(app.state.session.snapshot(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_check_auth_state_merges_profile_name() {
    let store = seeded_store();
    store.put_profile("uid-ann", profile("Ann"));
    let app = test_app_with(
        store,
        FakeAuth::new(ProviderState::SignedIn(identity("uid-ann", "ann@example.com"))),
    );

    let resolved = app.state.session.check_auth_state().await.unwrap();
    assert_eq!(resolved.uid, "uid-ann");

    let session = app.state.session.current_session().unwrap();
    assert_eq!(session.name.as_deref(), Some("Ann"));
    assert_eq!(session.display_name(), "Ann");
}

#[tokio::test]
async fn test_check_auth_state_waits_for_first_notification() {
    let app = test_app_with(seeded_store(), FakeAuth::new(ProviderState::Pending));

    let session = Arc::clone(&app.state.session);
    let check = tokio::spawn(async move { session.check_auth_state().await });

    tokio::task::yield_now().await;
    assert!(!check.is_finished());

    app.auth
        .push(ProviderState::SignedIn(identity("uid-bob", "bob@example.com")));
    let resolved = check.await.unwrap().unwrap();
    assert_eq!(resolved.uid, "uid-bob");

    // No profile document: session without a name
    let session = app.state.session.current_session().unwrap();
    assert_eq!(session.name, None);
    assert_eq!(session.display_name(), "bob@example.com");
}

// ═══════════════════════════════════════════════════════════════════════════
// LOGIN / LOGOUT
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_failed_login_leaves_session_unchanged() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;
    let before = app.state.session.snapshot();

    let err = app
        .state
        .session
        .login("ann@example.com", "wrong password")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidCredentials));
    assert_eq!(app.state.session.snapshot(), before);
}

#[tokio::test]
async fn test_login_survives_profile_read_failure() {
    let app = test_app();
    app.auth.add_account("ann@example.com", "uid-ann");
    app.store.fail(Op::UserProfile, Failure::Data);

    let session = app
        .state
        .session
        .login("ann@example.com", PASSWORD)
        .await
        .unwrap();

    assert_eq!(session.identity.uid, "uid-ann");
    assert_eq!(session.name, None);
    assert!(app.state.session.snapshot().is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_provider_fails() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;
    app.auth.fail_sign_out.store(true, Ordering::SeqCst);

    let err = app.state.session.logout().await.unwrap_err();

    assert!(matches!(err, AppError::AuthProvider(_)));
    assert_eq!(app.state.session.snapshot(), SessionState::Unauthenticated);
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTRATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_register_creates_one_identity_and_one_profile() {
    let app = test_app();

    let session = app
        .state
        .session
        .register("Cara", "cara@example.com", PASSWORD)
        .await
        .unwrap();

    assert_eq!(app.auth.created.load(Ordering::SeqCst), 1);
    assert_eq!(app.store.inner.profile_count(), 1);
    assert_eq!(app.store.calls(Op::SetUserProfile), 1);

    let stored = app.store.inner.profile(&session.identity.uid).unwrap();
    assert_eq!(stored.name.as_deref(), Some("Cara"));
    assert_eq!(stored.email.as_deref(), Some("cara@example.com"));
    assert_eq!(stored.role.as_deref(), Some("user"));
    assert!(stored.created_at.is_some());

    let current = app.state.session.current_session().unwrap();
    assert_eq!(current.identity.uid, session.identity.uid);
    assert_eq!(current.name.as_deref(), Some("Cara"));
}

#[tokio::test]
async fn test_register_never_publishes_session_before_profile() {
    let app = test_app();
    let mut rx = app.state.session.subscribe();
    let store = Arc::clone(&app.store);

    // Record how many profiles existed whenever an authenticated state appears
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            if rx.borrow_and_update().is_authenticated() {
                seen.push(store.inner.profile_count());
                break;
            }
        }
        seen
    });

    app.state
        .session
        .register("Cara", "cara@example.com", PASSWORD)
        .await
        .unwrap();

    let seen = observer.await.unwrap();
    assert_eq!(seen, vec![1]);
}

#[tokio::test]
async fn test_register_rolls_back_identity_when_profile_write_fails() {
    let app = test_app();
    app.store.fail(Op::SetUserProfile, Failure::Data);

    let err = app
        .state
        .session
        .register("Cara", "cara@example.com", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DataAccess(_)));
    assert_eq!(app.auth.created.load(Ordering::SeqCst), 1);
    assert_eq!(app.auth.deleted.load(Ordering::SeqCst), 1);
    assert_eq!(app.store.inner.profile_count(), 0);
    assert_eq!(app.state.session.snapshot(), SessionState::Unauthenticated);
    assert_eq!(app.auth.current_identity(), None);
}

// ═══════════════════════════════════════════════════════════════════════════
// PROVIDER PUSHES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_sign_in_push_creates_session_with_profile_name() {
    let store = seeded_store();
    store.put_profile("uid-dan", profile("Dan"));
    let app = test_app_with(store, FakeAuth::signed_out());

    app.auth
        .push(ProviderState::SignedIn(identity("uid-dan", "dan@example.com")));

    let state = wait_for_session(&app, |s| s.is_authenticated()).await;
    assert_eq!(state.uid(), Some("uid-dan"));
    assert_eq!(state.session().unwrap().name.as_deref(), Some("Dan"));
}

#[tokio::test]
async fn test_sign_out_push_clears_session() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;

    app.auth.push(ProviderState::SignedOut);

    let state = wait_for_session(&app, |s| !s.is_authenticated()).await;
    assert_eq!(state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_completing_after_sign_out_push_wins() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;
    app.auth.add_account("bob@example.com", "uid-bob");
    let gate = app.auth.gate_sign_in();

    let session = Arc::clone(&app.state.session);
    let login = tokio::spawn(async move { session.login("bob@example.com", PASSWORD).await });

    // Sign-out from elsewhere arrives while the login is in flight
    app.auth.push(ProviderState::SignedOut);
    wait_for_session(&app, |s| !s.is_authenticated()).await;

    gate.notify_one();
    login.await.unwrap().unwrap();

    assert_eq!(app.state.session.snapshot().uid(), Some("uid-bob"));
}

#[tokio::test]
async fn test_sign_out_push_after_login_wins() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;
    assert!(app.state.session.snapshot().is_authenticated());

    app.auth.push(ProviderState::SignedOut);

    let state = wait_for_session(&app, |s| !s.is_authenticated()).await;
    assert_eq!(state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_cancelled_login_still_follows_provider() {
    let app = test_app();
    app.auth.add_account("ann@example.com", "uid-ann");
    app.store.slow(Op::UserProfile, Duration::from_millis(200));

    let session = Arc::clone(&app.state.session);
    let login = tokio::spawn(async move { session.login("ann@example.com", PASSWORD).await });

    // The provider has signed in; the login is still reading the profile
    let mut provider = app.auth.watch_state();
    provider
        .wait_for(|s| matches!(s, ProviderState::SignedIn(_)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    login.abort();

    let state = tokio::time::timeout(
        Duration::from_secs(2),
        wait_for_session(&app, |s| s.is_authenticated()),
    )
    .await
    .expect("session follows the provider");
    assert_eq!(state.uid(), Some("uid-ann"));
}

#[tokio::test]
async fn test_completed_login_is_not_reapplied() {
    let app = test_app();
    app.sign_in_as("uid-ann", "ann@example.com").await;

    // A later sign-out must not be overwritten by the earlier push
    app.auth.push(ProviderState::SignedOut);
    wait_for_session(&app, |s| !s.is_authenticated()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(app.state.session.snapshot(), SessionState::Unauthenticated);
}
