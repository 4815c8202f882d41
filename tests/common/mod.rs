// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use mall_directory::config::Config;
use mall_directory::db::{FirestoreDb, LogSink, MallStore, MemoryStore};
use mall_directory::error::{AppError, Result};
use mall_directory::models::{
    Identity, LogEntry, NewShop, Offer, ReferenceEntry, Shop, ShopFilter, UserProfile,
};
use mall_directory::routes::create_router;
use mall_directory::services::{AuthProvider, ProviderState};
use mall_directory::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE WITH FAILURE INJECTION
// ═══════════════════════════════════════════════════════════════════════════

/// Store operations that can be made to fail.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FeaturedShops,
    Shops,
    Shop,
    AddShop,
    CurrentOffers,
    Offer,
    OffersForShop,
    Categories,
    Floors,
    UserProfile,
    SetUserProfile,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Data,
    MissingIndex,
}

impl Failure {
    fn error(self) -> AppError {
        match self {
            Failure::Data => AppError::DataAccess("injected failure".to_string()),
            Failure::MissingIndex => AppError::from_store_message(
                "FAILED_PRECONDITION: The query requires an index".to_string(),
            ),
        }
    }
}

/// In-memory store that counts calls, fails and stalls on request.
#[derive(Default)]
pub struct ScriptedStore {
    pub inner: MemoryStore,
    failures: DashMap<Op, Failure>,
    delays: DashMap<Op, std::time::Duration>,
    calls: DashMap<Op, usize>,
}

#[allow(dead_code)]
impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn fail(&self, op: Op, failure: Failure) {
        self.failures.insert(op, failure);
    }

    pub fn heal(&self, op: Op) {
        self.failures.remove(&op);
    }

    /// Make `op` take `delay` before answering.
    pub fn slow(&self, op: Op, delay: std::time::Duration) {
        self.delays.insert(op, delay);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.get(&op).map(|c| *c).unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Count the call and return the injected failure, if any.
    fn check(&self, op: Op) -> Option<AppError> {
        *self.calls.entry(op).or_insert(0) += 1;
        self.failures.get(&op).map(|f| f.error())
    }

    fn delayed<'a, T: Send + 'a>(
        &self,
        op: Op,
        fut: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>> {
        match self.delays.get(&op).map(|d| *d) {
            Some(delay) => async move {
                tokio::time::sleep(delay).await;
                fut.await
            }
            .boxed(),
            None => fut,
        }
    }
}

fn failed<'a, T: Send + 'a>(e: AppError) -> BoxFuture<'a, Result<T>> {
    futures_util::future::ready(Err(e)).boxed()
}

impl MallStore for ScriptedStore {
    fn featured_shops(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Shop>>> {
        match self.check(Op::FeaturedShops) {
            Some(e) => failed(e),
            None => self.delayed(Op::FeaturedShops, self.inner.featured_shops(limit)),
        }
    }

    fn shops<'a>(&'a self, filter: &'a ShopFilter) -> BoxFuture<'a, Result<Vec<Shop>>> {
        match self.check(Op::Shops) {
            Some(e) => failed(e),
            None => self.delayed(Op::Shops, self.inner.shops(filter)),
        }
    }

    fn shop<'a>(&'a self, shop_id: &'a str) -> BoxFuture<'a, Result<Option<Shop>>> {
        match self.check(Op::Shop) {
            Some(e) => failed(e),
            None => self.delayed(Op::Shop, self.inner.shop(shop_id)),
        }
    }

    fn add_shop<'a>(&'a self, shop: &'a NewShop) -> BoxFuture<'a, Result<Shop>> {
        match self.check(Op::AddShop) {
            Some(e) => failed(e),
            None => self.delayed(Op::AddShop, self.inner.add_shop(shop)),
        }
    }

    fn current_offers(&self, now: DateTime<Utc>) -> BoxFuture<'_, Result<Vec<Offer>>> {
        match self.check(Op::CurrentOffers) {
            Some(e) => failed(e),
            None => self.delayed(Op::CurrentOffers, self.inner.current_offers(now)),
        }
    }

    fn offer<'a>(&'a self, offer_id: &'a str) -> BoxFuture<'a, Result<Option<Offer>>> {
        match self.check(Op::Offer) {
            Some(e) => failed(e),
            None => self.delayed(Op::Offer, self.inner.offer(offer_id)),
        }
    }

    fn offers_for_shop<'a>(
        &'a self,
        shop_id: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Vec<Offer>>> {
        match self.check(Op::OffersForShop) {
            Some(e) => failed(e),
            None => self.delayed(Op::OffersForShop, self.inner.offers_for_shop(shop_id, now)),
        }
    }

    fn categories(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>>> {
        match self.check(Op::Categories) {
            Some(e) => failed(e),
            None => self.delayed(Op::Categories, self.inner.categories()),
        }
    }

    fn floors(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>>> {
        match self.check(Op::Floors) {
            Some(e) => failed(e),
            None => self.delayed(Op::Floors, self.inner.floors()),
        }
    }

    fn user_profile<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<Option<UserProfile>>> {
        match self.check(Op::UserProfile) {
            Some(e) => failed(e),
            None => self.delayed(Op::UserProfile, self.inner.user_profile(uid)),
        }
    }

    fn set_user_profile<'a>(
        &'a self,
        uid: &'a str,
        profile: &'a UserProfile,
    ) -> BoxFuture<'a, Result<()>> {
        match self.check(Op::SetUserProfile) {
            Some(e) => failed(e),
            None => self.delayed(Op::SetUserProfile, self.inner.set_user_profile(uid, profile)),
        }
    }
}

/// Log sink that rejects every entry.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

impl LogSink for FailingSink {
    fn append<'a>(&'a self, _entry: &'a LogEntry) -> BoxFuture<'a, Result<()>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        failed(AppError::DataAccess("log collection unavailable".to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// AUTH PROVIDER FAKE
// ═══════════════════════════════════════════════════════════════════════════

/// Password every fake account accepts.
pub const PASSWORD: &str = "secret1";

/// Scriptable provider: accounts map email to uid, pushes are explicit.
pub struct FakeAuth {
    state: watch::Sender<ProviderState>,
    accounts: DashMap<String, String>,
    pub created: AtomicUsize,
    pub deleted: AtomicUsize,
    pub fail_sign_out: AtomicBool,
    /// When set, sign-in waits for a notification before completing
    sign_in_gate: Mutex<Option<Arc<Notify>>>,
}

#[allow(dead_code)]
impl FakeAuth {
    pub fn new(initial: ProviderState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            accounts: DashMap::new(),
            created: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
            fail_sign_out: AtomicBool::new(false),
            sign_in_gate: Mutex::new(None),
        }
    }

    pub fn signed_out() -> Self {
        Self::new(ProviderState::SignedOut)
    }

    pub fn add_account(&self, email: &str, uid: &str) {
        self.accounts.insert(email.to_string(), uid.to_string());
    }

    /// Deliver an out-of-band state change.
    pub fn push(&self, state: ProviderState) {
        self.state.send_replace(state);
    }

    pub fn gate_sign_in(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.sign_in_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

pub fn identity(uid: &str, email: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(email.to_string()),
    }
}

impl AuthProvider for FakeAuth {
    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        async move {
            let gate = self.sign_in_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            let uid = self
                .accounts
                .get(email)
                .map(|uid| uid.value().clone())
                .filter(|_| password == PASSWORD)
                .ok_or(AppError::InvalidCredentials)?;
            let identity = identity(&uid, email);
            self.push(ProviderState::SignedIn(identity.clone()));
            Ok(identity)
        }
        .boxed()
    }

    fn create_account<'a>(
        &'a self,
        email: &'a str,
        _password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        async move {
            if self.accounts.contains_key(email) {
                return Err(AppError::AuthProvider("EMAIL_EXISTS".to_string()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            let uid = format!("new-uid-{}", n);
            self.add_account(email, &uid);
            let identity = identity(&uid, email);
            self.push(ProviderState::SignedIn(identity.clone()));
            Ok(identity)
        }
        .boxed()
    }

    fn delete_account(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            let uid = self
                .current_identity()
                .map(|i| i.uid)
                .ok_or(AppError::NoSession)?;
            self.accounts.retain(|_, account_uid| *account_uid != uid);
            self.deleted.fetch_add(1, Ordering::SeqCst);
            self.push(ProviderState::SignedOut);
            Ok(())
        }
        .boxed()
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AppError::AuthProvider("network unreachable".to_string()));
            }
            self.push(ProviderState::SignedOut);
            Ok(())
        }
        .boxed()
    }

    fn watch_state(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

#[allow(dead_code)]
pub fn shop(id: &str, name: &str, category: &str, floor: &str) -> Shop {
    Shop {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} description", name),
        category: category.to_string(),
        floor: floor.to_string(),
        contact: "555-0100".to_string(),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn offer(id: &str, shop_id: &str, end_date: DateTime<Utc>) -> Offer {
    Offer {
        id: id.to_string(),
        title: format!("Offer {}", id),
        description: "Limited time".to_string(),
        end_date,
        shop_id: shop_id.to_string(),
    }
}

/// Store with a few shops, offers on both sides of now, and reference data.
#[allow(dead_code)]
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now();

    store.put_shop(Shop {
        featured: true,
        has_offer: true,
        ..shop("s1", "Fresh Bites", "Food", "1")
    });
    store.put_shop(shop("s2", "Noodle Bar", "Food", "2"));
    store.put_shop(Shop {
        featured: true,
        ..shop("s3", "Threads", "Fashion", "1")
    });
    store.put_shop(shop("s4", "Page Turners", "Books", "2"));

    store.put_offer(offer("o1", "s1", now + Duration::days(3)));
    store.put_offer(offer("o2", "s1", now + Duration::days(1)));
    store.put_offer(offer("o3", "s1", now - Duration::days(1)));
    store.put_offer(offer("o4", "s3", now + Duration::days(7)));
    store.put_offer(offer("o5", "missing-shop", now + Duration::days(2)));

    store.put_category("c1", ReferenceEntry::named("Food"));
    store.put_category("c2", ReferenceEntry::named("Fashion"));
    store.put_category("c3", ReferenceEntry::default());
    store.put_floor("f1", ReferenceEntry::named("1"));
    store.put_floor("f2", ReferenceEntry::named("2"));

    store
}

/// Everything a test needs to drive and inspect the application.
#[allow(dead_code)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<ScriptedStore>,
    pub auth: Arc<FakeAuth>,
    /// Activity log entries land here
    pub logs: MemoryStore,
}

#[allow(dead_code)]
impl TestApp {
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Sign in `uid` through the provider and wait until the session has it.
    pub async fn sign_in_as(&self, uid: &str, email: &str) {
        self.auth.add_account(email, uid);
        self.state
            .views
            .handle_login(email, PASSWORD)
            .await
            .expect("login should succeed");
    }
}

#[allow(dead_code)]
pub fn test_app_with(store: MemoryStore, auth: FakeAuth) -> TestApp {
    let store = Arc::new(ScriptedStore::new(store));
    let auth = Arc::new(auth);
    let logs = MemoryStore::new();

    let state = Arc::new(AppState::compose(
        Config::test_default(),
        store.clone(),
        Arc::new(logs.clone()),
        auth.clone(),
    ));

    TestApp {
        state,
        store,
        auth,
        logs,
    }
}

/// Seeded store, nobody signed in.
#[allow(dead_code)]
pub fn test_app() -> TestApp {
    test_app_with(seeded_store(), FakeAuth::signed_out())
}
