// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same query semantics as Firestore.
//!
//! Used when running without a GCP project (`MALL_STORE=memory`) and by the
//! test suite. Results are ordered by document ID, like Firestore's default.

use crate::db::{LogSink, MallStore};
use crate::error::AppError;
use crate::models::{LogEntry, NewShop, Offer, ReferenceEntry, Shop, ShopFilter, UserProfile};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// In-memory store. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shops: Arc<DashMap<String, Shop>>,
    offers: Arc<DashMap<String, Offer>>,
    categories: Arc<DashMap<String, ReferenceEntry>>,
    floors: Arc<DashMap<String, ReferenceEntry>>,
    users: Arc<DashMap<String, UserProfile>>,
    logs: Arc<DashMap<String, LogEntry>>,
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn sorted_by_id<T: Clone>(map: &DashMap<String, T>) -> Vec<(String, T)> {
    let mut entries: Vec<(String, T)> = map
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Seeding ─────────────────────────────────────────────────

    /// Insert or replace a shop under its own ID.
    pub fn put_shop(&self, shop: Shop) {
        self.shops.insert(shop.id.clone(), shop);
    }

    pub fn put_offer(&self, offer: Offer) {
        self.offers.insert(offer.id.clone(), offer);
    }

    pub fn put_category(&self, id: &str, entry: ReferenceEntry) {
        self.categories.insert(
            id.to_string(),
            ReferenceEntry {
                id: id.to_string(),
                ..entry
            },
        );
    }

    pub fn put_floor(&self, id: &str, entry: ReferenceEntry) {
        self.floors.insert(
            id.to_string(),
            ReferenceEntry {
                id: id.to_string(),
                ..entry
            },
        );
    }

    pub fn put_profile(&self, uid: &str, profile: UserProfile) {
        self.users.insert(uid.to_string(), profile);
    }

    // ─── Inspection ──────────────────────────────────────────────

    pub fn all_shops(&self) -> Vec<Shop> {
        sorted_by_id(&self.shops)
            .into_iter()
            .map(|(_, shop)| shop)
            .collect()
    }

    pub fn profile(&self, uid: &str) -> Option<UserProfile> {
        self.users.get(uid).map(|p| p.value().clone())
    }

    pub fn profile_count(&self) -> usize {
        self.users.len()
    }

    /// Log entries in no particular order.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.logs.iter().map(|e| e.value().clone()).collect()
    }

    // ─── Queries ─────────────────────────────────────────────────

    fn query_shops(&self, predicate: impl Fn(&Shop) -> bool) -> Vec<Shop> {
        sorted_by_id(&self.shops)
            .into_iter()
            .filter(|(_, shop)| predicate(shop))
            .map(|(id, shop)| Shop { id, ..shop })
            .collect()
    }

    fn query_offers(&self, predicate: impl Fn(&Offer) -> bool) -> Vec<Offer> {
        sorted_by_id(&self.offers)
            .into_iter()
            .filter(|(_, offer)| predicate(offer))
            .map(|(id, offer)| Offer { id, ..offer })
            .collect()
    }
}

impl MallStore for MemoryStore {
    fn featured_shops(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Shop>, AppError>> {
        let mut shops = self.query_shops(|shop| shop.featured);
        shops.truncate(limit as usize);
        futures_util::future::ready(Ok(shops)).boxed()
    }

    fn shops<'a>(&'a self, filter: &'a ShopFilter) -> BoxFuture<'a, Result<Vec<Shop>, AppError>> {
        let shops = self.query_shops(|shop| filter.matches(shop));
        futures_util::future::ready(Ok(shops)).boxed()
    }

    fn shop<'a>(&'a self, shop_id: &'a str) -> BoxFuture<'a, Result<Option<Shop>, AppError>> {
        let shop = self.shops.get(shop_id).map(|s| s.value().clone());
        futures_util::future::ready(Ok(shop)).boxed()
    }

    fn add_shop<'a>(&'a self, shop: &'a NewShop) -> BoxFuture<'a, Result<Shop, AppError>> {
        let created = shop.clone().into_shop(generate_id(), Utc::now());
        self.shops.insert(created.id.clone(), created.clone());
        tracing::info!(shop_id = %created.id, owner = %created.owner_id, "Shop created");
        futures_util::future::ready(Ok(created)).boxed()
    }

    fn current_offers(&self, now: DateTime<Utc>) -> BoxFuture<'_, Result<Vec<Offer>, AppError>> {
        let offers = self.query_offers(|offer| offer.is_current(now));
        futures_util::future::ready(Ok(offers)).boxed()
    }

    fn offer<'a>(&'a self, offer_id: &'a str) -> BoxFuture<'a, Result<Option<Offer>, AppError>> {
        let offer = self.offers.get(offer_id).map(|o| o.value().clone());
        futures_util::future::ready(Ok(offer)).boxed()
    }

    fn offers_for_shop<'a>(
        &'a self,
        shop_id: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Vec<Offer>, AppError>> {
        let mut offers =
            self.query_offers(|offer| offer.shop_id == shop_id && offer.is_current(now));
        offers.sort_by_key(|offer| offer.end_date);
        futures_util::future::ready(Ok(offers)).boxed()
    }

    fn categories(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>, AppError>> {
        let entries = sorted_by_id(&self.categories)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        futures_util::future::ready(Ok(entries)).boxed()
    }

    fn floors(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>, AppError>> {
        let entries = sorted_by_id(&self.floors)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        futures_util::future::ready(Ok(entries)).boxed()
    }

    fn user_profile<'a>(
        &'a self,
        uid: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserProfile>, AppError>> {
        futures_util::future::ready(Ok(self.profile(uid))).boxed()
    }

    fn set_user_profile<'a>(
        &'a self,
        uid: &'a str,
        profile: &'a UserProfile,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        self.users.insert(uid.to_string(), profile.clone());
        futures_util::future::ready(Ok(())).boxed()
    }
}

impl LogSink for MemoryStore {
    fn append<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), AppError>> {
        self.logs.insert(generate_id(), entry.clone());
        futures_util::future::ready(Ok(())).boxed()
    }
}
