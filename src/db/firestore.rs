// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Shops (directory listings)
//! - Offers (read-only promotions)
//! - Categories and floors (reference data)
//! - Users (profile storage)
//! - Logs (append-only activity records)

use crate::db::{collections, LogSink, MallStore};
use crate::error::AppError;
use crate::models::{LogEntry, NewShop, Offer, ReferenceEntry, Shop, ShopFilter, UserProfile};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::DataAccess(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::DataAccess(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::DataAccess("Database not connected (offline mode)".to_string())
        })
    }

    // ─── Shop Operations ─────────────────────────────────────────

    pub async fn get_featured_shops(&self, limit: u32) -> Result<Vec<Shop>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SHOPS)
            .filter(|q| q.for_all([q.field("featured").eq(true)]))
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(store_error)
    }

    /// Query shops by exact category and/or floor.
    pub async fn get_shops(&self, filter: &ShopFilter) -> Result<Vec<Shop>, AppError> {
        let category = filter.category.clone();
        let floor = filter.floor.clone();

        // With neither predicate set `for_all` yields no filter at all.
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SHOPS)
            .filter(move |q| {
                q.for_all([
                    category
                        .as_ref()
                        .and_then(|c| q.field("category").eq(c.clone())),
                    floor.as_ref().and_then(|f| q.field("floor").eq(f.clone())),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(store_error)
    }

    pub async fn get_shop(&self, shop_id: &str) -> Result<Option<Shop>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SHOPS)
            .obj()
            .one(shop_id)
            .await
            .map_err(store_error)
    }

    /// Insert a shop under a generated document ID.
    ///
    /// `createdAt` is stamped here from this server's clock at write time,
    /// the same source the in-memory store uses.
    pub async fn insert_shop(&self, shop: &NewShop) -> Result<Shop, AppError> {
        let document = shop.clone().into_shop(String::new(), Utc::now());

        let created: Shop = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::SHOPS)
            .generate_document_id()
            .object(&document)
            .execute()
            .await
            .map_err(store_error)?;

        tracing::info!(shop_id = %created.id, owner = %created.owner_id, "Shop created");
        Ok(created)
    }

    // ─── Offer Operations ────────────────────────────────────────

    pub async fn get_current_offers(&self, now: DateTime<Utc>) -> Result<Vec<Offer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::OFFERS)
            .filter(move |q| {
                q.for_all([q
                    .field("endDate")
                    .greater_than(firestore::FirestoreTimestamp(now))])
            })
            .obj()
            .query()
            .await
            .map_err(store_error)
    }

    pub async fn get_offer(&self, offer_id: &str) -> Result<Option<Offer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::OFFERS)
            .obj()
            .one(offer_id)
            .await
            .map_err(store_error)
    }

    /// Current offers for a shop, ordered by end date.
    ///
    /// Needs a composite index on (shopId, endDate).
    pub async fn get_offers_for_shop(
        &self,
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, AppError> {
        let shop_id = shop_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::OFFERS)
            .filter(move |q| {
                q.for_all([
                    q.field("shopId").eq(shop_id.clone()),
                    q.field("endDate")
                        .greater_than(firestore::FirestoreTimestamp(now)),
                ])
            })
            .order_by([("endDate", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(store_error)
    }

    // ─── Reference Data ──────────────────────────────────────────

    /// Read every document of a reference collection (no pagination).
    pub async fn get_reference_entries(
        &self,
        collection: &str,
    ) -> Result<Vec<ReferenceEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(store_error)
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(store_error)
    }

    pub async fn upsert_user_profile(
        &self,
        uid: &str,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    // ─── Log Operations ──────────────────────────────────────────

    pub async fn insert_log(&self, entry: &LogEntry) -> Result<(), AppError> {
        let _: LogEntry = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::LOGS)
            .generate_document_id()
            .object(entry)
            .execute()
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn store_error(e: firestore::errors::FirestoreError) -> AppError {
    AppError::from_store_message(e.to_string())
}

impl MallStore for FirestoreDb {
    fn featured_shops(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Shop>, AppError>> {
        self.get_featured_shops(limit).boxed()
    }

    fn shops<'a>(&'a self, filter: &'a ShopFilter) -> BoxFuture<'a, Result<Vec<Shop>, AppError>> {
        self.get_shops(filter).boxed()
    }

    fn shop<'a>(&'a self, shop_id: &'a str) -> BoxFuture<'a, Result<Option<Shop>, AppError>> {
        self.get_shop(shop_id).boxed()
    }

    fn add_shop<'a>(&'a self, shop: &'a NewShop) -> BoxFuture<'a, Result<Shop, AppError>> {
        self.insert_shop(shop).boxed()
    }

    fn current_offers(&self, now: DateTime<Utc>) -> BoxFuture<'_, Result<Vec<Offer>, AppError>> {
        self.get_current_offers(now).boxed()
    }

    fn offer<'a>(&'a self, offer_id: &'a str) -> BoxFuture<'a, Result<Option<Offer>, AppError>> {
        self.get_offer(offer_id).boxed()
    }

    fn offers_for_shop<'a>(
        &'a self,
        shop_id: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Vec<Offer>, AppError>> {
        self.get_offers_for_shop(shop_id, now).boxed()
    }

    fn categories(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>, AppError>> {
        self.get_reference_entries(collections::CATEGORIES).boxed()
    }

    fn floors(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>, AppError>> {
        self.get_reference_entries(collections::FLOORS).boxed()
    }

    fn user_profile<'a>(
        &'a self,
        uid: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserProfile>, AppError>> {
        self.get_user_profile(uid).boxed()
    }

    fn set_user_profile<'a>(
        &'a self,
        uid: &'a str,
        profile: &'a UserProfile,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        self.upsert_user_profile(uid, profile).boxed()
    }
}

impl LogSink for FirestoreDb {
    fn append<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), AppError>> {
        self.insert_log(entry).boxed()
    }
}
