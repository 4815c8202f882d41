//! Database layer (Firestore, plus an in-process store for local runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{LogEntry, NewShop, Offer, ReferenceEntry, Shop, ShopFilter, UserProfile};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

/// Collection names as constants.
pub mod collections {
    pub const SHOPS: &str = "shops";
    pub const OFFERS: &str = "offers";
    pub const CATEGORIES: &str = "categories";
    pub const FLOORS: &str = "floors";
    /// User profiles (keyed by identity uid)
    pub const USERS: &str = "users";
    pub const LOGS: &str = "logs";
}

/// Typed operations the application issues against the document store.
pub trait MallStore: Send + Sync {
    fn featured_shops(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Shop>>>;

    fn shops<'a>(&'a self, filter: &'a ShopFilter) -> BoxFuture<'a, Result<Vec<Shop>>>;

    fn shop<'a>(&'a self, shop_id: &'a str) -> BoxFuture<'a, Result<Option<Shop>>>;

    /// Write a new shop; the store assigns its ID and creation time.
    fn add_shop<'a>(&'a self, shop: &'a NewShop) -> BoxFuture<'a, Result<Shop>>;

    /// Offers ending strictly after `now`.
    fn current_offers(&self, now: DateTime<Utc>) -> BoxFuture<'_, Result<Vec<Offer>>>;

    fn offer<'a>(&'a self, offer_id: &'a str) -> BoxFuture<'a, Result<Option<Offer>>>;

    /// Current offers of one shop, soonest ending first.
    fn offers_for_shop<'a>(
        &'a self,
        shop_id: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<Vec<Offer>>>;

    fn categories(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>>>;

    fn floors(&self) -> BoxFuture<'_, Result<Vec<ReferenceEntry>>>;

    fn user_profile<'a>(&'a self, uid: &'a str) -> BoxFuture<'a, Result<Option<UserProfile>>>;

    fn set_user_profile<'a>(
        &'a self,
        uid: &'a str,
        profile: &'a UserProfile,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Destination for activity log entries.
pub trait LogSink: Send + Sync {
    fn append<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<()>>;
}
