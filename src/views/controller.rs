// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View controller: owns the content region and the add-shop form.
//!
//! Every render first replaces the whole region with a view whose slots are
//! loading, then fills them as queries resolve. A slot that has disappeared
//! in the meantime (the user moved to another view) is left alone. Results are not tied to
//! the render that asked for them, so re-entering a view before an older
//! query finishes can show the older result.
//!
//! Failed queries never escape as panics: they are recorded through the
//! activity log and replaced by a visible message. Operations still return
//! the error so callers can report it.

use crate::db::MallStore;
use crate::error::{AppError, Result};
use crate::models::reference::display_names;
use crate::models::{
    Offer, ReferenceEntry, ReferenceKind, Session, Shop, ShopFilter, ShopFormValues,
};
use crate::services::{ActivityLogger, SessionManager};
use crate::views::model::{AddShopForm, OfferCard, ShopCard, ShopDetail};
use crate::views::region::{ContentRegion, Slot};
use crate::views::render::{self, messages, PageTemplate};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use validator::Validate;

/// Number of shops on the home page.
pub const FEATURED_LIMIT: u32 = 6;

/// Which pair of selects a reference list is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Filters above the shop list
    Page,
    AddShopForm,
}

pub struct ViewController {
    store: Arc<dyn MallStore>,
    session: Arc<SessionManager>,
    logger: ActivityLogger,
    content: watch::Sender<ContentRegion>,
    form: watch::Sender<AddShopForm>,
}

impl ViewController {
    pub fn new(
        store: Arc<dyn MallStore>,
        session: Arc<SessionManager>,
        logger: ActivityLogger,
    ) -> Self {
        let (content, _) = watch::channel(ContentRegion::LoginPrompt);
        let (form, _) = watch::channel(AddShopForm::default());
        Self {
            store,
            session,
            logger,
            content,
            form,
        }
    }

    // ─── Snapshots ───────────────────────────────────────────────

    /// Current content region.
    pub fn content(&self) -> ContentRegion {
        self.content.borrow().clone()
    }

    /// Current content region as HTML.
    pub fn content_html(&self) -> Result<String> {
        render::region(&self.content.borrow())
    }

    /// Current shop list slot as HTML; empty when the list is not shown.
    pub fn shop_list_html(&self) -> Result<String> {
        render::shop_list(&self.content.borrow())
    }

    pub fn subscribe_content(&self) -> watch::Receiver<ContentRegion> {
        self.content.subscribe()
    }

    pub fn form(&self) -> AddShopForm {
        self.form.borrow().clone()
    }

    /// Full document for the current state.
    pub fn page(&self) -> Result<PageTemplate> {
        let session = self.session.snapshot();
        render::page(&session, &self.content.borrow(), &self.form.borrow())
    }

    fn replace_content(&self, region: ContentRegion) {
        self.content.send_replace(region);
    }

    /// Fill the slot `locate` finds, if it is still on screen. Returns
    /// whether it was.
    fn fill_slot<T, F>(&self, name: &str, locate: F, value: Slot<T>) -> bool
    where
        F: FnOnce(&mut ContentRegion) -> Option<&mut Slot<T>>,
    {
        let filled = self
            .content
            .send_if_modified(|region| match locate(region) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            });
        if !filled {
            tracing::debug!(slot = name, "Slot no longer present; result discarded");
        }
        filled
    }

    /// Record a failure and show `fallback` in the located slot.
    fn fail_slot<T, F>(
        &self,
        action: &str,
        name: &str,
        locate: F,
        fallback: &str,
        error: AppError,
    ) -> AppError
    where
        F: FnOnce(&mut ContentRegion) -> Option<&mut Slot<T>>,
    {
        self.logger.record_error(action, &error);
        self.fill_slot(name, locate, Slot::Failed(fallback.to_string()));
        error
    }

    // ─── Views ───────────────────────────────────────────────────

    pub async fn render_home(&self) -> Result<()> {
        self.replace_content(ContentRegion::Home {
            featured: Slot::Loading,
        });

        match self.store.featured_shops(FEATURED_LIMIT).await {
            Ok(shops) => {
                let cards = shops.iter().map(ShopCard::from).collect();
                self.fill_slot(
                    "featuredShops",
                    ContentRegion::featured_slot,
                    Slot::Ready(cards),
                );
                Ok(())
            }
            Err(e) => Err(self.fail_slot(
                "Error loading featured shops",
                "featuredShops",
                ContentRegion::featured_slot,
                "Unable to load featured shops.",
                e,
            )),
        }
    }

    /// Shop list with filters. Filter options load first, one after the
    /// other; their failures leave only the default option.
    pub async fn render_shops(&self, filter: ShopFilter) -> Result<()> {
        let filter = filter.normalized();
        let can_add = self.session.current_session().is_some();
        self.replace_content(ContentRegion::shops(can_add, filter.clone()));

        let _ = self.load_categories(FilterScope::Page).await;
        let _ = self.load_floors(FilterScope::Page).await;

        self.load_shop_list(&filter).await
    }

    /// Re-query the shop list only, keeping the rest of the page.
    pub async fn filter_shops(&self, filter: ShopFilter) -> Result<()> {
        self.load_shop_list(&filter.normalized()).await
    }

    async fn load_shop_list(&self, filter: &ShopFilter) -> Result<()> {
        match self.store.shops(filter).await {
            Ok(shops) => {
                tracing::debug!(
                    count = shops.len(),
                    category = ?filter.category,
                    floor = ?filter.floor,
                    "Shops loaded"
                );
                let cards = shops.iter().map(ShopCard::from).collect();
                self.fill_slot("shopsList", ContentRegion::shop_list_slot, Slot::Ready(cards));
                Ok(())
            }
            Err(e) => Err(self.fail_slot(
                "Error loading shops list",
                "shopsList",
                ContentRegion::shop_list_slot,
                "Unable to load shops.",
                e,
            )),
        }
    }

    pub async fn render_offers(&self) -> Result<()> {
        self.replace_content(ContentRegion::Offers {
            offers: Slot::Loading,
        });

        match self.store.current_offers(Utc::now()).await {
            Ok(offers) => {
                let cards = offers.iter().map(OfferCard::from).collect();
                self.fill_slot("offerList", ContentRegion::offer_list_slot, Slot::Ready(cards));
                Ok(())
            }
            Err(e) => Err(self.fail_slot(
                "Error loading current offers",
                "offerList",
                ContentRegion::offer_list_slot,
                "Unable to load offers.",
                e,
            )),
        }
    }

    pub async fn render_shop_detail(&self, shop_id: &str) -> Result<()> {
        let shop = match self.store.shop(shop_id).await {
            Ok(Some(shop)) => shop,
            Ok(None) => {
                return Err(self.fail_view(
                    "Error viewing shop details",
                    "Error loading shop details",
                    AppError::NotFound("Shop".to_string()),
                ))
            }
            Err(e) => {
                return Err(self.fail_view(
                    "Error viewing shop details",
                    "Error loading shop details",
                    e,
                ))
            }
        };

        self.replace_content(ContentRegion::ShopDetail {
            shop: ShopDetail::from(&shop),
            offers: Slot::Loading,
        });
        self.load_shop_offers(shop_id).await
    }

    async fn load_shop_offers(&self, shop_id: &str) -> Result<()> {
        match self.store.offers_for_shop(shop_id, Utc::now()).await {
            Ok(offers) => {
                let cards = offers.iter().map(OfferCard::from).collect();
                self.fill_slot("shopOffers", ContentRegion::shop_offers_slot, Slot::Ready(cards));
                Ok(())
            }
            Err(e @ AppError::MissingIndex(_)) => {
                tracing::warn!(shop_id, error = %e, "Offers index not ready");
                self.logger.record_error("Error loading shop offers", &e);
                self.fill_slot(
                    "shopOffers",
                    ContentRegion::shop_offers_slot,
                    Slot::Notice(messages::INDEX_BUILDING.to_string()),
                );
                Err(e)
            }
            Err(e) => Err(self.fail_slot(
                "Error loading shop offers",
                "shopOffers",
                ContentRegion::shop_offers_slot,
                "Unable to load offers for this shop.",
                e,
            )),
        }
    }

    pub async fn render_offer_detail(&self, offer_id: &str) -> Result<()> {
        let offer = match self.store.offer(offer_id).await {
            Ok(Some(offer)) => offer,
            Ok(None) => {
                return Err(self.fail_view(
                    "Error viewing offer details",
                    "Error loading offer details",
                    AppError::NotFound("Offer".to_string()),
                ))
            }
            Err(e) => {
                return Err(self.fail_view(
                    "Error viewing offer details",
                    "Error loading offer details",
                    e,
                ))
            }
        };

        let shop = self.offer_shop(&offer).await;
        self.replace_content(ContentRegion::OfferDetail {
            offer: OfferCard::from(&offer),
            shop: shop.as_ref().map(ShopDetail::from),
        });
        Ok(())
    }

    /// The shop an offer points at, if it can be found.
    async fn offer_shop(&self, offer: &Offer) -> Option<Shop> {
        if offer.shop_id.is_empty() {
            tracing::warn!(offer_id = %offer.id, "Offer has no shop reference");
            return None;
        }
        match self.store.shop(&offer.shop_id).await {
            Ok(Some(shop)) => Some(shop),
            Ok(None) => {
                tracing::warn!(
                    offer_id = %offer.id,
                    shop_id = %offer.shop_id,
                    "Offer references missing shop"
                );
                None
            }
            Err(e) => {
                self.logger.record_error("Error loading offer shop", &e);
                None
            }
        }
    }

    /// Record a failure and replace the whole region with an error message.
    fn fail_view(&self, action: &str, prefix: &str, error: AppError) -> AppError {
        self.logger.record_error(action, &error);
        self.replace_content(ContentRegion::Error {
            message: format!("{}: {}", prefix, error),
        });
        error
    }

    /// Signed-out landing view.
    pub fn render_login_prompt(&self) {
        self.replace_content(ContentRegion::LoginPrompt);
    }

    // ─── Reference data ──────────────────────────────────────────

    /// Populate the category select of `scope`. Returns the option count.
    pub async fn load_categories(&self, scope: FilterScope) -> Result<usize> {
        let result = self.store.categories().await;
        self.apply_reference(scope, ReferenceKind::Category, result)
    }

    pub async fn load_floors(&self, scope: FilterScope) -> Result<usize> {
        let result = self.store.floors().await;
        self.apply_reference(scope, ReferenceKind::Floor, result)
    }

    fn apply_reference(
        &self,
        scope: FilterScope,
        kind: ReferenceKind,
        result: Result<Vec<ReferenceEntry>>,
    ) -> Result<usize> {
        let names = match result {
            Ok(entries) => display_names(&entries),
            Err(e) => {
                let action = match scope {
                    FilterScope::Page => format!("Error loading {}", kind.label()),
                    FilterScope::AddShopForm => format!("Error loading {} for form", kind.label()),
                };
                self.logger.record_error(&action, &e);
                return Err(e);
            }
        };
        if names.is_empty() {
            tracing::debug!(kind = kind.label(), "No reference entries available");
        }

        match scope {
            FilterScope::Page => {
                let shown = self.content.send_if_modified(|region| {
                    let Some(view) = region.shops_view() else {
                        return false;
                    };
                    match kind {
                        ReferenceKind::Category => view.categories = names.clone(),
                        ReferenceKind::Floor => view.floors = names.clone(),
                    }
                    true
                });
                if !shown {
                    tracing::debug!(
                        kind = kind.label(),
                        "Filters no longer present; options discarded"
                    );
                }
            }
            FilterScope::AddShopForm => {
                self.form.send_modify(|form| match kind {
                    ReferenceKind::Category => form.categories = names.clone(),
                    ReferenceKind::Floor => form.floors = names.clone(),
                });
            }
        }
        Ok(names.len())
    }

    // ─── Add-shop form ───────────────────────────────────────────

    /// Load the form's selects, then open it. Load failures still open it.
    pub async fn open_add_shop_form(&self) {
        let categories = self.load_categories(FilterScope::AddShopForm).await;
        let floors = self.load_floors(FilterScope::AddShopForm).await;
        if categories.is_err() || floors.is_err() {
            tracing::warn!("Add-shop form opened with incomplete options");
        }
        self.form.send_modify(|form| form.open = true);
    }

    /// Create a shop owned by the current user.
    ///
    /// On success the form is closed and reset and the shop list shown
    /// again. On failure the form stays open with the entered values and
    /// the error message.
    pub async fn submit_add_shop(&self, values: ShopFormValues) -> Result<Shop> {
        match self.add_shop(values.clone()).await {
            Ok(shop) => {
                self.form.send_modify(AddShopForm::reset);
                if let Err(e) = self.render_shops(ShopFilter::default()).await {
                    tracing::warn!(error = %e, "Shop list refresh after add failed");
                }
                self.logger
                    .record("Shop added successfully", json!({ "shopId": shop.id }));
                Ok(shop)
            }
            Err(e) => {
                self.logger.record_error("Error adding shop", &e);
                let message = e.to_string();
                self.form.send_modify(|form| {
                    form.open = true;
                    form.values = values;
                    form.error = Some(message);
                });
                Err(e)
            }
        }
    }

    async fn add_shop(&self, values: ShopFormValues) -> Result<Shop> {
        let session = self
            .session
            .current_session()
            .ok_or(AppError::AuthenticationRequired)?;
        values.validate()?;

        let new_shop = values.into_new_shop(session.identity.uid);
        self.store.add_shop(&new_shop).await
    }

    // ─── Auth controls ───────────────────────────────────────────

    /// Resolve the initial auth state and show home or the login prompt.
    pub async fn start(&self) {
        match self.session.check_auth_state().await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "Resumed session");
                let _ = self.render_home().await;
            }
            Err(AppError::NoSession) => self.render_login_prompt(),
            Err(e) => {
                self.logger.record_error("Error checking auth state", &e);
                self.render_login_prompt();
            }
        }
    }

    pub async fn handle_login(&self, email: &str, password: &str) -> Result<Session> {
        match self.session.login(email, password).await {
            Ok(session) => {
                self.logger.record("User logged in", json!({ "email": email }));
                let _ = self.render_home().await;
                Ok(session)
            }
            Err(e) => {
                self.logger.record_error("Login failed", &e);
                Err(e)
            }
        }
    }

    pub async fn handle_register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        match self.session.register(name, email, password).await {
            Ok(session) => {
                self.logger
                    .record("User registered", json!({ "email": email }));
                let _ = self.render_home().await;
                Ok(session)
            }
            Err(e) => {
                self.logger.record_error("Registration failed", &e);
                Err(e)
            }
        }
    }

    /// Sign out. The view switches to the login prompt even if the
    /// provider reports an error, since the local session is gone.
    pub async fn handle_logout(&self) -> Result<()> {
        let result = self.session.logout().await;
        self.form.send_modify(AddShopForm::reset);
        self.render_login_prompt();
        match &result {
            Ok(()) => self.logger.record("User logged out", json!({})),
            Err(e) => self.logger.record_error("Logout failed", e),
        }
        result
    }
}
