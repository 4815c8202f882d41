// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The content region: which view is on screen and the state of its slots.
//!
//! A render replaces the whole region with a new variant whose slots start
//! out `Loading`; queries then fill the slots they own. A slot is located
//! through the variant, so a result for a view that is no longer on screen
//! has nowhere to go.

use crate::models::ShopFilter;
use crate::views::model::{OfferCard, ShopCard, ShopDetail};

/// A part of a view filled after its query resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Loading,
    Ready(T),
    /// The query failed; shown as an error alert
    Failed(String),
    /// Shown as a plain message in place of results
    Notice(String),
}

impl<T> Slot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Shop list page with its filter selects.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopsView {
    /// Whether the "Add New Shop" control is shown
    pub can_add: bool,
    pub filter: ShopFilter,
    pub categories: Vec<String>,
    pub floors: Vec<String>,
    pub list: Slot<Vec<ShopCard>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentRegion {
    LoginPrompt,
    Home {
        featured: Slot<Vec<ShopCard>>,
    },
    Shops(ShopsView),
    Offers {
        offers: Slot<Vec<OfferCard>>,
    },
    ShopDetail {
        shop: ShopDetail,
        offers: Slot<Vec<OfferCard>>,
    },
    /// Offer detail; `shop` is `None` when the referenced shop is unavailable
    OfferDetail {
        offer: OfferCard,
        shop: Option<ShopDetail>,
    },
    /// A failed view, replaced by its error message
    Error {
        message: String,
    },
}

impl ContentRegion {
    pub fn shops(can_add: bool, filter: ShopFilter) -> Self {
        ContentRegion::Shops(ShopsView {
            can_add,
            filter,
            categories: Vec::new(),
            floors: Vec::new(),
            list: Slot::Loading,
        })
    }

    // ─── Slot locators ───────────────────────────────────────────

    pub fn featured_slot(&mut self) -> Option<&mut Slot<Vec<ShopCard>>> {
        match self {
            ContentRegion::Home { featured } => Some(featured),
            _ => None,
        }
    }

    pub fn shops_view(&mut self) -> Option<&mut ShopsView> {
        match self {
            ContentRegion::Shops(view) => Some(view),
            _ => None,
        }
    }

    pub fn shop_list_slot(&mut self) -> Option<&mut Slot<Vec<ShopCard>>> {
        self.shops_view().map(|view| &mut view.list)
    }

    pub fn offer_list_slot(&mut self) -> Option<&mut Slot<Vec<OfferCard>>> {
        match self {
            ContentRegion::Offers { offers } => Some(offers),
            _ => None,
        }
    }

    pub fn shop_offers_slot(&mut self) -> Option<&mut Slot<Vec<OfferCard>>> {
        match self {
            ContentRegion::ShopDetail { offers, .. } => Some(offers),
            _ => None,
        }
    }
}
