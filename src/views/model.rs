// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View-models: store documents reshaped for display.

use crate::models::{Offer, Shop, ShopFormValues};
use crate::time_utils::format_display_date;

/// Shown when a category has no image of its own.
pub const DEFAULT_IMAGE: &str = "images/default.jpg";

/// Image for a shop category: lowercased, whitespace runs become `-`.
pub fn category_image_path(category: &str) -> String {
    let slug = category
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        DEFAULT_IMAGE.to_string()
    } else {
        format!("images/{}.jpg", slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub floor: String,
    pub image_path: String,
    pub has_offer: bool,
}

impl From<&Shop> for ShopCard {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id.clone(),
            name: shop.name.clone(),
            description: shop.description.clone(),
            floor: shop.floor.clone(),
            image_path: category_image_path(&shop.category),
            has_offer: shop.has_offer,
        }
    }
}

/// Everything the shop detail view shows about a shop.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopDetail {
    pub name: String,
    pub description: String,
    pub category: String,
    pub floor: String,
    pub contact: String,
    pub image_path: String,
}

impl From<&Shop> for ShopDetail {
    fn from(shop: &Shop) -> Self {
        Self {
            name: shop.name.clone(),
            description: shop.description.clone(),
            category: shop.category.clone(),
            floor: shop.floor.clone(),
            contact: shop.contact.clone(),
            image_path: category_image_path(&shop.category),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub valid_until: String,
}

impl From<&Offer> for OfferCard {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id.clone(),
            title: offer.title.clone(),
            description: offer.description.clone(),
            valid_until: format_display_date(offer.end_date),
        }
    }
}

/// State of the add-shop form, rendered as part of the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddShopForm {
    pub open: bool,
    pub values: ShopFormValues,
    pub categories: Vec<String>,
    pub floors: Vec<String>,
    /// Message from the last failed submission
    pub error: Option<String>,
}

impl AddShopForm {
    /// Close and clear entered values. Loaded options are kept.
    pub fn reset(&mut self) {
        self.open = false;
        self.values = ShopFormValues::default();
        self.error = None;
    }
}
