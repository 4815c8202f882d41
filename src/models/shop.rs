// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shop listing model for storage and rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored shop document in Firestore.
///
/// Fields default when absent so hand-edited documents still render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Firestore document ID
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub contact: String,
    /// Identity uid of the user who registered the shop
    #[serde(default)]
    pub owner_id: String,
    /// Shown on the home page when set
    #[serde(default)]
    pub featured: bool,
    /// Shows the "Special Offer" badge on the card
    #[serde(default)]
    pub has_offer: bool,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A shop about to be written. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShop {
    pub name: String,
    pub description: String,
    pub category: String,
    pub floor: String,
    pub contact: String,
    pub owner_id: String,
}

impl NewShop {
    /// Build the stored document with its server-assigned fields.
    pub fn into_shop(self, id: String, created_at: DateTime<Utc>) -> Shop {
        Shop {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            floor: self.floor,
            contact: self.contact,
            owner_id: self.owner_id,
            featured: false,
            has_offer: false,
            created_at: Some(created_at),
        }
    }
}

/// Values entered in the add-shop form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct ShopFormValues {
    #[validate(length(min = 1, message = "Shop name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Floor is required"))]
    pub floor: String,
    #[serde(default)]
    pub contact: String,
}

impl ShopFormValues {
    pub fn into_new_shop(self, owner_id: String) -> NewShop {
        NewShop {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            floor: self.floor,
            contact: self.contact.trim().to_string(),
            owner_id,
        }
    }
}

/// Equality filter for the shop list. Both predicates must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShopFilter {
    pub category: Option<String>,
    pub floor: Option<String>,
}

impl ShopFilter {
    /// Empty selections ("All Categories", "All Floors") mean no predicate.
    pub fn new(category: Option<String>, floor: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            category: non_empty(category),
            floor: non_empty(floor),
        }
    }

    pub fn normalized(self) -> Self {
        Self::new(self.category, self.floor)
    }

    pub fn matches(&self, shop: &Shop) -> bool {
        self.category.as_deref().is_none_or(|c| shop.category == c)
            && self.floor.as_deref().is_none_or(|f| shop.floor == f)
    }
}
