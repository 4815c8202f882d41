// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Promotional offer model. Offers are managed outside this application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored offer document in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Firestore document ID
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// The offer is current while `end_date` is in the future
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub end_date: DateTime<Utc>,
    /// Document ID of the shop running the offer (not enforced)
    #[serde(default)]
    pub shop_id: String,
}

impl Offer {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.end_date > now
    }
}
