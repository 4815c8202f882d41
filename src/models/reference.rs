// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Category and floor reference documents.

use serde::{Deserialize, Serialize};

/// A category or floor document. Only the name is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    /// Missing in malformed documents; such entries are skipped.
    #[serde(default)]
    pub name: Option<String>,
}

impl ReferenceEntry {
    pub fn named(name: &str) -> Self {
        Self {
            id: String::new(),
            name: Some(name.to_string()),
        }
    }

    /// The usable display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Which reference collection to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Category,
    Floor,
}

impl ReferenceKind {
    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::Category => "categories",
            ReferenceKind::Floor => "floors",
        }
    }
}

/// Collect display names, skipping malformed entries.
pub fn display_names(entries: &[ReferenceEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.display_name();
            if name.is_none() {
                tracing::warn!(id = %entry.id, "Reference entry missing name field");
            }
            name.map(str::to_string)
        })
        .collect()
}
