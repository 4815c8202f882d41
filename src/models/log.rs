// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity log entry, append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded when no session is active.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Error,
}

/// Stored log document in Firestore. Never read back by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub action: String,
    /// Set only for error entries
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<LogKind>,
    pub details: serde_json::Value,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Identity uid or "anonymous"
    pub user: String,
}
