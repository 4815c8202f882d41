// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Utc};

/// Calendar date shown on offer cards, e.g. "March 5, 2026".
pub fn format_display_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}
