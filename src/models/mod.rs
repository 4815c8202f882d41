// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod log;
pub mod offer;
pub mod reference;
pub mod shop;
pub mod user;

pub use log::{LogEntry, LogKind};
pub use offer::Offer;
pub use reference::{ReferenceEntry, ReferenceKind};
pub use shop::{NewShop, Shop, ShopFilter, ShopFormValues};
pub use user::{Identity, Session, SessionState, UserProfile};
