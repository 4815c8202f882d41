// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Views: view-models, the content region, templates and the controller.

pub mod controller;
pub mod model;
pub mod region;
pub mod render;

pub use controller::{FilterScope, ViewController, FEATURED_LIMIT};
pub use model::AddShopForm;
pub use region::{ContentRegion, ShopsView, Slot};
