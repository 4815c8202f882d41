// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rendering: view-models in, HTML out, through askama templates.
//!
//! Controls carry htmx attributes; each one targets an HTTP endpoint whose
//! response replaces the content region or one of its slots.

use askama::Template;
use askama_web::WebTemplate;

use crate::error::Result;
use crate::models::{SessionState, ShopFormValues};
use crate::views::model::{AddShopForm, OfferCard, ShopCard, ShopDetail, DEFAULT_IMAGE};
use crate::views::region::{ContentRegion, ShopsView, Slot};

pub const APP_TITLE: &str = "Super Mall";
const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4";

/// User-visible texts.
pub mod messages {
    pub const NO_FEATURED_SHOPS: &str = "No featured shops available.";
    pub const NO_SHOPS: &str = "No shops found matching your criteria.";
    pub const NO_OFFERS: &str = "No current offers available.";
    pub const INDEX_BUILDING: &str =
        "Please wait while we set up the offers display. This may take a few minutes.";
    pub const SHOP_UNAVAILABLE: &str = "Shop information unavailable.";
    pub const ALL_CATEGORIES: &str = "All Categories";
    pub const ALL_FLOORS: &str = "All Floors";
    pub const SELECT_CATEGORY: &str = "Select Category";
    pub const SELECT_FLOOR: &str = "Select Floor";
}

/// One `<option>` of a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Options for a select: the default ("all") option, then one per name.
pub fn select_options(
    default_label: &str,
    names: &[String],
    selected: Option<&str>,
) -> Vec<SelectOption> {
    let default = SelectOption {
        value: String::new(),
        label: default_label.to_string(),
        selected: false,
    };
    std::iter::once(default)
        .chain(names.iter().map(|name| SelectOption {
            value: name.clone(),
            label: name.clone(),
            selected: selected == Some(name.as_str()),
        }))
        .collect()
}

// ─── Templates ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "fragments/shop_cards.html")]
struct ShopCardsTemplate<'a> {
    slot: &'a Slot<Vec<ShopCard>>,
    empty: &'a str,
    default_image: &'a str,
}

#[derive(Template)]
#[template(path = "fragments/offer_cards.html")]
struct OfferCardsTemplate<'a> {
    slot: &'a Slot<Vec<OfferCard>>,
    empty: &'a str,
}

#[derive(Template)]
#[template(path = "fragments/add_shop_form.html")]
struct AddShopFormTemplate<'a> {
    values: &'a ShopFormValues,
    error: Option<&'a str>,
    categories: Vec<SelectOption>,
    floors: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "views/login_prompt.html")]
struct LoginPromptTemplate<'a> {
    title: &'a str,
}

#[derive(Template)]
#[template(path = "views/home.html")]
struct HomeTemplate<'a> {
    title: &'a str,
    featured_html: String,
}

#[derive(Template)]
#[template(path = "views/shops.html")]
struct ShopsTemplate {
    can_add: bool,
    categories: Vec<SelectOption>,
    floors: Vec<SelectOption>,
    list_html: String,
}

#[derive(Template)]
#[template(path = "views/offers.html")]
struct OffersTemplate {
    offers_html: String,
}

#[derive(Template)]
#[template(path = "views/shop_detail.html")]
struct ShopDetailTemplate<'a> {
    shop: &'a ShopDetail,
    default_image: &'a str,
    offers_html: String,
}

#[derive(Template)]
#[template(path = "views/offer_detail.html")]
struct OfferDetailTemplate<'a> {
    offer: &'a OfferCard,
    shop: Option<&'a ShopDetail>,
    unavailable: &'a str,
}

#[derive(Template)]
#[template(path = "views/error.html")]
struct ErrorTemplate<'a> {
    message: &'a str,
}

/// Complete document: navigation, auth area, content region and forms.
#[derive(Template, WebTemplate)]
#[template(path = "page.html")]
pub struct PageTemplate {
    title: &'static str,
    htmx_src: &'static str,
    user_name: Option<String>,
    content_html: String,
    show_auth_forms: bool,
    form_html: Option<String>,
}

// ─── Fragments ───────────────────────────────────────────────────

/// Cards for a shop slot, or the empty-state message.
pub fn shop_cards(slot: &Slot<Vec<ShopCard>>, empty: &str) -> Result<String> {
    let template = ShopCardsTemplate {
        slot,
        empty,
        default_image: DEFAULT_IMAGE,
    };
    Ok(template.render()?)
}

pub fn offer_cards(slot: &Slot<Vec<OfferCard>>) -> Result<String> {
    let template = OfferCardsTemplate {
        slot,
        empty: messages::NO_OFFERS,
    };
    Ok(template.render()?)
}

/// The shop list slot of `region`; empty when the shop list is not shown.
pub fn shop_list(region: &ContentRegion) -> Result<String> {
    match region {
        ContentRegion::Shops(view) => shop_cards(&view.list, messages::NO_SHOPS),
        _ => Ok(String::new()),
    }
}

pub fn add_shop_form(form: &AddShopForm) -> Result<String> {
    let template = AddShopFormTemplate {
        values: &form.values,
        error: form.error.as_deref(),
        categories: select_options(
            messages::SELECT_CATEGORY,
            &form.categories,
            Some(form.values.category.as_str()),
        ),
        floors: select_options(
            messages::SELECT_FLOOR,
            &form.floors,
            Some(form.values.floor.as_str()),
        ),
    };
    Ok(template.render()?)
}

// ─── Views ───────────────────────────────────────────────────────

fn shops(view: &ShopsView) -> Result<String> {
    let template = ShopsTemplate {
        can_add: view.can_add,
        categories: select_options(
            messages::ALL_CATEGORIES,
            &view.categories,
            view.filter.category.as_deref(),
        ),
        floors: select_options(
            messages::ALL_FLOORS,
            &view.floors,
            view.filter.floor.as_deref(),
        ),
        list_html: shop_cards(&view.list, messages::NO_SHOPS)?,
    };
    Ok(template.render()?)
}

/// Markup for the content region.
pub fn region(region: &ContentRegion) -> Result<String> {
    let html = match region {
        ContentRegion::LoginPrompt => LoginPromptTemplate { title: APP_TITLE }.render()?,
        ContentRegion::Home { featured } => HomeTemplate {
            title: APP_TITLE,
            featured_html: shop_cards(featured, messages::NO_FEATURED_SHOPS)?,
        }
        .render()?,
        ContentRegion::Shops(view) => shops(view)?,
        ContentRegion::Offers { offers } => OffersTemplate {
            offers_html: offer_cards(offers)?,
        }
        .render()?,
        ContentRegion::ShopDetail { shop, offers } => ShopDetailTemplate {
            shop,
            default_image: DEFAULT_IMAGE,
            offers_html: offer_cards(offers)?,
        }
        .render()?,
        ContentRegion::OfferDetail { offer, shop } => OfferDetailTemplate {
            offer,
            shop: shop.as_ref(),
            unavailable: messages::SHOP_UNAVAILABLE,
        }
        .render()?,
        ContentRegion::Error { message } => ErrorTemplate { message }.render()?,
    };
    Ok(html)
}

pub fn page(
    session: &SessionState,
    content: &ContentRegion,
    form: &AddShopForm,
) -> Result<PageTemplate> {
    let session = session.session();
    let form_html = match session {
        Some(_) if form.open => Some(add_shop_form(form)?),
        _ => None,
    };

    Ok(PageTemplate {
        title: APP_TITLE,
        htmx_src: HTMX_SRC,
        user_name: session.map(|s| s.display_name().to_string()),
        content_html: region(content)?,
        show_auth_forms: session.is_none(),
        form_html,
    })
}
