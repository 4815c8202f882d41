// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View and add-shop routes.
//!
//! View endpoints answer with markup for the content region (or one of its
//! slots). A failed view still answers with its fallback markup, under the
//! error's status code.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ShopFilter, ShopFormValues};
use crate::views::render::PageTemplate;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/content", get(content))
        .route("/views/home", get(home))
        .route("/views/shops", get(shops))
        .route("/views/shops/list", get(shops_list))
        .route("/views/shops/{id}", get(shop_detail))
        .route("/views/offers", get(offers))
        .route("/views/offers/{id}", get(offer_detail))
        .route("/forms/add-shop", get(open_add_shop_form))
        .route("/shops", post(add_shop))
}

/// Filter selects submit empty strings for "all".
#[derive(Debug, Default, Deserialize)]
struct FilterParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    floor: Option<String>,
}

impl From<FilterParams> for ShopFilter {
    fn from(params: FilterParams) -> Self {
        ShopFilter::new(params.category, params.floor)
    }
}

#[derive(Serialize)]
struct ShopCreated {
    id: String,
}

/// Tells htmx to reload the page after a form action.
pub(crate) const HX_REFRESH: (&str, &str) = ("HX-Refresh", "true");

fn status_of(result: &Result<()>) -> StatusCode {
    match result {
        Ok(()) => StatusCode::OK,
        Err(e) => e.status(),
    }
}

/// Answer with rendered markup under the status of `result`.
fn html_response(result: Result<()>, html: Result<String>) -> Response {
    match html {
        Ok(html) => (status_of(&result), Html(html)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Answer with the whole content region.
fn content_response(state: &AppState, result: Result<()>) -> Response {
    html_response(result, state.views.content_html())
}

async fn index(State(state): State<Arc<AppState>>) -> Result<PageTemplate> {
    state.views.page()
}

async fn content(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    Ok(Html(state.views.content_html()?))
}

async fn home(State(state): State<Arc<AppState>>) -> Response {
    let result = state.views.render_home().await;
    content_response(&state, result)
}

async fn shops(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Response {
    let result = state.views.render_shops(params.into()).await;
    content_response(&state, result)
}

async fn shops_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Response {
    let result = state.views.filter_shops(params.into()).await;
    html_response(result, state.views.shop_list_html())
}

async fn shop_detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let result = state.views.render_shop_detail(&id).await;
    content_response(&state, result)
}

async fn offers(State(state): State<Arc<AppState>>) -> Response {
    let result = state.views.render_offers().await;
    content_response(&state, result)
}

async fn offer_detail(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let result = state.views.render_offer_detail(&id).await;
    content_response(&state, result)
}

async fn open_add_shop_form(State(state): State<Arc<AppState>>) -> Result<PageTemplate> {
    state.views.open_add_shop_form().await;
    state.views.page()
}

async fn add_shop(
    State(state): State<Arc<AppState>>,
    Form(values): Form<ShopFormValues>,
) -> Result<impl IntoResponse> {
    let shop = state.views.submit_add_shop(values).await?;
    Ok((
        StatusCode::CREATED,
        [HX_REFRESH],
        Json(ShopCreated { id: shop.id }),
    ))
}
