// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, registration and logout routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::Session;
use crate::routes::views::HX_REFRESH;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Session summary returned after login/registration.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            uid: session.identity.uid,
            email: session.identity.email,
            name: session.name,
        }
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse> {
    form.validate()?;
    let session = state
        .views
        .handle_login(form.email.trim(), &form.password)
        .await?;
    Ok(([HX_REFRESH], Json(SessionResponse::from(session))))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse> {
    form.validate()?;
    let session = state
        .views
        .handle_register(form.name.trim(), form.email.trim(), &form.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        [HX_REFRESH],
        Json(SessionResponse::from(session)),
    ))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    state.views.handle_logout().await?;
    Ok((StatusCode::NO_CONTENT, [HX_REFRESH]))
}
