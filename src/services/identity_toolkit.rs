// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password sign-in and account creation
//! - Account deletion (registration rollback)
//! - ID token refresh before expiry
//! - Pushing identity changes to subscribers

use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::services::auth_provider::{AuthProvider, ProviderState};
use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Refresh this long before the ID token expires.
const REFRESH_MARGIN_SECS: u64 = 60;
/// Used when the provider omits or garbles `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Provider error messages that mean "wrong email or password".
const CREDENTIAL_ERRORS: &[&str] = &[
    "EMAIL_NOT_FOUND",
    "INVALID_PASSWORD",
    "INVALID_LOGIN_CREDENTIALS",
];

#[derive(Debug, Clone)]
struct TokenSet {
    id_token: String,
    refresh_token: String,
}

/// Request body shared by sign-in and sign-up.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Secure token endpoint response (snake_case, unlike the rest of the API).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Endpoints and credentials, cloned into the refresh task.
#[derive(Clone)]
struct Endpoints {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    api_key: String,
}

/// Firebase Auth REST client.
pub struct IdentityToolkitClient {
    endpoints: Endpoints,
    tokens: Arc<Mutex<Option<TokenSet>>>,
    state: Arc<watch::Sender<ProviderState>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl IdentityToolkitClient {
    /// Create a client for the given Web API key.
    ///
    /// With `emulator_host` set, requests go to the Auth emulator.
    pub fn new(api_key: String, emulator_host: Option<&str>) -> Self {
        let (identity_url, token_url) = match emulator_host {
            Some(host) => (
                format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                format!("http://{}/securetoken.googleapis.com/v1/token", host),
            ),
            None => (
                "https://identitytoolkit.googleapis.com/v1".to_string(),
                "https://securetoken.googleapis.com/v1/token".to_string(),
            ),
        };

        // Sessions are not persisted across restarts, so the first state is known.
        let (state, _) = watch::channel(ProviderState::SignedOut);

        Self {
            endpoints: Endpoints {
                http: reqwest::Client::new(),
                identity_url,
                token_url,
                api_key,
            },
            tokens: Arc::new(Mutex::new(None)),
            state: Arc::new(state),
            refresh_task: Mutex::new(None),
        }
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity> {
        let url = format!("{}/accounts:{}", self.endpoints.identity_url, method);
        let response = self
            .endpoints
            .http
            .post(&url)
            .query(&[("key", self.endpoints.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;

        let body: PasswordResponse = check_response_json(response).await?;
        let identity = Identity {
            uid: body.local_id,
            email: body.email.or_else(|| Some(email.to_string())),
        };

        self.install_tokens(
            TokenSet {
                id_token: body.id_token,
                refresh_token: body.refresh_token,
            },
            parse_lifetime(body.expires_in.as_deref()),
        )
        .await;

        tracing::info!(uid = %identity.uid, method, "Identity Toolkit sign-in succeeded");
        self.state
            .send_replace(ProviderState::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Store fresh tokens and (re)start the refresh timer.
    async fn install_tokens(&self, tokens: TokenSet, lifetime_secs: u64) {
        *self.tokens.lock().await = Some(tokens);

        let task = tokio::spawn(refresh_loop(
            self.endpoints.clone(),
            Arc::clone(&self.tokens),
            Arc::clone(&self.state),
            lifetime_secs,
        ));

        if let Some(previous) = self.refresh_task.lock().await.replace(task) {
            previous.abort();
        }
    }

    async fn clear_tokens(&self) {
        if let Some(task) = self.refresh_task.lock().await.take() {
            task.abort();
        }
        *self.tokens.lock().await = None;
        self.state.send_replace(ProviderState::SignedOut);
    }

    async fn delete_current(&self) -> Result<()> {
        let id_token = self
            .tokens
            .lock()
            .await
            .as_ref()
            .map(|t| t.id_token.clone())
            .ok_or(AppError::NoSession)?;

        let url = format!("{}/accounts:delete", self.endpoints.identity_url);
        let response = self
            .endpoints
            .http
            .post(&url)
            .query(&[("key", self.endpoints.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;

        let _: serde_json::Value = check_response_json(response).await?;
        self.clear_tokens().await;
        Ok(())
    }
}

/// Keep the ID token fresh. A failed refresh signs the user out.
async fn refresh_loop(
    endpoints: Endpoints,
    tokens: Arc<Mutex<Option<TokenSet>>>,
    state: Arc<watch::Sender<ProviderState>>,
    mut lifetime_secs: u64,
) {
    loop {
        let wait = lifetime_secs.saturating_sub(REFRESH_MARGIN_SECS).max(1);
        tokio::time::sleep(Duration::from_secs(wait)).await;

        let Some(refresh_token) = tokens.lock().await.as_ref().map(|t| t.refresh_token.clone())
        else {
            return;
        };

        match refresh_once(&endpoints, &refresh_token).await {
            Ok(refreshed) => {
                lifetime_secs = parse_lifetime(refreshed.expires_in.as_deref());
                *tokens.lock().await = Some(TokenSet {
                    id_token: refreshed.id_token,
                    refresh_token: refreshed.refresh_token,
                });
                tracing::debug!("ID token refreshed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "ID token refresh failed, signing out");
                *tokens.lock().await = None;
                state.send_replace(ProviderState::SignedOut);
                return;
            }
        }
    }
}

async fn refresh_once(endpoints: &Endpoints, refresh_token: &str) -> Result<RefreshResponse> {
    let response = endpoints
        .http
        .post(&endpoints.token_url)
        .query(&[("key", endpoints.api_key.as_str())])
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| AppError::AuthProvider(format!("Token refresh request failed: {}", e)))?;

    check_response_json(response).await
}

fn parse_lifetime(expires_in: Option<&str>) -> u64 {
    expires_in
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

/// Check response status and parse JSON body, mapping provider errors.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(map_provider_error(status.as_u16(), &body));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::AuthProvider(format!("Invalid provider response: {}", e)))
}

/// Map an Identity Toolkit error body to the application taxonomy.
fn map_provider_error(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    // Messages may carry a suffix, e.g. "WEAK_PASSWORD : Password should be ..."
    let code = message.split(" : ").next().unwrap_or_default().trim();
    if CREDENTIAL_ERRORS.contains(&code) {
        AppError::InvalidCredentials
    } else {
        AppError::AuthProvider(message)
    }
}

impl AuthProvider for IdentityToolkitClient {
    fn sign_in_with_password<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        self.password_call("signInWithPassword", email, password)
            .boxed()
    }

    fn create_account<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Identity>> {
        self.password_call("signUp", email, password).boxed()
    }

    fn delete_account(&self) -> BoxFuture<'_, Result<()>> {
        self.delete_current().boxed()
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            // Tokens are bearer credentials; dropping them is the sign-out.
            self.clear_tokens().await;
            Ok(())
        }
        .boxed()
    }

    fn watch_state(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }
}
