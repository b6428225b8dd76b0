//! Auth token/session layer
//!
//! Persists access/refresh tokens, attaches bearer headers to authenticated
//! requests, and performs a single-flight refresh-and-retry on 401s:
//! concurrent expired callers coalesce onto one refresh call, and an
//! irrecoverable refresh clears the stored session.

use crate::api::auth::AuthApi;
use crate::api::types::{AuthUser, TokenPair};
use crate::error::{ApiError, AppError, Result};
use crate::store::{keys, KvStore};
use parking_lot::RwLock;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    store: Arc<KvStore>,
    http: Client,
    tokens: RwLock<Option<TokenPair>>,
    /// Bumped on every successful refresh/login; the refresh single-flight
    /// compares generations to detect that another caller already refreshed.
    generation: AtomicU64,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Build the session layer, rehydrating any persisted tokens.
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<KvStore>, http: Client) -> Result<Self> {
        let tokens: Option<TokenPair> = store.get_json(keys::AUTH_TOKENS)?;
        if tokens.is_some() {
            info!("session rehydrated from storage");
        }

        Ok(Self {
            auth,
            store,
            http,
            tokens: RwLock::new(tokens),
            generation: AtomicU64::new(0),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access_token.clone())
    }

    /// Current user record, as persisted at login.
    pub fn current_user(&self) -> Result<Option<AuthUser>> {
        self.store.get_json(keys::AUTH_USER)
    }

    /// Authenticate and persist the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser> {
        let response = self.auth.login(email, password).await?;

        self.store.set_json(keys::AUTH_TOKENS, &response.tokens)?;
        self.store.set_json(keys::AUTH_USER, &response.user)?;
        *self.tokens.write() = Some(response.tokens);
        self.generation.fetch_add(1, Ordering::AcqRel);

        info!(user = %response.user.id, "login succeeded");
        Ok(response.user)
    }

    /// End the session. The server-side revocation is best-effort; local
    /// state is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let refresh_token = self.tokens.read().as_ref().map(|t| t.refresh_token.clone());

        if let Some(token) = refresh_token {
            if let Err(e) = self.auth.logout(&token).await {
                warn!("server logout failed, clearing local session anyway: {}", e);
            }
        }

        self.clear_local()?;
        info!("session cleared");
        Ok(())
    }

    /// Send an authenticated request, refreshing and retrying once on 401.
    ///
    /// `build` constructs the request from scratch so the retry carries the
    /// new bearer token.
    pub async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let token = self
            .access_token()
            .ok_or_else(|| AppError::Auth("not authenticated".to_string()))?;

        let response = build(&self.http)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::from)?;

        if response.status().as_u16() != 401 {
            return Ok(response);
        }

        let token = self.refresh_access_token().await?;
        let response = build(&self.http)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(ApiError::from)?;
        Ok(response)
    }

    /// Single-flight token refresh.
    ///
    /// Callers that lose the race to the lock re-check the generation: if it
    /// moved, someone else already refreshed and the current token is used
    /// without another network call. Refresh failure clears the session.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let seen = self.generation.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != seen {
            return self
                .access_token()
                .ok_or_else(|| AppError::Auth("session cleared during refresh".to_string()));
        }

        let refresh_token = self
            .tokens
            .read()
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or_else(|| AppError::Auth("not authenticated".to_string()))?;

        match self.auth.refresh(&refresh_token).await {
            Ok(pair) => {
                self.store.set_json(keys::AUTH_TOKENS, &pair)?;
                let access = pair.access_token.clone();
                *self.tokens.write() = Some(pair);
                self.generation.fetch_add(1, Ordering::AcqRel);
                info!("access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!("token refresh failed, clearing session: {}", e);
                self.clear_local()?;
                Err(AppError::Auth(format!("token refresh failed: {}", e)))
            }
        }
    }

    fn clear_local(&self) -> Result<()> {
        self.store.remove(keys::AUTH_TOKENS)?;
        self.store.remove(keys::AUTH_USER)?;
        *self.tokens.write() = None;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
