//! Auth service client

use crate::api::types::{Envelope, LoginRequest, LoginResponse, TokenPair};
use crate::api::{decode_response, require_non_empty, unwrap_envelope};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// The auth operations the session layer depends on. A trait so tests can
/// substitute a counting double for the refresh single-flight contract.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
    async fn logout(&self, refresh_token: &str) -> Result<()>;
}

pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        require_non_empty("email", email)?;
        require_non_empty("password", password)?;

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<LoginResponse> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        require_non_empty("refresh token", refresh_token)?;

        let response = self
            .client
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<TokenPair> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    async fn logout(&self, refresh_token: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/auth/logout", self.base_url))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        // Logout carries no payload; only the envelope verdict matters.
        let envelope: Envelope<Value> = decode_response(response).await?;
        if !envelope.success {
            let message = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "logout rejected".to_string());
            return Err(crate::error::ApiError::Envelope {
                message,
                body: None,
            }
            .into());
        }
        Ok(())
    }
}
