//! Alerts engine client
//!
//! Every call goes through the session layer, which attaches the bearer
//! token and handles the 401 refresh-and-retry. Payloads are
//! envelope-wrapped.

use crate::api::types::{Alert, AlertConfigOption, AlertEvent, AlertRequest, Envelope};
use crate::api::{decode_response, require_non_empty, unwrap_envelope};
use crate::error::Result;
use crate::session::SessionManager;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub struct AlertsClient {
    session: Arc<SessionManager>,
    base_url: String,
}

impl AlertsClient {
    pub fn new(session: Arc<SessionManager>, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into(),
        }
    }

    /// All alerts owned by the current user.
    pub async fn list(&self) -> Result<Vec<Alert>> {
        let url = format!("{}/alerts", self.base_url);
        let response = self.session.send_authorized(|c| c.get(&url)).await?;
        let envelope: Envelope<Vec<Alert>> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    pub async fn create(&self, request: &AlertRequest) -> Result<Alert> {
        require_non_empty("series code", &request.series_code)?;
        debug!(series = %request.series_code, "creating alert");

        let url = format!("{}/alerts", self.base_url);
        let response = self
            .session
            .send_authorized(|c| c.post(&url).json(request))
            .await?;
        let envelope: Envelope<Alert> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    pub async fn update(&self, id: &str, request: &AlertRequest) -> Result<Alert> {
        require_non_empty("alert id", id)?;

        let url = format!("{}/alerts/{}", self.base_url, id);
        let response = self
            .session
            .send_authorized(|c| c.put(&url).json(request))
            .await?;
        let envelope: Envelope<Alert> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        require_non_empty("alert id", id)?;

        let url = format!("{}/alerts/{}", self.base_url, id);
        let response = self.session.send_authorized(|c| c.delete(&url)).await?;
        let envelope: Envelope<serde_json::Value> = decode_response(response).await?;
        // Delete returns no payload on success.
        if !envelope.success {
            return unwrap_envelope(envelope).map(|_| ());
        }
        Ok(())
    }

    /// Toggle `is_active` without touching the rule itself.
    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<Alert> {
        require_non_empty("alert id", id)?;

        let url = format!("{}/alerts/{}", self.base_url, id);
        let response = self
            .session
            .send_authorized(|c| c.put(&url).json(&json!({ "is_active": is_active })))
            .await?;
        let envelope: Envelope<Alert> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    /// Trigger history for one alert.
    pub async fn events(&self, id: &str) -> Result<Vec<AlertEvent>> {
        require_non_empty("alert id", id)?;

        let url = format!("{}/alerts/{}/events", self.base_url, id);
        let response = self.session.send_authorized(|c| c.get(&url)).await?;
        let envelope: Envelope<Vec<AlertEvent>> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    /// Rule types the engine currently offers.
    pub async fn configs(&self) -> Result<Vec<AlertConfigOption>> {
        let url = format!("{}/alert-configs", self.base_url);
        let response = self.session.send_authorized(|c| c.get(&url)).await?;
        let envelope: Envelope<Vec<AlertConfigOption>> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::AuthApi;
    use crate::api::http_client;
    use crate::api::types::{AlertRuleConfig, AlertRuleType, LoginResponse, TokenPair};
    use crate::store::{keys, KvStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoRefreshAuth;

    #[async_trait]
    impl AuthApi for NoRefreshAuth {
        async fn login(&self, _e: &str, _p: &str) -> Result<LoginResponse> {
            unreachable!("not used")
        }
        async fn refresh(&self, _t: &str) -> Result<TokenPair> {
            panic!("refresh must not be called");
        }
        async fn logout(&self, _t: &str) -> Result<()> {
            Ok(())
        }
    }

    fn authenticated_client(server: &MockServer) -> AlertsClient {
        let store = Arc::new(KvStore::in_memory().unwrap());
        store
            .set_json(
                keys::AUTH_TOKENS,
                &TokenPair {
                    access_token: "acc".into(),
                    refresh_token: "ref".into(),
                },
            )
            .unwrap();
        let session = Arc::new(
            SessionManager::new(
                Arc::new(NoRefreshAuth),
                store,
                http_client(Duration::from_secs(5)).unwrap(),
            )
            .unwrap(),
        );
        AlertsClient::new(session, server.uri())
    }

    #[tokio::test]
    async fn list_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alerts"))
            .and(header("Authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{
                    "id": "a1",
                    "series_code": "IPC_VARIACION_MENSUAL",
                    "rule_type": "value-above",
                    "rule_config": {"threshold": 5.0},
                    "is_active": true,
                    "last_triggered_at": null
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let alerts = authenticated_client(&server).list().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].rule_type, AlertRuleType::ValueAbove);
    }

    #[tokio::test]
    async fn create_posts_rule() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "id": "a2",
                    "series_code": "DOLAR_BLUE",
                    "rule_type": "percent-change-above",
                    "rule_config": {"threshold": 2.5, "window": "7d"},
                    "is_active": true
                }
            })))
            .mount(&server)
            .await;

        let created = authenticated_client(&server)
            .create(&AlertRequest {
                series_code: "DOLAR_BLUE".into(),
                rule_type: AlertRuleType::PercentChangeAbove,
                rule_config: AlertRuleConfig {
                    threshold: 2.5,
                    window: Some("7d".into()),
                },
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(created.id, "a2");
    }
}
