//! Alerts Service
//!
//! Reads are cached under user-scoped keys; every successful mutation marks
//! the whole `alerts:{user}` prefix stale so the next forced read refetches.
//! Queries made while signed out short-circuit to an error outcome without
//! touching the network.

use crate::api::alerts::AlertsClient;
use crate::api::types::{Alert, AlertConfigOption, AlertEvent, AlertRequest};
use crate::cache::keys::alerts_keys;
use crate::cache::{QueryCache, QueryOutcome, QueryPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct AlertsService {
    cache: Arc<QueryCache>,
    client: Arc<AlertsClient>,
    session: Arc<SessionManager>,
    stale: Duration,
    configs_stale: Duration,
    gc_time: Duration,
}

impl AlertsService {
    pub fn new(
        cache: Arc<QueryCache>,
        client: Arc<AlertsClient>,
        session: Arc<SessionManager>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            client,
            session,
            stale: config.stale.snapshot,
            configs_stale: config.stale.metadata,
            gc_time: config.gc_time,
        }
    }

    fn policy(&self, stale: Duration, force: bool) -> QueryPolicy {
        let policy = QueryPolicy::new(stale, self.gc_time);
        if force {
            policy.forced()
        } else {
            policy
        }
    }

    fn user_id(&self) -> Option<String> {
        if !self.session.is_authenticated() {
            return None;
        }
        self.session.current_user().ok().flatten().map(|u| u.id)
    }

    pub async fn list(&self, force: bool) -> QueryOutcome<Vec<Alert>> {
        let Some(user_id) = self.user_id() else {
            return QueryOutcome::empty_error("not authenticated".to_string());
        };

        let client = self.client.clone();
        self.cache
            .fetch(
                alerts_keys::list(&user_id),
                self.policy(self.stale, force),
                move || {
                    let client = client.clone();
                    async move { client.list().await }
                },
            )
            .await
    }

    pub async fn events(&self, alert_id: &str, force: bool) -> QueryOutcome<Vec<AlertEvent>> {
        let Some(user_id) = self.user_id() else {
            return QueryOutcome::empty_error("not authenticated".to_string());
        };

        let client = self.client.clone();
        let alert_owned = alert_id.to_string();
        self.cache
            .fetch(
                alerts_keys::events(&user_id, alert_id),
                self.policy(self.stale, force),
                move || {
                    let client = client.clone();
                    let alert_id = alert_owned.clone();
                    async move { client.events(&alert_id).await }
                },
            )
            .await
    }

    /// Available rule types. Not user-scoped, but still behind auth.
    pub async fn configs(&self, force: bool) -> QueryOutcome<Vec<AlertConfigOption>> {
        if !self.session.is_authenticated() {
            return QueryOutcome::empty_error("not authenticated".to_string());
        }

        let client = self.client.clone();
        self.cache
            .fetch(
                alerts_keys::configs(),
                self.policy(self.configs_stale, force),
                move || {
                    let client = client.clone();
                    async move { client.configs().await }
                },
            )
            .await
    }

    pub async fn create(&self, request: &AlertRequest) -> Result<Alert> {
        let alert = self.client.create(request).await?;
        self.invalidate_user_alerts();
        Ok(alert)
    }

    pub async fn update(&self, id: &str, request: &AlertRequest) -> Result<Alert> {
        let alert = self.client.update(id, request).await?;
        self.invalidate_user_alerts();
        Ok(alert)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(id).await?;
        self.invalidate_user_alerts();
        Ok(())
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> Result<Alert> {
        let alert = self.client.set_active(id, is_active).await?;
        self.invalidate_user_alerts();
        Ok(alert)
    }

    fn invalidate_user_alerts(&self) {
        if let Some(user_id) = self.user_id() {
            debug!(user = %user_id, "invalidating alert caches after mutation");
            self.cache.invalidate_prefix(&alerts_keys::all(&user_id));
        }
    }
}
