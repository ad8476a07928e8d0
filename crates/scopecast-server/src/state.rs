use chrono::NaiveDate;
use scopecast_ai::{AiError, EstimatorClient};
use scopecast_core::config::Config;
use scopecast_core::session::{EstimateReport, Session, SessionStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// What `GET /api/session` returns and what every SSE `update` carries.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Report for the current result, or for the result kept across an
    /// in-flight or failed refresh.
    pub report: Option<EstimateReport>,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: EstimatorClient,
    pub session: Arc<Mutex<Session>>,
    pub event_tx: broadcast::Sender<String>,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AiError> {
        let client = EstimatorClient::from_config(&config)?;
        let (tx, _) = broadcast::channel(64);
        Ok(Self {
            config: Arc::new(config),
            client,
            session: Arc::new(Mutex::new(Session::new())),
            event_tx: tx,
            today: None,
        })
    }

    pub fn with_client(mut self, client: EstimatorClient) -> Self {
        self.client = client;
        self
    }

    /// Pin the date the timeline is anchored from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn snapshot(&self, session: &Session) -> SessionSnapshot {
        SessionSnapshot {
            status: session.status(),
            revision: session.revision(),
            error: session.error_message().map(str::to_string),
            report: session.last_workspace().map(|ws| ws.report(self.today())),
        }
    }

    /// Broadcast `snapshot` to SSE subscribers. No subscribers is not an
    /// error.
    pub fn publish(&self, snapshot: &SessionSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(payload) => {
                let _ = self.event_tx.send(payload);
            }
            Err(e) => tracing::error!("failed to serialize session snapshot: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_state_snapshot_is_input() {
        let state = AppState::new(Config::default()).unwrap();
        let session = state.session.lock().await;
        let snap = state.snapshot(&session);
        assert_eq!(snap.status, SessionStatus::Input);
        assert_eq!(snap.revision, 0);
        assert!(snap.report.is_none());
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let state = AppState::new(Config::default()).unwrap();
        let mut rx = state.event_tx.subscribe();
        let snap = state.snapshot(&*state.session.lock().await);
        state.publish(&snap);
        let payload = rx.recv().await.unwrap();
        assert!(payload.contains("\"status\":\"input\""));
    }
}
