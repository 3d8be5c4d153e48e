//! Per-batch dispatch loop.
//!
//! Alerts are handled strictly in arrival order, one Gotify call at a time.
//! The caller only ever sees one status: the outcome of the last call made.
//! Every individual outcome is logged and counted.

use std::sync::Arc;

use crate::alerts::model::Alert;
use crate::alerts::resolver::find_by_fingerprint;
use crate::alerts::translate::{decide, Action, Policy};
use crate::error::TranslateError;
use crate::metrics::AppMetrics;
use crate::services::gotify::{GotifyResponse, NotificationBackend};

pub const SUPPRESSED_REASON: &str = "Ignored. resolved messages are disabled";

/// Status and reason answered to Alertmanager for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub status: u16,
    pub reason: String,
}

impl DispatchResult {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Nothing was sent or deleted.
    pub fn no_content() -> Self {
        Self::new(204, "")
    }

    pub fn suppressed() -> Self {
        Self::new(200, SUPPRESSED_REASON)
    }
}

impl From<&GotifyResponse> for DispatchResult {
    fn from(response: &GotifyResponse) -> Self {
        Self::new(response.status, response.reason.clone())
    }
}

impl From<TranslateError> for DispatchResult {
    fn from(err: TranslateError) -> Self {
        Self::new(400, err.to_string())
    }
}

pub struct Dispatcher {
    backend: Arc<dyn NotificationBackend>,
    policy: Policy,
    metrics: Arc<AppMetrics>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn NotificationBackend>, policy: Policy, metrics: Arc<AppMetrics>) -> Self {
        Self {
            backend,
            policy,
            metrics,
        }
    }

    /// Process a webhook batch and report the last Gotify outcome.
    ///
    /// A translation error stops the batch where it is: alerts before it
    /// have already been acted on, alerts after it are skipped, and only
    /// the error is reported.
    pub async fn handle_batch(&self, alerts: &[Alert]) -> DispatchResult {
        match self.process(alerts).await {
            Ok(Some(last)) => last,
            Ok(None) => DispatchResult::no_content(),
            Err(err) => {
                tracing::error!("Aborting batch: {}", err);
                self.metrics.translation_errors_total.inc();
                err.into()
            }
        }
    }

    async fn process(&self, alerts: &[Alert]) -> Result<Option<DispatchResult>, TranslateError> {
        let mut last = None;

        for (index, alert) in alerts.iter().enumerate() {
            self.metrics.alerts_received_total.inc();

            match decide(alert, &self.policy)? {
                Action::Suppress => {
                    tracing::info!("Alert #{}: ignoring resolved message", index);
                    self.metrics.alerts_suppressed_total.inc();
                    last = Some(DispatchResult::suppressed());
                }
                Action::DeleteByFingerprint(fingerprint) => {
                    let ids = find_by_fingerprint(self.backend.as_ref(), fingerprint.as_deref()).await;
                    if ids.is_empty() {
                        tracing::warn!("Alert #{}: could not find a matching message to delete", index);
                    }
                    // A failed delete does not stop the remaining ones.
                    for id in ids {
                        let response = self.backend.delete(id).await;
                        self.record(index, &format!("delete message {}", id), &response);
                        if response.is_success() {
                            self.metrics.notifications_deleted_total.inc();
                        }
                        last = Some(DispatchResult::from(&response));
                    }
                }
                Action::Send(payload) => {
                    let response = self.backend.send(&payload).await;
                    self.record(index, "send", &response);
                    if response.is_success() {
                        self.metrics.notifications_sent_total.inc();
                    }
                    last = Some(DispatchResult::from(&response));
                }
            }
        }

        Ok(last)
    }

    fn record(&self, index: usize, action: &str, response: &GotifyResponse) {
        if response.is_success() {
            tracing::info!(
                "Alert #{}: {} -> Status: {}, Reason: {}",
                index,
                action,
                response.status,
                response.reason
            );
        } else {
            self.metrics.backend_errors_total.inc();
            tracing::error!(
                "Alert #{}: {} failed -> Status: {}, Reason: {}",
                index,
                action,
                response.status,
                response.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_gotify::{Call, MockGotify};
    use serde_json::json;

    const DELETE: Policy = Policy {
        disable_resolved: false,
        delete_on_resolve: true,
    };

    fn alerts(value: serde_json::Value) -> Vec<Alert> {
        serde_json::from_value(value).unwrap()
    }

    fn dispatcher(gotify: &Arc<MockGotify>, policy: Policy) -> (Dispatcher, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        (Dispatcher::new(gotify.clone(), policy, metrics.clone()), metrics)
    }

    fn firing(summary: &str) -> serde_json::Value {
        json!({
            "status": "firing",
            "labels": {"severity": "critical", "instance": "db1"},
            "annotations": {"summary": summary, "description": "92% used"}
        })
    }

    #[tokio::test]
    async fn empty_batch_is_no_content() {
        let gotify = Arc::new(MockGotify::new());
        let (dispatcher, _) = dispatcher(&gotify, Policy::default());

        assert_eq!(dispatcher.handle_batch(&[]).await, DispatchResult::new(204, ""));
        assert!(gotify.calls().is_empty());
    }

    #[tokio::test]
    async fn firing_alert_is_sent() {
        let gotify = Arc::new(MockGotify::new());
        let (dispatcher, metrics) = dispatcher(&gotify, Policy::default());

        let result = dispatcher.handle_batch(&alerts(json!([firing("disk full")]))).await;

        assert_eq!(result, DispatchResult::new(200, "OK"));
        match &gotify.calls()[..] {
            [Call::Send(payload)] => {
                assert_eq!(payload.title, "Critical: disk full");
                assert_eq!(payload.message, "db1: 92% used");
            }
            other => panic!("unexpected calls: {:?}", other),
        }
        assert!((metrics.notifications_sent_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn alerts_are_sent_in_arrival_order() {
        let gotify = Arc::new(MockGotify::new());
        let (dispatcher, _) = dispatcher(&gotify, Policy::default());

        dispatcher
            .handle_batch(&alerts(json!([firing("first"), firing("second"), firing("third")])))
            .await;

        let titles: Vec<String> = gotify
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(payload) => Some(payload.title),
                _ => None,
            })
            .collect();
        assert_eq!(titles, vec!["Critical: first", "Critical: second", "Critical: third"]);
    }

    #[tokio::test]
    async fn backend_status_is_passed_through() {
        let gotify = Arc::new(MockGotify::new().with_send_status(401));
        let (dispatcher, metrics) = dispatcher(&gotify, Policy::default());

        let result = dispatcher.handle_batch(&alerts(json!([firing("disk full")]))).await;

        assert_eq!(result, DispatchResult::new(401, "Unauthorized"));
        assert!((metrics.backend_errors_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn resolved_with_delete_removes_every_match() {
        let gotify = Arc::new(
            MockGotify::new()
                .with_message(10, Some("abc123"))
                .with_message(11, Some("other"))
                .with_message(12, Some("abc123"))
                .with_delete_status(12, 404),
        );
        let (dispatcher, metrics) = dispatcher(&gotify, DELETE);

        let result = dispatcher
            .handle_batch(&alerts(json!([{"status": "resolved", "fingerprint": "abc123"}])))
            .await;

        assert_eq!(
            gotify.calls(),
            vec![Call::List, Call::Delete(10), Call::Delete(12)]
        );
        // Last delete wins.
        assert_eq!(result, DispatchResult::new(404, "Not Found"));
        assert!((metrics.notifications_deleted_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failed_delete_does_not_block_the_rest() {
        let gotify = Arc::new(
            MockGotify::new()
                .with_message(1, Some("abc123"))
                .with_message(2, Some("abc123"))
                .with_delete_status(1, 500),
        );
        let (dispatcher, _) = dispatcher(&gotify, DELETE);

        let result = dispatcher
            .handle_batch(&alerts(json!([{"status": "resolved", "fingerprint": "abc123"}])))
            .await;

        assert!(gotify.calls().contains(&Call::Delete(2)));
        assert_eq!(result, DispatchResult::new(200, "OK"));
    }

    #[tokio::test]
    async fn delete_with_no_matches_is_no_content() {
        let gotify = Arc::new(MockGotify::new().with_message(1, Some("other")));
        let (dispatcher, _) = dispatcher(&gotify, DELETE);

        let result = dispatcher
            .handle_batch(&alerts(json!([{"status": "resolved", "fingerprint": "abc123"}])))
            .await;

        assert_eq!(result, DispatchResult::no_content());
        assert_eq!(gotify.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn delete_with_no_matches_keeps_earlier_result() {
        let gotify = Arc::new(MockGotify::new());
        let (dispatcher, _) = dispatcher(&gotify, DELETE);

        let result = dispatcher
            .handle_batch(&alerts(json!([
                firing("disk full"),
                {"status": "resolved", "fingerprint": "abc123"}
            ])))
            .await;

        assert_eq!(result, DispatchResult::new(200, "OK"));
    }

    #[tokio::test]
    async fn suppression_wins_over_deletion() {
        let gotify = Arc::new(MockGotify::new().with_message(1, Some("abc123")));
        let policy = Policy {
            disable_resolved: true,
            delete_on_resolve: true,
        };
        let (dispatcher, metrics) = dispatcher(&gotify, policy);

        let result = dispatcher
            .handle_batch(&alerts(json!([{"status": "resolved", "fingerprint": "abc123"}])))
            .await;

        assert_eq!(result, DispatchResult::suppressed());
        assert!(gotify.calls().is_empty());
        assert!((metrics.alerts_suppressed_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn translation_error_aborts_the_batch() {
        let gotify = Arc::new(MockGotify::new());
        let (dispatcher, metrics) = dispatcher(&gotify, Policy::default());

        let result = dispatcher
            .handle_batch(&alerts(json!([
                firing("first"),
                {"status": "firing", "labels": {}},
                firing("never sent")
            ])))
            .await;

        assert_eq!(result, DispatchResult::new(400, "Missing field: 'annotations'"));
        // The alert before the bad one was already sent; the one after never is.
        assert_eq!(gotify.calls().len(), 1);
        assert!((metrics.translation_errors_total.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn delete_without_client_key_sends_nothing() {
        let gotify = Arc::new(MockGotify::new().with_message(1, Some("abc123")).without_client_key());
        let (dispatcher, _) = dispatcher(&gotify, DELETE);

        let result = dispatcher
            .handle_batch(&alerts(json!([{"status": "resolved", "fingerprint": "abc123"}])))
            .await;

        assert_eq!(result, DispatchResult::no_content());
        assert!(gotify.calls().is_empty());
    }
}
