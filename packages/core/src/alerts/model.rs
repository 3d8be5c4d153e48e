//! Inbound Alertmanager webhook shapes.
//!
//! Every field is optional at the serde level: a missing `labels` or
//! `annotations` is not a JSON error but a translation error, reported per
//! alert by [`crate::alerts::translate::decide`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

/// One entry of the webhook's `alerts` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub status: Option<AlertStatus>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,
    /// Stable identity across the firing and resolved notifications.
    pub fingerprint: Option<String>,
}

impl Alert {
    pub fn is_resolved(&self) -> bool {
        self.status == Some(AlertStatus::Resolved)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.as_ref()?.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref()?.get(key).map(String::as_str)
    }
}

/// The webhook body posted by Alertmanager.
///
/// Only `alerts` is consumed; the group-level fields (`receiver`,
/// `commonLabels`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertBatch {
    pub alerts: Option<Vec<Alert>>,
}
