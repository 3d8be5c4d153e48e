//! Alert → Gotify translation.
//!
//! [`decide`] is pure: it looks at one alert and the process-wide
//! [`Policy`] and says what the dispatch loop should do with it. No I/O
//! happens here, so the same alert always yields the same [`Action`].

use serde::{Deserialize, Serialize};

use crate::alerts::model::{Alert, AlertStatus};
use crate::error::TranslateError;

pub const DEFAULT_SEVERITY: &str = "warning";
pub const DEFAULT_PRIORITY: i64 = 5;
const RESOLVED_PREFIX: &str = "Resolved";

/// Resolved-alert handling, fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Drop resolved alerts without touching Gotify.
    pub disable_resolved: bool,
    /// Delete the notification sent for the firing alert instead of
    /// sending a "Resolved" one.
    pub delete_on_resolve: bool,
}

/// Payload POSTed to Gotify's `/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundNotification {
    pub title: String,
    pub message: String,
    pub priority: i64,
    pub extras: NotificationExtras,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationExtras {
    pub alertify: AlertifyExtras,
}

/// Our namespace inside Gotify's `extras`. The fingerprint stored here is
/// the only link between an alert and the notification sent for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertifyExtras {
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Suppress,
    /// Delete whatever was sent for this fingerprint. `None` when the alert
    /// carried no fingerprint; the resolver treats that as "no matches".
    DeleteByFingerprint(Option<String>),
    Send(OutboundNotification),
}

/// Decide what to do with one alert.
///
/// Suppression is checked before deletion, so enabling both flags means
/// resolved alerts are simply ignored.
pub fn decide(alert: &Alert, policy: &Policy) -> Result<Action, TranslateError> {
    let status = alert.status.ok_or_else(|| TranslateError::missing("status"))?;

    if status == AlertStatus::Resolved {
        if policy.disable_resolved {
            return Ok(Action::Suppress);
        }
        if policy.delete_on_resolve {
            return Ok(Action::DeleteByFingerprint(alert.fingerprint.clone()));
        }
    }

    translate(alert, status).map(Action::Send)
}

/// Build the Gotify payload for an alert that is going to be sent.
pub fn translate(alert: &Alert, status: AlertStatus) -> Result<OutboundNotification, TranslateError> {
    let labels = || {
        alert
            .labels
            .as_ref()
            .ok_or_else(|| TranslateError::missing("labels"))
    };
    let annotations = || {
        alert
            .annotations
            .as_ref()
            .ok_or_else(|| TranslateError::missing("annotations"))
    };

    // A resolved notification reads its title first, a firing one its severity.
    let (labels, annotations) = match status {
        AlertStatus::Resolved => {
            let annotations = annotations()?;
            (labels()?, annotations)
        }
        AlertStatus::Firing => {
            let labels = labels()?;
            (labels, annotations()?)
        }
    };

    let prefix = match status {
        AlertStatus::Resolved => RESOLVED_PREFIX.to_string(),
        AlertStatus::Firing => capitalize(
            labels
                .get("severity")
                .map(String::as_str)
                .unwrap_or(DEFAULT_SEVERITY),
        ),
    };

    let summary = annotations
        .get("summary")
        .ok_or_else(|| TranslateError::missing("summary"))?;
    let description = annotations.get("description").map(String::as_str).unwrap_or("");

    let message = match labels.get("instance") {
        Some(instance) => format!("{}: {}", instance, description),
        None => description.to_string(),
    };

    Ok(OutboundNotification {
        title: format!("{}: {}", prefix, summary),
        message,
        priority: parse_priority(labels.get("priority").map(String::as_str))?,
        extras: NotificationExtras {
            alertify: AlertifyExtras {
                fingerprint: alert.fingerprint.clone(),
            },
        },
    })
}

fn parse_priority(raw: Option<&str>) -> Result<i64, TranslateError> {
    match raw {
        None => Ok(DEFAULT_PRIORITY),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| TranslateError::InvalidPriority(value.to_string())),
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
