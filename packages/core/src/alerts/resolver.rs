//! Fingerprint lookup against the messages already stored on Gotify.
//!
//! There is no local state: the only record of what was sent is the
//! fingerprint embedded in each message's extras, so resolution lists
//! every message and filters client-side.

use crate::services::gotify::NotificationBackend;

/// IDs of every stored message whose `extras.alertify.fingerprint` equals
/// `fingerprint`, in the order Gotify listed them.
///
/// Returns an empty list, without error, when the alert had no fingerprint
/// or no client key is configured (no network call is made in either case).
pub async fn find_by_fingerprint(
    backend: &dyn NotificationBackend,
    fingerprint: Option<&str>,
) -> Vec<i64> {
    let Some(fingerprint) = fingerprint else {
        tracing::warn!("No fingerprint found in resolved alert; nothing to delete");
        return Vec::new();
    };

    if !backend.can_list() {
        tracing::warn!("No client key is configured; cannot look up fingerprint {}", fingerprint);
        return Vec::new();
    }

    let ids: Vec<i64> = backend
        .list()
        .await
        .into_iter()
        .filter(|message| match message.fingerprint() {
            Some(stored) => stored == fingerprint,
            None => {
                tracing::debug!("No fingerprint found in message {}", message.id);
                false
            }
        })
        .map(|message| message.id)
        .collect();

    if ids.is_empty() {
        tracing::debug!("No message matched fingerprint {}", fingerprint);
    }
    ids
}
