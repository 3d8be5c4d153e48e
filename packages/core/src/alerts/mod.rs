//! Alertmanager → Gotify core: translation, fingerprint resolution and the
//! per-batch dispatch loop.

pub mod dispatch;
pub mod model;
pub mod resolver;
pub mod translate;

pub use dispatch::{DispatchResult, Dispatcher};
pub use model::{Alert, AlertBatch, AlertStatus};
pub use translate::{decide, Action, OutboundNotification, Policy};
