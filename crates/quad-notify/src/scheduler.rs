//! The scheduler trait that platform backends implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NotifyError;

/// Opaque identifier of one scheduled notification.
///
/// Has no persistence of its own; RSVP records embed it as a
/// back-reference to the reminder they created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NotificationHandle(pub String);

impl NotificationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a notification shows and carries when it fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Structured payload handed back to the app when the user taps it.
    pub data: Value,
}

/// Schedules and cancels local device notifications.
///
/// Injected as `Arc<dyn NotificationScheduler>` wherever the sync layer
/// needs it; tests substitute [`MemoryScheduler`](crate::MemoryScheduler).
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Schedule a notification to fire at `at`.
    ///
    /// Returns `None` without scheduling when `at` is not strictly in the
    /// future; callers that need different handling must check first.
    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        content: NotificationContent,
    ) -> Result<Option<NotificationHandle>, NotifyError>;

    /// Fire a notification immediately.
    async fn schedule_now(
        &self,
        content: NotificationContent,
    ) -> Result<NotificationHandle, NotifyError>;

    /// Cancel a previously scheduled notification. Cancelling a handle
    /// that already fired or never existed is not an error.
    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError>;
}
