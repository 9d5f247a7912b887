//! In-process scheduler implementation.
//!
//! Records what would be shown on the device instead of talking to a
//! platform notification service: time-triggered notifications sit in a
//! pending set until cancelled, immediate ones land in a fired log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::NotifyError;
use crate::scheduler::{NotificationContent, NotificationHandle, NotificationScheduler};

/// One notification as recorded by [`MemoryScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNotification {
    pub handle: NotificationHandle,
    pub content: NotificationContent,
    /// `None` for immediate notifications.
    pub trigger_at: Option<DateTime<Utc>>,
}

/// In-memory [`NotificationScheduler`] implementation.
#[derive(Clone, Default)]
pub struct MemoryScheduler {
    pending: Arc<Mutex<HashMap<NotificationHandle, ScheduledNotification>>>,
    fired: Arc<Mutex<Vec<ScheduledNotification>>>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_handle() -> NotificationHandle {
        NotificationHandle(Uuid::new_v4().simple().to_string())
    }

    /// Time-triggered notifications that have not been cancelled.
    pub fn pending(&self) -> Vec<ScheduledNotification> {
        let mut pending: Vec<ScheduledNotification> = self
            .pending
            .lock()
            .expect("scheduler lock poisoned")
            .values()
            .cloned()
            .collect();
        pending.sort_by_key(|n| n.trigger_at);
        pending
    }

    /// Immediately-fired notifications, oldest first.
    pub fn fired(&self) -> Vec<ScheduledNotification> {
        self.fired.lock().expect("scheduler lock poisoned").clone()
    }

    pub fn is_pending(&self, handle: &NotificationHandle) -> bool {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .contains_key(handle)
    }
}

#[async_trait]
impl NotificationScheduler for MemoryScheduler {
    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        content: NotificationContent,
    ) -> Result<Option<NotificationHandle>, NotifyError> {
        if at <= Utc::now() {
            debug!(at = %at, "trigger instant not in the future, dropping");
            return Ok(None);
        }

        let handle = Self::new_handle();
        let notification = ScheduledNotification {
            handle: handle.clone(),
            content,
            trigger_at: Some(at),
        };
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .insert(handle.clone(), notification);
        debug!(handle = %handle, at = %at, "notification scheduled");
        Ok(Some(handle))
    }

    async fn schedule_now(
        &self,
        content: NotificationContent,
    ) -> Result<NotificationHandle, NotifyError> {
        let handle = Self::new_handle();
        self.fired
            .lock()
            .expect("scheduler lock poisoned")
            .push(ScheduledNotification {
                handle: handle.clone(),
                content,
                trigger_at: None,
            });
        debug!(handle = %handle, "notification fired immediately");
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError> {
        let removed = self
            .pending
            .lock()
            .expect("scheduler lock poisoned")
            .remove(handle)
            .is_some();
        debug!(handle = %handle, removed, "cancel requested");
        Ok(())
    }
}
