//! RSVP membership: per (user, event) attendance state, optimistic toggle,
//! and the lifetime of the reminder notification derived from it.
//!
//! Existence of the RSVP record is the sole source of truth for "is
//! attending". Toggles are last-write-wins: two sessions flipping the same
//! pair race, and whichever write commits last sticks. Accepted for this
//! domain, there is no version check.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use quad_notify::{
    cancel_event_reminder, schedule_event_reminder, schedule_rsvp_notification,
    NotificationHandle, NotificationScheduler,
};
use quad_shared::{CurrentUser, Event, EventId, RsvpRecord, RsvpStatus};
use quad_store::{paths, DocumentStore, StoreError};

/// Attendance of one user at one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    /// Not yet read from the store.
    Unknown,
    /// No signed-in user or no event id; terminal, nothing to track.
    Inapplicable,
    NotAttending,
    Attending,
}

#[derive(Debug, Clone, Copy)]
pub struct RsvpState {
    pub attendance: Attendance,
    pub loading: bool,
}

/// Tracks one (user, event) pair.
pub struct RsvpTracker {
    store: Arc<dyn DocumentStore>,
    scheduler: Arc<dyn NotificationScheduler>,
    user: Option<CurrentUser>,
    event_id: Option<EventId>,
    state: watch::Sender<RsvpState>,
    /// Handle of the reminder belonging to the current RSVP, if any.
    reminder: Mutex<Option<NotificationHandle>>,
}

impl RsvpTracker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        scheduler: Arc<dyn NotificationScheduler>,
        user: Option<CurrentUser>,
        event_id: Option<EventId>,
    ) -> Self {
        let (state, _) = watch::channel(RsvpState {
            attendance: Attendance::Unknown,
            loading: true,
        });
        Self {
            store,
            scheduler,
            user,
            event_id,
            state,
            reminder: Mutex::new(None),
        }
    }

    /// Read the RSVP record and settle the attendance state.
    ///
    /// Without a user or event id the tracker settles to
    /// [`Attendance::Inapplicable`] (loading resolves rather than spinning
    /// forever). A store read failure leaves the state untouched and is
    /// returned to the caller.
    pub async fn activate(&self) -> Result<Attendance, StoreError> {
        let (user, event_id) = match (&self.user, &self.event_id) {
            (Some(user), Some(event_id)) => (user, event_id),
            _ => {
                self.settle(Attendance::Inapplicable);
                return Ok(Attendance::Inapplicable);
            }
        };

        let collection = paths::user_rsvps(&user.uid);
        let attendance = match self.store.get_document(&collection, event_id.as_str()).await? {
            Some(doc) => {
                match doc.decode::<RsvpRecord>() {
                    Ok(record) => {
                        *self.reminder.lock().expect("reminder lock poisoned") =
                            record.notification_id.map(NotificationHandle);
                    }
                    Err(e) => {
                        warn!(event = %event_id, error = %e, "undecodable RSVP record, treating as attending");
                    }
                }
                Attendance::Attending
            }
            None => Attendance::NotAttending,
        };

        self.settle(attendance);
        Ok(attendance)
    }

    /// Flip attendance, optimistically: local state changes with the single
    /// store write, no further acknowledgement is awaited.
    ///
    /// When joining with `event_data` supplied, a reminder is scheduled
    /// (1 h before the event, skipped when that instant has passed) and its
    /// handle is embedded in the record before it is persisted; when the
    /// attendee is not the creator, a "new RSVP" notification fires
    /// immediately, on this device only; there is no push fan-out.
    ///
    /// # Errors
    ///
    /// Store write failures are returned to the caller; the local state is
    /// not flipped in that case. Scheduler failures never fail a toggle.
    pub async fn toggle(&self, event_data: Option<&Event>) -> Result<Attendance, StoreError> {
        let (user, event_id) = match (&self.user, &self.event_id) {
            (Some(user), Some(event_id)) => (user, event_id),
            _ => {
                debug!("toggle without user or event id, ignoring");
                return Ok(Attendance::Inapplicable);
            }
        };
        let collection = paths::user_rsvps(&user.uid);

        if self.attendance() == Attendance::Attending {
            self.store
                .delete_document(&collection, event_id.as_str())
                .await?;
            self.settle(Attendance::NotAttending);

            let handle = self.reminder.lock().expect("reminder lock poisoned").take();
            if let Some(handle) = handle {
                cancel_event_reminder(self.scheduler.as_ref(), &handle).await;
            }
            Ok(Attendance::NotAttending)
        } else {
            let now = Utc::now();
            let mut handle = None;
            if let Some(event) = event_data {
                handle = schedule_event_reminder(self.scheduler.as_ref(), event).await;
            }

            let record = RsvpRecord {
                event_id: event_id.clone(),
                created_at: now,
                updated_at: now,
                status: RsvpStatus::Confirmed,
                notification_id: handle.as_ref().map(|h| h.0.clone()),
            };
            self.store
                .set_document(
                    &collection,
                    event_id.as_str(),
                    serde_json::to_value(&record)?,
                )
                .await?;

            *self.reminder.lock().expect("reminder lock poisoned") = handle;
            self.settle(Attendance::Attending);

            if let Some(event) = event_data {
                if event.created_by != user.uid {
                    schedule_rsvp_notification(self.scheduler.as_ref(), event, &user.sender_name())
                        .await;
                }
            }
            Ok(Attendance::Attending)
        }
    }

    pub fn attendance(&self) -> Attendance {
        self.state.borrow().attendance
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn state(&self) -> RsvpState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<RsvpState> {
        self.state.subscribe()
    }

    fn settle(&self, attendance: Attendance) {
        self.state.send_replace(RsvpState {
            attendance,
            loading: false,
        });
    }
}
