//! Reminder policy for RSVP'd events.
//!
//! All helpers here are best-effort: scheduler failures are logged and
//! reported as "no notification", never propagated, so a flaky platform
//! scheduler can not block an RSVP.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use quad_shared::constants::REMINDER_LEAD_MINUTES;
use quad_shared::Event;

use crate::scheduler::{NotificationContent, NotificationHandle, NotificationScheduler};

/// Schedule the "starts in 1 hour" reminder for an event the user just
/// RSVP'd to.
///
/// Returns `None` without scheduling when the reminder instant is not
/// strictly in the future (near-past or imminent events get no reminder).
pub async fn schedule_event_reminder(
    scheduler: &dyn NotificationScheduler,
    event: &Event,
) -> Option<NotificationHandle> {
    let reminder_time = event.timestamp - Duration::minutes(REMINDER_LEAD_MINUTES);
    if reminder_time <= Utc::now() {
        debug!(event = %event.id, "reminder time already passed, not scheduling");
        return None;
    }

    let content = NotificationContent {
        title: format!("🚀 Event Reminder: {}", event.title),
        body: format!("Your event starts in 1 hour at {}", event.location),
        data: json!({
            "eventId": event.id,
            "eventTitle": event.title,
            "type": "event_reminder",
        }),
    };

    match scheduler.schedule_at(reminder_time, content).await {
        Ok(Some(handle)) => {
            info!(event = %event.id, at = %reminder_time, "scheduled event reminder");
            Some(handle)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(event = %event.id, error = %e, "failed to schedule event reminder");
            None
        }
    }
}

/// Best-effort cancel of a reminder whose RSVP was withdrawn.
pub async fn cancel_event_reminder(
    scheduler: &dyn NotificationScheduler,
    handle: &NotificationHandle,
) {
    match scheduler.cancel(handle).await {
        Ok(()) => info!(handle = %handle, "cancelled event reminder"),
        Err(e) => warn!(handle = %handle, error = %e, "failed to cancel event reminder"),
    }
}

/// Fire the "new RSVP for your event" notification.
///
/// The scheduler is local-device-only, so despite being addressed to the
/// event creator this only ever appears on the acting user's own device;
/// there is no push fan-out.
pub async fn schedule_rsvp_notification(
    scheduler: &dyn NotificationScheduler,
    event: &Event,
    attendee_name: &str,
) -> Option<NotificationHandle> {
    let content = NotificationContent {
        title: format!("👋 New RSVP for {}", event.title),
        body: format!("{attendee_name} just RSVP'd to your event!"),
        data: json!({
            "eventId": event.id,
            "eventTitle": event.title,
            "type": "rsvp_notification",
        }),
    };

    match scheduler.schedule_now(content).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(event = %event.id, error = %e, "failed to fire RSVP notification");
            None
        }
    }
}
