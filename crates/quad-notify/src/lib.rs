//! # quad-notify
//!
//! The local notification boundary of the Quad app: a scheduler trait for
//! time-triggered and immediate device notifications, the reminder policy
//! applied when a user RSVPs to an event, and an in-process scheduler
//! implementation.
//!
//! Delivery is local-device-only. There is no push fan-out: a notification
//! scheduled here fires on the device that scheduled it and nowhere else.

pub mod memory;
pub mod reminders;
pub mod scheduler;

mod error;

pub use error::NotifyError;
pub use memory::MemoryScheduler;
pub use reminders::{cancel_event_reminder, schedule_event_reminder, schedule_rsvp_notification};
pub use scheduler::{NotificationContent, NotificationHandle, NotificationScheduler};
