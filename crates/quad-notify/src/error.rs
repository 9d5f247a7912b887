use thiserror::Error;

/// Errors produced by the notification layer.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Failure reported by the platform scheduler.
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}
