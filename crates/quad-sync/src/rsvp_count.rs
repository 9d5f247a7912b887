//! Live count of events the signed-in user is attending.
//!
//! A continuous subscription over the user's `rsvps` subcollection; the
//! count is the snapshot's cardinality, recomputed on every change. No
//! user means count 0 and no subscription at all.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use quad_shared::CurrentUser;
use quad_store::{paths, DocumentStore};

#[derive(Debug, Clone, Copy)]
pub struct RsvpCountState {
    pub count: usize,
    pub loading: bool,
}

/// Owns the subscription task; dropping (or [`close`](Self::close)-ing)
/// the counter tears the subscription down; leaving it open would leak a
/// listener on the store.
pub struct RsvpCounter {
    state: watch::Receiver<RsvpCountState>,
    task: Option<JoinHandle<()>>,
}

impl RsvpCounter {
    /// Start counting for `user`, or settle at 0 when there is none.
    ///
    /// A failure to establish the subscription is logged and settles the
    /// counter at 0, matching the catalog's swallow-and-empty policy.
    pub async fn open(store: Arc<dyn DocumentStore>, user: Option<&CurrentUser>) -> Self {
        let (tx, rx) = watch::channel(RsvpCountState {
            count: 0,
            loading: true,
        });

        let Some(user) = user else {
            tx.send_replace(RsvpCountState {
                count: 0,
                loading: false,
            });
            return Self {
                state: rx,
                task: None,
            };
        };

        let collection = paths::user_rsvps(&user.uid);
        let mut stream = match store.subscribe(&collection, None).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(user = %user.uid, error = %e, "failed to subscribe to RSVP count");
                tx.send_replace(RsvpCountState {
                    count: 0,
                    loading: false,
                });
                return Self {
                    state: rx,
                    task: None,
                };
            }
        };

        let uid = user.uid.clone();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = stream.next().await {
                tx.send_replace(RsvpCountState {
                    count: snapshot.len(),
                    loading: false,
                });
            }
            debug!(user = %uid, "RSVP count subscription ended");
        });

        Self {
            state: rx,
            task: Some(task),
        }
    }

    pub fn count(&self) -> usize {
        self.state.borrow().count
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn watch(&self) -> watch::Receiver<RsvpCountState> {
        self.state.clone()
    }

    /// Tear down the subscription now instead of waiting for drop.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RsvpCounter {
    fn drop(&mut self) {
        self.close();
    }
}
