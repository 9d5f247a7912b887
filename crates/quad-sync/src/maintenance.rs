//! Admin sweeps over the RSVP fan-out.
//!
//! RSVP records live under each user's namespace, so anything event-wide
//! has to visit every user. That scan is linear in the user count, which
//! is fine for a campus but not a large fleet; a production deployment
//! would move these behind a server-side job.

use quad_shared::{EventId, UserId};
use quad_store::{paths, DocumentStore, StoreError};
use tracing::info;

/// Delete every user's RSVP record for a deleted event.
///
/// Event deletion does not cascade on its own, so without this sweep the
/// records (and their stale counts) would linger forever. Returns how
/// many records were removed.
pub async fn cleanup_orphaned_rsvps(
    store: &dyn DocumentStore,
    event_id: &EventId,
) -> Result<usize, StoreError> {
    let users = store.query_collection(paths::USERS, None).await?;

    let mut removed = 0;
    for user_doc in users {
        let collection = paths::user_rsvps(&UserId::new(user_doc.id));
        if store
            .get_document(&collection, event_id.as_str())
            .await?
            .is_some()
        {
            store
                .delete_document(&collection, event_id.as_str())
                .await?;
            removed += 1;
        }
    }

    info!(event = %event_id, removed, "cleaned up orphaned RSVPs");
    Ok(removed)
}

/// How many users hold an RSVP record for `event_id` right now.
pub async fn event_rsvp_count(
    store: &dyn DocumentStore,
    event_id: &EventId,
) -> Result<usize, StoreError> {
    let users = store.query_collection(paths::USERS, None).await?;

    let mut count = 0;
    for user_doc in users {
        let collection = paths::user_rsvps(&UserId::new(user_doc.id));
        if store
            .get_document(&collection, event_id.as_str())
            .await?
            .is_some()
        {
            count += 1;
        }
    }
    Ok(count)
}
