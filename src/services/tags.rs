use uuid::Uuid;

use crate::store::Store;

/// Links each name to the event, creating missing tags on the way.
///
/// Names are processed in order and duplicates produce duplicate links.
/// A failure on one name is logged and the rest are still linked. Returns
/// the number of links written.
pub async fn link_tags(store: &dyn Store, event_id: Uuid, names: &[String]) -> usize {
    let mut linked = 0;

    for name in names {
        let tag = match store.find_tag_by_name(name).await {
            Ok(Some(tag)) => tag,
            Ok(None) => match store.insert_tag(name).await {
                Ok(tag) => tag,
                Err(e) => {
                    tracing::error!(%event_id, tag = %name, error = ?e, "Error creating tag");
                    continue;
                }
            },
            Err(e) => {
                tracing::error!(%event_id, tag = %name, error = ?e, "Error looking up tag");
                continue;
            }
        };

        if let Err(e) = store.link_tag(event_id, tag.id).await {
            tracing::error!(%event_id, tag = %name, error = ?e, "Error linking tag to event");
            continue;
        }
        linked += 1;
    }

    linked
}

/// Drops every existing link, then links `names`.
pub async fn replace_tags(store: &dyn Store, event_id: Uuid, names: &[String]) -> usize {
    match store.clear_event_tags(event_id).await {
        Ok(removed) => tracing::debug!(%event_id, removed, "Cleared event tags"),
        Err(e) => {
            tracing::error!(%event_id, error = ?e, "Error clearing event tags");
        }
    }
    link_tags(store, event_id, names).await
}
