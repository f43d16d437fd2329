//! Expands a [`Collection`] reference into an ordered item list.

use async_trait::async_trait;
use pseudovision_model::{Collection, CollectionId, CollectionKind, PlayableItem};
use tracing::warn;

use crate::error::Result;

/// Default bound on `playlist`/`multi` recursion depth. Cycles between
/// collections are not detected, so resolution past this depth stops and
/// records a warning rather than overflowing the stack.
pub const DEFAULT_MAX_DEPTH: u8 = 8;

/// Database access the resolver needs, kept narrow so `resolve` can be
/// unit-tested against an in-memory fake.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn load_collection(&self, id: CollectionId) -> Result<Option<Collection>>;

    /// `manual`-kind collections: junction-table join ordered by
    /// `coalesce(custom_order, media_item_id)`.
    async fn manual_items(&self, collection_id: CollectionId) -> Result<Vec<PlayableItem>>;

    /// `trakt`-kind collections: junction-table join ordered by
    /// `media_item_id`.
    async fn trakt_items(&self, collection_id: CollectionId) -> Result<Vec<PlayableItem>>;
}

/// Outcome of resolving a collection: the flattened item list plus any
/// non-fatal warnings accumulated along the way (deferred kinds,
/// recursion-depth overflow).
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    pub items: Vec<PlayableItem>,
    pub warnings: Vec<String>,
}

/// Resolve `collection_id` to its ordered item list.
pub async fn resolve(
    source: &dyn CollectionSource,
    collection_id: CollectionId,
    max_depth: u8,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    resolve_into(source, collection_id, max_depth, &mut resolution).await?;
    Ok(resolution)
}

async fn resolve_into(
    source: &dyn CollectionSource,
    collection_id: CollectionId,
    remaining_depth: u8,
    out: &mut Resolution,
) -> Result<()> {
    let Some(collection) = source.load_collection(collection_id).await? else {
        let msg = format!("collection {collection_id} not found");
        warn!(%collection_id, "collection not found during resolution");
        out.warnings.push(msg);
        return Ok(());
    };

    match collection.kind {
        CollectionKind::Manual => {
            out.items.extend(source.manual_items(collection_id).await?);
        }
        CollectionKind::Trakt => {
            out.items.extend(source.trakt_items(collection_id).await?);
        }
        CollectionKind::Playlist => {
            if remaining_depth == 0 {
                let msg = format!(
                    "playlist {collection_id} exceeded max recursion depth; truncating"
                );
                warn!(%collection_id, "playlist recursion depth exceeded");
                out.warnings.push(msg);
                return Ok(());
            }
            for child in collection.playlist_items() {
                Box::pin(resolve_into(source, child, remaining_depth - 1, out)).await?;
            }
        }
        CollectionKind::Multi => {
            if remaining_depth == 0 {
                let msg =
                    format!("multi {collection_id} exceeded max recursion depth; truncating");
                warn!(%collection_id, "multi recursion depth exceeded");
                out.warnings.push(msg);
                return Ok(());
            }
            for child in collection.multi_members() {
                Box::pin(resolve_into(source, child, remaining_depth - 1, out)).await?;
            }
        }
        CollectionKind::Smart | CollectionKind::Rerun => {
            let msg = format!(
                "collection {collection_id} has deferred kind {:?}; resolves empty",
                collection.kind
            );
            warn!(%collection_id, kind = ?collection.kind, "deferred collection kind");
            out.warnings.push(msg);
        }
    }

    Ok(())
}
