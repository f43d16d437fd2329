use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{CollectionKind, FillerMode, FillerRole};
use crate::ids::{CollectionId, FillerPresetId, MediaItemId};
use uuid::Uuid;

fn parse_id_array(value: Option<&Value>) -> Vec<CollectionId> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse::<Uuid>().ok())
                .map(CollectionId::from)
                .collect()
        })
        .unwrap_or_default()
}

/// A named container resolving to an ordered list of [`crate::MediaItem`]s.
///
/// `config` holds kind-specific payload: `{items: [...]}` for
/// `playlist`, `{members: [...]}` for `multi`, and is unused for `manual`
/// and `trakt` (those resolve via a junction table join instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub kind: CollectionKind,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: impl Into<String>, kind: CollectionKind) -> Self {
        let now = Utc::now();
        Self {
            id: CollectionId::new(),
            name: name.into(),
            kind,
            config: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// `config.items` for `playlist` collections: an ordered list of child
    /// collection ids to flatten in declaration order.
    pub fn playlist_items(&self) -> Vec<CollectionId> {
        parse_id_array(self.config.get("items"))
    }

    /// `config.members` for `multi` collections: a set of child collection
    /// ids to union in declaration order.
    pub fn multi_members(&self) -> Vec<CollectionId> {
        parse_id_array(self.config.get("members"))
    }
}

/// Request body for `POST /api/collections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub kind: CollectionKind,
    #[serde(default)]
    pub config: Value,
}

/// Request body for `PUT /api/collections/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub config: Option<Value>,
}

/// Junction row backing `manual` collections: an explicit item with an
/// optional custom sort position, ordered by
/// `coalesce(custom_order, item_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct ManualCollectionItem {
    pub collection_id: CollectionId,
    pub media_item_id: MediaItemId,
    pub custom_order: Option<i32>,
}

/// Junction row mapping a `trakt`-kind collection to externally synced
/// media items, joined on a trakt mapping table and ordered by
/// `media_item_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct TraktCollectionItem {
    pub collection_id: CollectionId,
    pub media_item_id: MediaItemId,
}

/// A named filler policy resolved per role: slot-level override →
/// channel-level default → none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct FillerPreset {
    pub id: FillerPresetId,
    pub name: String,
    pub role: FillerRole,
    pub mode: FillerMode,
    /// Required for `mode == Count` or `RandomCount`.
    pub count: Option<i32>,
    /// Required for `mode == PadToMinute`.
    pub pad_to_nearest_minute: Option<i32>,
    pub collection_id: Option<CollectionId>,
    pub media_item_id: Option<MediaItemId>,
}

impl FillerPreset {
    pub fn collection_key(&self) -> String {
        match (self.collection_id, self.media_item_id) {
            (Some(id), _) => format!("collection:{id}"),
            (None, Some(id)) => format!("item:{id}"),
            (None, None) => format!("filler-preset:{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn playlist_items_parses_config() {
        let mut c = Collection::new("p", CollectionKind::Playlist);
        let a = CollectionId::new();
        let b = CollectionId::new();
        c.config = json!({ "items": [a.to_string(), b.to_string()] });
        assert_eq!(c.playlist_items(), vec![a, b]);
    }

    #[test]
    fn multi_members_defaults_empty() {
        let c = Collection::new("m", CollectionKind::Multi);
        assert!(c.multi_members().is_empty());
    }
}
