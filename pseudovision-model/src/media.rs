use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::ids::MediaItemId;

/// Addressable unit of playable content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct MediaItem {
    pub id: MediaItemId,
    pub title: String,
    /// Grouping key for series/season ordering, consumed by
    /// `playback_order = season_episode`, which pre-sorts items by
    /// `(parent_id, position)`. `None` for standalone items.
    pub parent_id: Option<MediaItemId>,
    /// Position within `parent_id`'s ordering (episode number, etc).
    pub position: i32,
}

/// Sidecar row holding the playable duration for a [`MediaItem`]. Kept
/// as its own row (a `media_versions` table keyed on `media_item_id`,
/// carrying a non-negative `duration`) rather than a field folded onto
/// `MediaItem`.
///
/// Not `sqlx::FromRow`: `duration` is a Postgres `interval` column; see
/// the note on [`crate::Slot`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaVersion {
    pub media_item_id: MediaItemId,
    #[serde(with = "duration_as_millis")]
    pub duration: Duration,
}

impl MediaVersion {
    /// Items with zero duration are skippable placeholders.
    pub fn is_placeholder(&self) -> bool {
        self.duration <= Duration::zero()
    }
}

/// A [`MediaItem`] joined with its playable duration — the unit the
/// enumerator, filler engine, and slot dispatcher actually operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayableItem {
    pub media_item_id: MediaItemId,
    pub title: String,
    pub parent_id: Option<MediaItemId>,
    pub position: i32,
    #[serde(with = "duration_as_millis")]
    pub duration: Duration,
}

impl PlayableItem {
    pub fn is_placeholder(&self) -> bool {
        self.duration <= Duration::zero()
    }
}

mod duration_as_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        d: &Duration,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(d)?;
        Ok(Duration::milliseconds(millis))
    }
}
