use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::EventKind;
use crate::ids::{ChannelId, EventId, MediaItemId, PlayoutId, ScheduleId, SlotId};

/// The live compiled timeline for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Playout {
    pub id: PlayoutId,
    pub channel_id: ChannelId,
    pub schedule_id: Option<ScheduleId>,
    /// Deterministic randomness root for the `random` playback order and
    /// any shuffle tie-breaking.
    pub seed: i64,
    /// Opaque JSON; see [`crate::Cursor`] for the shape.
    pub cursor: Value,
    pub last_built_at: Option<DateTime<Utc>>,
    pub build_success: Option<bool>,
    pub build_message: Option<String>,
}

impl Playout {
    pub fn new(channel_id: ChannelId, schedule_id: Option<ScheduleId>, seed: i64) -> Self {
        Self {
            id: PlayoutId::new(),
            channel_id,
            schedule_id,
            seed,
            cursor: Value::Null,
            last_built_at: None,
            build_success: None,
            build_message: None,
        }
    }
}

/// One scheduled airing: `[start_at, finish_at)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Event {
    pub id: EventId,
    pub playout_id: PlayoutId,
    /// `None` only for `kind = offline`: an explicit gap with nothing
    /// playing, produced by a block slot's `tail_mode = offline`. Every
    /// other kind references a real media item.
    pub media_item_id: Option<MediaItemId>,
    pub kind: EventKind,
    pub start_at: DateTime<Utc>,
    pub finish_at: DateTime<Utc>,
    /// Groups multi-segment content for EPG rendering; non-decreasing
    /// along `start_at`.
    pub guide_group: i32,
    /// Provenance: which slot produced this event. `None` for manual
    /// events created directly via the API.
    pub slot_id: Option<SlotId>,
    pub is_manual: bool,
    pub custom_title: Option<String>,
    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
}

impl Event {
    /// Every emitted event satisfies `finish_at > start_at`.
    pub fn is_well_formed(&self) -> bool {
        self.finish_at > self.start_at
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finish_at - self.start_at
    }
}

/// Request body for `POST /api/channels/:id/playout/events` — always
/// creates a manual event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManualEventRequest {
    pub media_item_id: MediaItemId,
    pub kind: EventKind,
    pub start_at: DateTime<Utc>,
    pub finish_at: DateTime<Utc>,
    pub custom_title: Option<String>,
    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
}

/// Request body for `PUT /api/channels/:id/playout/events/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateManualEventRequest {
    pub media_item_id: Option<MediaItemId>,
    pub kind: Option<EventKind>,
    pub start_at: Option<DateTime<Utc>>,
    pub finish_at: Option<DateTime<Utc>>,
    pub custom_title: Option<String>,
    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn well_formed_requires_positive_duration() {
        let now = Utc::now();
        let mut ev = Event {
            id: EventId::new(),
            playout_id: PlayoutId::new(),
            media_item_id: Some(MediaItemId::new()),
            kind: EventKind::Content,
            start_at: now,
            finish_at: now + Duration::minutes(30),
            guide_group: 1,
            slot_id: None,
            is_manual: false,
            custom_title: None,
            in_point: None,
            out_point: None,
        };
        assert!(ev.is_well_formed());
        ev.finish_at = now;
        assert!(!ev.is_well_formed());
    }
}
