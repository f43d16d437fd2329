use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    FixedStartTimeBehavior, PlaybackOrder, SlotAnchor, SlotFillMode, TailMode,
};
use crate::error::{ModelError, Result};
use crate::ids::{
    CollectionId, FillerPresetId, MediaItemId, ScheduleId, SlotId,
};

/// A named, reusable ordered sequence of [`Slot`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub fixed_start_time_behavior: FixedStartTimeBehavior,
    pub shuffle_slots: bool,
    pub random_start_point: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ScheduleId::new(),
            name: name.into(),
            fixed_start_time_behavior: FixedStartTimeBehavior::Skip,
            shuffle_slots: false,
            random_start_point: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One entry in a [`Schedule`]. Exactly one of `collection_id` or
/// `media_item_id` must be set.
///
/// Not `sqlx::FromRow`: `start_time`/`block_duration` are stored as
/// Postgres `interval` columns, which decode to
/// `sqlx::postgres::types::PgInterval`, not `chrono::Duration` directly.
/// `pseudovision_core::database` maps the row by hand and converts with
/// `pseudovision_core::database::interval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub schedule_id: ScheduleId,
    /// Position within the schedule; defines iteration order. Unique per
    /// schedule.
    pub slot_index: i32,
    pub anchor: SlotAnchor,
    /// Time-of-day offset from local midnight. Required iff
    /// `anchor == Fixed`.
    pub start_time: Option<Duration>,
    pub fill_mode: SlotFillMode,
    /// Required iff `fill_mode == Count`.
    pub item_count: Option<i32>,
    /// Required iff `fill_mode == Block`.
    pub block_duration: Option<Duration>,
    /// Only meaningful when `fill_mode == Block`.
    pub tail_mode: TailMode,
    pub collection_id: Option<CollectionId>,
    pub media_item_id: Option<MediaItemId>,
    pub playback_order: PlaybackOrder,
    pub filler_pre_id: Option<FillerPresetId>,
    pub filler_mid_id: Option<FillerPresetId>,
    pub filler_post_id: Option<FillerPresetId>,
    pub filler_tail_id: Option<FillerPresetId>,
    pub filler_fallback_id: Option<FillerPresetId>,
    pub custom_title: Option<String>,
}

impl Slot {
    /// Validate the invariants that aren't expressible purely through
    /// the column types (the "exactly one of" constraint, and the
    /// conditional-required fields).
    ///
    /// The database also enforces the exactly-one-of constraint (a check
    /// constraint on `slots`), but it's enforced here too, so a bad slot
    /// is rejected before the insert rather than by a driver error.
    pub fn validate(&self) -> Result<()> {
        match (self.collection_id, self.media_item_id) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(ModelError::InvalidSlot(
                    "exactly one of collection_id or media_item_id must be set"
                        .to_string(),
                ));
            }
        }

        if self.anchor == SlotAnchor::Fixed && self.start_time.is_none() {
            return Err(ModelError::InvalidSlot(
                "fixed-anchor slots require start_time".to_string(),
            ));
        }

        if self.fill_mode == SlotFillMode::Count && self.item_count.is_none()
        {
            return Err(ModelError::InvalidSlot(
                "count slots require item_count".to_string(),
            ));
        }

        if self.fill_mode == SlotFillMode::Block
            && self.block_duration.is_none()
        {
            return Err(ModelError::InvalidSlot(
                "block slots require block_duration".to_string(),
            ));
        }

        Ok(())
    }

    /// The stable string key used to bucket enumerator state in the
    /// [`crate::Cursor`]: `"collection:<id>"` or `"item:<id>"`.
    pub fn collection_key(&self) -> String {
        match (self.collection_id, self.media_item_id) {
            (Some(id), _) => format!("collection:{id}"),
            (None, Some(id)) => format!("item:{id}"),
            (None, None) => unreachable!("Slot::validate guarantees one is set"),
        }
    }
}

/// Request body for creating a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub fixed_start_time_behavior: Option<FixedStartTimeBehavior>,
    pub shuffle_slots: Option<bool>,
    pub random_start_point: Option<bool>,
}

/// Request body for `PUT /api/schedules/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub fixed_start_time_behavior: Option<FixedStartTimeBehavior>,
    pub shuffle_slots: Option<bool>,
    pub random_start_point: Option<bool>,
}

/// Request body for creating or replacing a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub slot_index: i32,
    pub anchor: SlotAnchor,
    pub start_time: Option<Duration>,
    pub fill_mode: SlotFillMode,
    pub item_count: Option<i32>,
    pub block_duration: Option<Duration>,
    pub tail_mode: Option<TailMode>,
    pub collection_id: Option<CollectionId>,
    pub media_item_id: Option<MediaItemId>,
    pub playback_order: Option<PlaybackOrder>,
    pub filler_pre_id: Option<FillerPresetId>,
    pub filler_mid_id: Option<FillerPresetId>,
    pub filler_post_id: Option<FillerPresetId>,
    pub filler_tail_id: Option<FillerPresetId>,
    pub filler_fallback_id: Option<FillerPresetId>,
    pub custom_title: Option<String>,
}

/// Request body for `PUT /api/schedules/:id/slots/:slot_id`. Every field
/// is optional; absent fields leave the stored value unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    pub slot_index: Option<i32>,
    pub anchor: Option<SlotAnchor>,
    pub start_time: Option<Duration>,
    pub fill_mode: Option<SlotFillMode>,
    pub item_count: Option<i32>,
    pub block_duration: Option<Duration>,
    pub tail_mode: Option<TailMode>,
    pub collection_id: Option<CollectionId>,
    pub media_item_id: Option<MediaItemId>,
    pub playback_order: Option<PlaybackOrder>,
    pub filler_pre_id: Option<FillerPresetId>,
    pub filler_mid_id: Option<FillerPresetId>,
    pub filler_post_id: Option<FillerPresetId>,
    pub filler_tail_id: Option<FillerPresetId>,
    pub filler_fallback_id: Option<FillerPresetId>,
    pub custom_title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_slot() -> Slot {
        Slot {
            id: SlotId::new(),
            schedule_id: ScheduleId::new(),
            slot_index: 0,
            anchor: SlotAnchor::Sequential,
            start_time: None,
            fill_mode: SlotFillMode::Once,
            item_count: None,
            block_duration: None,
            tail_mode: TailMode::None,
            collection_id: Some(CollectionId::new()),
            media_item_id: None,
            playback_order: PlaybackOrder::Chronological,
            filler_pre_id: None,
            filler_mid_id: None,
            filler_post_id: None,
            filler_tail_id: None,
            filler_fallback_id: None,
            custom_title: None,
        }
    }

    #[test]
    fn rejects_both_sources_set() {
        let mut slot = base_slot();
        slot.media_item_id = Some(MediaItemId::new());
        assert!(slot.validate().is_err());
    }

    #[test]
    fn rejects_neither_source_set() {
        let mut slot = base_slot();
        slot.collection_id = None;
        assert!(slot.validate().is_err());
    }

    #[test]
    fn fixed_anchor_requires_start_time() {
        let mut slot = base_slot();
        slot.anchor = SlotAnchor::Fixed;
        assert!(slot.validate().is_err());
        slot.start_time = Some(Duration::hours(6));
        assert!(slot.validate().is_ok());
    }

    #[test]
    fn collection_key_prefers_collection() {
        let slot = base_slot();
        assert_eq!(
            slot.collection_key(),
            format!("collection:{}", slot.collection_id.unwrap())
        );
    }
}
