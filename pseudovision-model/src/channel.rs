use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, FillerPresetId, ScheduleId};

/// A named broadcast stream with a stable external identifier and a sort
/// ordinal. At most one active [`crate::Playout`] exists per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(sqlx::FromRow)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub number: i32,
    pub schedule_id: Option<ScheduleId>,
    /// Channel-level fallback filler preset, used when a slot has no
    /// per-role override.
    pub default_filler_preset_id: Option<FillerPresetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        let now = Utc::now();
        Self {
            id: ChannelId::new(),
            name: name.into(),
            number,
            schedule_id: None,
            default_filler_preset_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for `POST /api/channels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub number: i32,
    pub schedule_id: Option<ScheduleId>,
    pub default_filler_preset_id: Option<FillerPresetId>,
}

/// Request body for `PUT /api/channels/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChannelRequest {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub schedule_id: Option<ScheduleId>,
    pub default_filler_preset_id: Option<FillerPresetId>,
}
