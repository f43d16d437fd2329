//! Pool-scoped CRUD for Channels, Schedules, Slots, Collections,
//! Playouts, and manual Events, backing the HTTP surface. Separate from
//! [`super::postgres::TransactionContext`], which only ever runs inside
//! one build's transaction: these methods each open their own short
//! transaction or single statement, the way `ferrex-core`'s repository
//! methods do outside a scan/build.

use chrono::{DateTime, Utc};
use pseudovision_model::{
    Channel, Collection, CreateChannelRequest, CreateCollectionRequest, CreateScheduleRequest,
    CreateSlotRequest, Event, EventId, MediaItemId, Playout, Schedule, ScheduleId, Slot, SlotId,
    SlotAnchor, SlotFillMode, TailMode, UpdateChannelRequest, UpdateCollectionRequest,
    UpdateManualEventRequest, UpdateScheduleRequest, UpdateSlotRequest,
};
use sqlx::postgres::types::PgInterval;
use sqlx::FromRow;

use super::interval::{from_pg_interval, to_pg_interval};
use super::postgres::PostgresDatabase;
use crate::error::{CoreError, Result};

#[derive(FromRow)]
struct SlotRow {
    id: SlotId,
    schedule_id: ScheduleId,
    slot_index: i32,
    anchor: SlotAnchor,
    start_time: Option<PgInterval>,
    fill_mode: SlotFillMode,
    item_count: Option<i32>,
    block_duration: Option<PgInterval>,
    tail_mode: TailMode,
    collection_id: Option<pseudovision_model::CollectionId>,
    media_item_id: Option<MediaItemId>,
    playback_order: pseudovision_model::PlaybackOrder,
    filler_pre_id: Option<pseudovision_model::FillerPresetId>,
    filler_mid_id: Option<pseudovision_model::FillerPresetId>,
    filler_post_id: Option<pseudovision_model::FillerPresetId>,
    filler_tail_id: Option<pseudovision_model::FillerPresetId>,
    filler_fallback_id: Option<pseudovision_model::FillerPresetId>,
    custom_title: Option<String>,
}

impl From<SlotRow> for Slot {
    fn from(row: SlotRow) -> Self {
        Slot {
            id: row.id,
            schedule_id: row.schedule_id,
            slot_index: row.slot_index,
            anchor: row.anchor,
            start_time: row.start_time.map(from_pg_interval),
            fill_mode: row.fill_mode,
            item_count: row.item_count,
            block_duration: row.block_duration.map(from_pg_interval),
            tail_mode: row.tail_mode,
            collection_id: row.collection_id,
            media_item_id: row.media_item_id,
            playback_order: row.playback_order,
            filler_pre_id: row.filler_pre_id,
            filler_mid_id: row.filler_mid_id,
            filler_post_id: row.filler_post_id,
            filler_tail_id: row.filler_tail_id,
            filler_fallback_id: row.filler_fallback_id,
            custom_title: row.custom_title,
        }
    }
}

impl PostgresDatabase {
    // ---- Channels --------------------------------------------------

    pub async fn create_channel(&self, req: CreateChannelRequest) -> Result<Channel> {
        let channel = Channel {
            id: pseudovision_model::ChannelId::new(),
            name: req.name,
            number: req.number,
            schedule_id: req.schedule_id,
            default_filler_preset_id: req.default_filler_preset_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO channels (id, name, number, schedule_id, default_filler_preset_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(channel.number)
        .bind(channel.schedule_id)
        .bind(channel.default_filler_preset_id)
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .execute(self.pool())
        .await?;
        Ok(channel)
    }

    pub async fn get_channel(&self, id: pseudovision_model::ChannelId) -> Result<Option<Channel>> {
        let row = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        let rows = sqlx::query_as::<_, Channel>("SELECT * FROM channels ORDER BY number")
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn update_channel(
        &self,
        id: pseudovision_model::ChannelId,
        req: UpdateChannelRequest,
    ) -> Result<Option<Channel>> {
        let Some(mut channel) = self.get_channel(id).await? else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            channel.name = name;
        }
        if let Some(number) = req.number {
            channel.number = number;
        }
        if req.schedule_id.is_some() {
            channel.schedule_id = req.schedule_id;
        }
        if req.default_filler_preset_id.is_some() {
            channel.default_filler_preset_id = req.default_filler_preset_id;
        }
        channel.updated_at = Utc::now();
        sqlx::query(
            "UPDATE channels SET name = $2, number = $3, schedule_id = $4, \
             default_filler_preset_id = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(channel.id)
        .bind(&channel.name)
        .bind(channel.number)
        .bind(channel.schedule_id)
        .bind(channel.default_filler_preset_id)
        .bind(channel.updated_at)
        .execute(self.pool())
        .await?;
        Ok(Some(channel))
    }

    pub async fn delete_channel(&self, id: pseudovision_model::ChannelId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Schedules ---------------------------------------------------

    pub async fn create_schedule(&self, req: CreateScheduleRequest) -> Result<Schedule> {
        let mut schedule = Schedule::new(req.name);
        if let Some(behavior) = req.fixed_start_time_behavior {
            schedule.fixed_start_time_behavior = behavior;
        }
        schedule.shuffle_slots = req.shuffle_slots.unwrap_or(false);
        schedule.random_start_point = req.random_start_point.unwrap_or(false);
        sqlx::query(
            "INSERT INTO schedules (id, name, fixed_start_time_behavior, shuffle_slots, \
             random_start_point, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(schedule.id)
        .bind(&schedule.name)
        .bind(schedule.fixed_start_time_behavior)
        .bind(schedule.shuffle_slots)
        .bind(schedule.random_start_point)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(self.pool())
        .await?;
        Ok(schedule)
    }

    pub async fn get_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>> {
        let row = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn update_schedule(
        &self,
        id: ScheduleId,
        req: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>> {
        let Some(mut schedule) = self.get_schedule(id).await? else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            schedule.name = name;
        }
        if let Some(behavior) = req.fixed_start_time_behavior {
            schedule.fixed_start_time_behavior = behavior;
        }
        if let Some(shuffle) = req.shuffle_slots {
            schedule.shuffle_slots = shuffle;
        }
        if let Some(random_start) = req.random_start_point {
            schedule.random_start_point = random_start;
        }
        schedule.updated_at = Utc::now();
        sqlx::query(
            "UPDATE schedules SET name = $2, fixed_start_time_behavior = $3, \
             shuffle_slots = $4, random_start_point = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(schedule.id)
        .bind(&schedule.name)
        .bind(schedule.fixed_start_time_behavior)
        .bind(schedule.shuffle_slots)
        .bind(schedule.random_start_point)
        .bind(schedule.updated_at)
        .execute(self.pool())
        .await?;
        Ok(Some(schedule))
    }

    pub async fn delete_schedule(&self, id: ScheduleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Slots ---------------------------------------------------------

    pub async fn create_slot(&self, schedule_id: ScheduleId, req: CreateSlotRequest) -> Result<Slot> {
        let slot = Slot {
            id: SlotId::new(),
            schedule_id,
            slot_index: req.slot_index,
            anchor: req.anchor,
            start_time: req.start_time,
            fill_mode: req.fill_mode,
            item_count: req.item_count,
            block_duration: req.block_duration,
            tail_mode: req.tail_mode.unwrap_or(TailMode::None),
            collection_id: req.collection_id,
            media_item_id: req.media_item_id,
            playback_order: req.playback_order.unwrap_or_default(),
            filler_pre_id: req.filler_pre_id,
            filler_mid_id: req.filler_mid_id,
            filler_post_id: req.filler_post_id,
            filler_tail_id: req.filler_tail_id,
            filler_fallback_id: req.filler_fallback_id,
            custom_title: req.custom_title,
        };
        // Mirrors the database constraint so a bad slot is rejected
        // before the insert rather than by a driver error.
        slot.validate()?;
        self.insert_slot(&slot).await?;
        Ok(slot)
    }

    async fn insert_slot(&self, slot: &Slot) -> Result<()> {
        sqlx::query(
            "INSERT INTO slots (id, schedule_id, slot_index, anchor, start_time, fill_mode, \
             item_count, block_duration, tail_mode, collection_id, media_item_id, \
             playback_order, filler_pre_id, filler_mid_id, filler_post_id, filler_tail_id, \
             filler_fallback_id, custom_title) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(slot.id)
        .bind(slot.schedule_id)
        .bind(slot.slot_index)
        .bind(slot.anchor)
        .bind(slot.start_time.map(to_pg_interval))
        .bind(slot.fill_mode)
        .bind(slot.item_count)
        .bind(slot.block_duration.map(to_pg_interval))
        .bind(slot.tail_mode)
        .bind(slot.collection_id)
        .bind(slot.media_item_id)
        .bind(slot.playback_order)
        .bind(slot.filler_pre_id)
        .bind(slot.filler_mid_id)
        .bind(slot.filler_post_id)
        .bind(slot.filler_tail_id)
        .bind(slot.filler_fallback_id)
        .bind(&slot.custom_title)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_slot(&self, id: SlotId) -> Result<Option<Slot>> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Slot::from))
    }

    pub async fn list_slots(&self, schedule_id: ScheduleId) -> Result<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT * FROM slots WHERE schedule_id = $1 ORDER BY slot_index",
        )
        .bind(schedule_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Slot::from).collect())
    }

    pub async fn update_slot(&self, id: SlotId, req: UpdateSlotRequest) -> Result<Option<Slot>> {
        let Some(mut slot) = self.get_slot(id).await? else {
            return Ok(None);
        };
        if let Some(v) = req.slot_index {
            slot.slot_index = v;
        }
        if let Some(v) = req.anchor {
            slot.anchor = v;
        }
        if req.start_time.is_some() {
            slot.start_time = req.start_time;
        }
        if let Some(v) = req.fill_mode {
            slot.fill_mode = v;
        }
        if req.item_count.is_some() {
            slot.item_count = req.item_count;
        }
        if req.block_duration.is_some() {
            slot.block_duration = req.block_duration;
        }
        if let Some(v) = req.tail_mode {
            slot.tail_mode = v;
        }
        if req.collection_id.is_some() {
            slot.collection_id = req.collection_id;
            slot.media_item_id = None;
        }
        if req.media_item_id.is_some() {
            slot.media_item_id = req.media_item_id;
            slot.collection_id = None;
        }
        if let Some(v) = req.playback_order {
            slot.playback_order = v;
        }
        if req.filler_pre_id.is_some() {
            slot.filler_pre_id = req.filler_pre_id;
        }
        if req.filler_mid_id.is_some() {
            slot.filler_mid_id = req.filler_mid_id;
        }
        if req.filler_post_id.is_some() {
            slot.filler_post_id = req.filler_post_id;
        }
        if req.filler_tail_id.is_some() {
            slot.filler_tail_id = req.filler_tail_id;
        }
        if req.filler_fallback_id.is_some() {
            slot.filler_fallback_id = req.filler_fallback_id;
        }
        if req.custom_title.is_some() {
            slot.custom_title = req.custom_title;
        }
        slot.validate()?;

        sqlx::query(
            "UPDATE slots SET slot_index = $2, anchor = $3, start_time = $4, fill_mode = $5, \
             item_count = $6, block_duration = $7, tail_mode = $8, collection_id = $9, \
             media_item_id = $10, playback_order = $11, filler_pre_id = $12, filler_mid_id = $13, \
             filler_post_id = $14, filler_tail_id = $15, filler_fallback_id = $16, \
             custom_title = $17 WHERE id = $1",
        )
        .bind(slot.id)
        .bind(slot.slot_index)
        .bind(slot.anchor)
        .bind(slot.start_time.map(to_pg_interval))
        .bind(slot.fill_mode)
        .bind(slot.item_count)
        .bind(slot.block_duration.map(to_pg_interval))
        .bind(slot.tail_mode)
        .bind(slot.collection_id)
        .bind(slot.media_item_id)
        .bind(slot.playback_order)
        .bind(slot.filler_pre_id)
        .bind(slot.filler_mid_id)
        .bind(slot.filler_post_id)
        .bind(slot.filler_tail_id)
        .bind(slot.filler_fallback_id)
        .bind(&slot.custom_title)
        .execute(self.pool())
        .await?;
        Ok(Some(slot))
    }

    pub async fn delete_slot(&self, id: SlotId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Collections ---------------------------------------------------

    pub async fn create_collection(&self, req: CreateCollectionRequest) -> Result<Collection> {
        let mut collection = Collection::new(req.name, req.kind);
        collection.config = req.config;
        sqlx::query(
            "INSERT INTO collections (id, name, kind, config, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(collection.id)
        .bind(&collection.name)
        .bind(collection.kind)
        .bind(&collection.config)
        .bind(collection.created_at)
        .bind(collection.updated_at)
        .execute(self.pool())
        .await?;
        Ok(collection)
    }

    pub async fn get_collection(
        &self,
        id: pseudovision_model::CollectionId,
    ) -> Result<Option<Collection>> {
        let row = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        let rows = sqlx::query_as::<_, Collection>("SELECT * FROM collections ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn update_collection(
        &self,
        id: pseudovision_model::CollectionId,
        req: UpdateCollectionRequest,
    ) -> Result<Option<Collection>> {
        let Some(mut collection) = self.get_collection(id).await? else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            collection.name = name;
        }
        if let Some(config) = req.config {
            collection.config = config;
        }
        collection.updated_at = Utc::now();
        sqlx::query(
            "UPDATE collections SET name = $2, config = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(collection.id)
        .bind(&collection.name)
        .bind(&collection.config)
        .bind(collection.updated_at)
        .execute(self.pool())
        .await?;
        Ok(Some(collection))
    }

    pub async fn delete_collection(&self, id: pseudovision_model::CollectionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- Playouts --------------------------------------------------------

    pub async fn get_playout_by_channel(
        &self,
        channel_id: pseudovision_model::ChannelId,
    ) -> Result<Option<Playout>> {
        let row = sqlx::query_as::<_, Playout>("SELECT * FROM playouts WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Created once per channel; returns the existing row on conflict of
    /// `channel_id` instead of erroring.
    pub async fn get_or_create_playout(
        &self,
        channel: &Channel,
        seed: i64,
    ) -> Result<Playout> {
        if let Some(playout) = self.get_playout_by_channel(channel.id).await? {
            return Ok(playout);
        }
        let playout = Playout::new(channel.id, channel.schedule_id, seed);
        sqlx::query(
            "INSERT INTO playouts (id, channel_id, schedule_id, seed, cursor) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (channel_id) DO NOTHING",
        )
        .bind(playout.id)
        .bind(playout.channel_id)
        .bind(playout.schedule_id)
        .bind(playout.seed)
        .bind(&playout.cursor)
        .execute(self.pool())
        .await?;
        self.get_playout_by_channel(channel.id)
            .await?
            .ok_or_else(|| CoreError::InvariantViolation("playout upsert returned no row".into()))
    }

    // ---- Events ------------------------------------------------------------

    pub async fn list_upcoming_events(
        &self,
        playout_id: pseudovision_model::PlayoutId,
        from: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE playout_id = $1 AND finish_at > $2 \
             ORDER BY start_at LIMIT $3",
        )
        .bind(playout_id)
        .bind(from)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn create_manual_event(&self, event: &Event) -> Result<()> {
        if !event.is_well_formed() {
            return Err(pseudovision_model::ModelError::InvalidEvent(
                "finish_at must be after start_at".into(),
            )
            .into());
        }
        sqlx::query(
            "INSERT INTO events (id, playout_id, media_item_id, kind, start_at, finish_at, \
             guide_group, slot_id, is_manual, custom_title, in_point, out_point) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(event.playout_id)
        .bind(event.media_item_id)
        .bind(event.kind)
        .bind(event.start_at)
        .bind(event.finish_at)
        .bind(event.guide_group)
        .bind(event.slot_id)
        .bind(&event.custom_title)
        .bind(event.in_point)
        .bind(event.out_point)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_manual_event(&self, id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE id = $1 AND is_manual = true",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// The build engine never creates, modifies, or deletes manual
    /// events; this API path is the only way they change.
    pub async fn update_manual_event(
        &self,
        id: EventId,
        req: UpdateManualEventRequest,
    ) -> Result<Option<Event>> {
        let Some(mut event) = self.get_manual_event(id).await? else {
            return Ok(None);
        };
        if req.media_item_id.is_some() {
            event.media_item_id = req.media_item_id;
        }
        if let Some(kind) = req.kind {
            event.kind = kind;
        }
        if let Some(start_at) = req.start_at {
            event.start_at = start_at;
        }
        if let Some(finish_at) = req.finish_at {
            event.finish_at = finish_at;
        }
        if req.custom_title.is_some() {
            event.custom_title = req.custom_title;
        }
        if req.in_point.is_some() {
            event.in_point = req.in_point;
        }
        if req.out_point.is_some() {
            event.out_point = req.out_point;
        }
        if !event.is_well_formed() {
            return Err(pseudovision_model::ModelError::InvalidEvent(
                "finish_at must be after start_at".into(),
            )
            .into());
        }

        sqlx::query(
            "UPDATE events SET media_item_id = $2, kind = $3, start_at = $4, finish_at = $5, \
             custom_title = $6, in_point = $7, out_point = $8 WHERE id = $1 AND is_manual = true",
        )
        .bind(event.id)
        .bind(event.media_item_id)
        .bind(event.kind)
        .bind(event.start_at)
        .bind(event.finish_at)
        .bind(&event.custom_title)
        .bind(event.in_point)
        .bind(event.out_point)
        .execute(self.pool())
        .await?;
        Ok(Some(event))
    }

    pub async fn delete_manual_event(&self, id: EventId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND is_manual = true")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
