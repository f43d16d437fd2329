//! Postgres-backed implementation of the build engine's data-access
//! traits, following `ferrex-core::database::postgres::PostgresDatabase`'s
//! shape: a pooled connection wrapper, plus one transaction-scoped
//! context object used for the duration of a single build.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pseudovision_model::{
    Channel, ChannelId, Collection, Event, FillerPreset, FillerPresetId, MediaItemId, PlayableItem,
    Playout, PlayoutId, Schedule, ScheduleId, Slot, SlotAnchor, SlotFillMode, SlotId, TailMode,
};
use serde_json::Value;
use sqlx::postgres::types::PgInterval;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::info;

use crate::build::{BuildContext, BuildOptions, BuildSummary};
use crate::database::interval::from_pg_interval;
use crate::dispatcher::DispatchContext;
use crate::error::{CoreError, Result};
use crate::resolver::CollectionSource;
use crate::{build, time::Clock};

/// Pooled connection to the Pseudovision schema, analogous to
/// `ferrex-core`'s `PostgresDatabase`.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

/// Migration set embedded at compile time, shared between
/// [`PostgresDatabase::migrate`] and `#[sqlx::test(migrator =
/// "pseudovision_core::database::postgres::MIGRATOR")]` integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

impl PostgresDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        info!("connected to Postgres");
        Ok(Self { pool })
    }

    /// Wrap an already-migrated pool, e.g. the one `#[sqlx::test]` hands
    /// an integration test.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::InvariantViolation(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run one playout build end to end, inside a single transaction
    /// that is committed on success and rolled back on failure or
    /// `no_schedule`. The playout row is locked for the whole build so a
    /// second concurrent build on the same playout blocks instead of
    /// interleaving. On failure, the failure record is written in a
    /// separate statement after the rollback: it must survive even
    /// though everything else this transaction did (e.g. reaping the
    /// automatic suffix) must not.
    pub async fn build_playout(
        &self,
        opts: &BuildOptions,
        playout: &Playout,
        clock: &dyn Clock,
    ) -> Result<BuildSummary> {
        let tx = self.pool.begin().await?;
        let ctx = TransactionContext { tx: Mutex::new(tx) };
        let now = clock.now();
        let summary = build::build(&ctx, opts, playout, now).await?;
        let tx = ctx.tx.into_inner();
        match &summary.outcome {
            crate::build::BuildOutcome::Built => tx.commit().await?,
            crate::build::BuildOutcome::NoSchedule => tx.rollback().await?,
            crate::build::BuildOutcome::Failed(message) => {
                tx.rollback().await?;
                self.record_build_failure(playout.id, playout.cursor.clone(), now, message.clone())
                    .await?;
            }
        }
        Ok(summary)
    }

    /// Persist a build failure outside any in-flight build transaction,
    /// so it survives that transaction's rollback.
    async fn record_build_failure(
        &self,
        playout_id: PlayoutId,
        cursor: Value,
        now: DateTime<Utc>,
        message: String,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE playouts SET cursor = $2, last_built_at = $3, build_success = false, \
             build_message = $4 WHERE id = $1",
        )
        .bind(playout_id)
        .bind(cursor)
        .bind(now)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Scopes every query issued during one build to a single transaction.
/// Trait methods take `&self`, so the transaction is wrapped in a mutex
/// rather than threaded by value through each call.
struct TransactionContext {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[derive(FromRow)]
struct PlayableItemRow {
    media_item_id: MediaItemId,
    title: String,
    parent_id: Option<MediaItemId>,
    position: i32,
    duration: PgInterval,
}

impl From<PlayableItemRow> for PlayableItem {
    fn from(row: PlayableItemRow) -> Self {
        PlayableItem {
            media_item_id: row.media_item_id,
            title: row.title,
            parent_id: row.parent_id,
            position: row.position,
            duration: from_pg_interval(row.duration),
        }
    }
}

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
    filler_pre_id: Option<FillerPresetId>,
    filler_mid_id: Option<FillerPresetId>,
    filler_post_id: Option<FillerPresetId>,
    filler_tail_id: Option<FillerPresetId>,
    filler_fallback_id: Option<FillerPresetId>,
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

const PLAYABLE_ITEM_COLUMNS: &str =
    "mi.id AS media_item_id, mi.title, mi.parent_id, mi.position, mv.duration";

#[async_trait]
impl CollectionSource for TransactionContext {
    async fn load_collection(&self, id: pseudovision_model::CollectionId) -> Result<Option<Collection>> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    async fn manual_items(&self, collection_id: pseudovision_model::CollectionId) -> Result<Vec<PlayableItem>> {
        let mut tx = self.tx.lock().await;
        let sql = format!(
            "SELECT {PLAYABLE_ITEM_COLUMNS} FROM manual_collection_items mci \
             JOIN media_items mi ON mi.id = mci.media_item_id \
             JOIN media_versions mv ON mv.media_item_id = mi.id \
             WHERE mci.collection_id = $1 \
             ORDER BY mci.custom_order NULLS LAST, mi.id"
        );
        let rows = sqlx::query_as::<_, PlayableItemRow>(&sql)
            .bind(collection_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows.into_iter().map(PlayableItem::from).collect())
    }

    async fn trakt_items(&self, collection_id: pseudovision_model::CollectionId) -> Result<Vec<PlayableItem>> {
        let mut tx = self.tx.lock().await;
        let sql = format!(
            "SELECT {PLAYABLE_ITEM_COLUMNS} FROM trakt_collection_items tci \
             JOIN media_items mi ON mi.id = tci.media_item_id \
             JOIN media_versions mv ON mv.media_item_id = mi.id \
             WHERE tci.collection_id = $1 \
             ORDER BY mi.id"
        );
        let rows = sqlx::query_as::<_, PlayableItemRow>(&sql)
            .bind(collection_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows.into_iter().map(PlayableItem::from).collect())
    }
}

#[async_trait]
impl DispatchContext for TransactionContext {
    async fn load_media_item(&self, id: MediaItemId) -> Result<Option<PlayableItem>> {
        let mut tx = self.tx.lock().await;
        let sql = format!(
            "SELECT {PLAYABLE_ITEM_COLUMNS} FROM media_items mi \
             JOIN media_versions mv ON mv.media_item_id = mi.id \
             WHERE mi.id = $1"
        );
        let row = sqlx::query_as::<_, PlayableItemRow>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(PlayableItem::from))
    }

    async fn load_filler_preset(&self, id: FillerPresetId) -> Result<Option<FillerPreset>> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, FillerPreset>("SELECT * FROM filler_presets WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl BuildContext for TransactionContext {
    async fn load_channel(&self, id: ChannelId) -> Result<Option<Channel>> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    async fn load_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>> {
        let mut tx = self.tx.lock().await;
        let row = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    async fn load_slots(&self, schedule_id: ScheduleId) -> Result<Vec<Slot>> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT * FROM slots WHERE schedule_id = $1 ORDER BY slot_index",
        )
        .bind(schedule_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(Slot::from).collect())
    }

    async fn lock_playout(&self, playout_id: PlayoutId) -> Result<()> {
        let mut tx = self.tx.lock().await;
        sqlx::query("SELECT id FROM playouts WHERE id = $1 FOR UPDATE")
            .bind(playout_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn reap_auto_suffix(&self, playout_id: PlayoutId, now: DateTime<Utc>) -> Result<()> {
        let mut tx = self.tx.lock().await;
        sqlx::query(
            "DELETE FROM events WHERE playout_id = $1 AND start_at >= $2 AND is_manual = false",
        )
        .bind(playout_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn load_manual_events_in_range(
        &self,
        playout_id: PlayoutId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE playout_id = $1 AND is_manual = true \
             AND start_at < $3 AND finish_at > $2",
        )
        .bind(playout_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows)
    }

    async fn insert_events(&self, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut tx = self.tx.lock().await;
        for event in events {
            sqlx::query(
                "INSERT INTO events \
                 (id, playout_id, media_item_id, kind, start_at, finish_at, guide_group, \
                  slot_id, is_manual, custom_title, in_point, out_point) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(event.id)
            .bind(event.playout_id)
            .bind(event.media_item_id)
            .bind(event.kind)
            .bind(event.start_at)
            .bind(event.finish_at)
            .bind(event.guide_group)
            .bind(event.slot_id)
            .bind(event.is_manual)
            .bind(&event.custom_title)
            .bind(event.in_point)
            .bind(event.out_point)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn save_playout_build(
        &self,
        playout_id: PlayoutId,
        cursor: Value,
        now: DateTime<Utc>,
        success: bool,
        message: Option<String>,
    ) -> Result<()> {
        let mut tx = self.tx.lock().await;
        sqlx::query(
            "UPDATE playouts SET cursor = $2, last_built_at = $3, build_success = $4, \
             build_message = $5 WHERE id = $1",
        )
        .bind(playout_id)
        .bind(cursor)
        .bind(now)
        .bind(success)
        .bind(message)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

