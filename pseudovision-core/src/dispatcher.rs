//! Runs one [`Slot`] under its fill mode, emitting zero-or-more Events.

use chrono::{DateTime, Duration, Utc};
use pseudovision_model::{
    Channel, Event, EventId, EventKind, FillerPreset, MediaItemId, PlayableItem, PlayoutId, Slot,
    SlotFillMode, TailMode,
};
use tracing::warn;

use crate::enumerator::Enumerator;
use crate::error::{CoreError, Result};
use crate::filler;
use crate::resolver::{self, CollectionSource, DEFAULT_MAX_DEPTH};
use crate::Cursor;

/// Everything the dispatcher needs to load content beyond collection
/// resolution: the slot's single-item content source, and filler preset
/// rows by id. Implemented by the Postgres repositories.
#[async_trait::async_trait]
pub trait DispatchContext: CollectionSource {
    async fn load_media_item(&self, id: MediaItemId) -> Result<Option<PlayableItem>>;
    async fn load_filler_preset(&self, id: pseudovision_model::FillerPresetId) -> Result<Option<FillerPreset>>;
}

pub struct DispatchOutcome {
    pub events: Vec<Event>,
    pub cursor: Cursor,
    pub warnings: Vec<String>,
}

/// Load the ordered item list for a slot's content source: either the
/// slot's collection (via the resolver) or its single media item.
async fn load_slot_items(
    ctx: &dyn DispatchContext,
    slot: &Slot,
    max_depth: u8,
) -> Result<(Vec<PlayableItem>, Vec<String>)> {
    if let Some(collection_id) = slot.collection_id {
        let resolution = resolver::resolve(ctx, collection_id, max_depth).await?;
        Ok((resolution.items, resolution.warnings))
    } else if let Some(media_item_id) = slot.media_item_id {
        match ctx.load_media_item(media_item_id).await? {
            Some(item) => Ok((vec![item], vec![])),
            None => Ok((
                vec![],
                vec![format!("media item {media_item_id} not found")],
            )),
        }
    } else {
        Ok((vec![], vec![]))
    }
}

/// Resolve and load the filler preset for `role`, applying slot-override
/// → channel-default → none, then build its own enumerator from the
/// cursor.
async fn load_role_enumerator(
    ctx: &dyn DispatchContext,
    cursor: &Cursor,
    channel: &Channel,
    slot_override: Option<pseudovision_model::FillerPresetId>,
    seed: i64,
    max_depth: u8,
) -> Result<Option<(FillerPreset, Enumerator, String)>> {
    let Some(preset_id) =
        filler::resolve_preset_id(slot_override, channel.default_filler_preset_id)
    else {
        return Ok(None);
    };
    let Some(preset) = ctx.load_filler_preset(preset_id).await? else {
        warn!(%preset_id, "filler preset referenced but not found");
        return Ok(None);
    };
    let key = preset.collection_key();
    let (items, _warnings) = if let Some(collection_id) = preset.collection_id {
        let resolution = resolver::resolve(ctx, collection_id, max_depth).await?;
        (resolution.items, resolution.warnings)
    } else if let Some(media_item_id) = preset.media_item_id {
        match ctx.load_media_item(media_item_id).await? {
            Some(item) => (vec![item], vec![]),
            None => (vec![], vec![]),
        }
    } else {
        (vec![], vec![])
    };
    let enumerator = cursor.get_enumerator(&key, items, Default::default(), seed);
    Ok(Some((preset, enumerator, key)))
}

/// Dispatch one slot, returning the events it produced plus the cursor
/// advanced past it. `flood_end` is the precomputed fire time of the
/// next fixed-anchor slot; only consulted when `slot.fill_mode ==
/// Flood`.
#[allow(clippy::too_many_arguments)]
pub async fn dispatch_slot(
    ctx: &dyn DispatchContext,
    slot: &Slot,
    channel: &Channel,
    playout_id: PlayoutId,
    seed: i64,
    mut cursor: Cursor,
    flood_end: Option<DateTime<Utc>>,
    max_depth: u8,
) -> Result<DispatchOutcome> {
    let (items, mut warnings) = load_slot_items(ctx, slot, max_depth).await?;
    let key = slot.collection_key();
    let mut enumerator = cursor.get_enumerator(&key, items, slot.playback_order, seed);

    let events = match slot.fill_mode {
        SlotFillMode::Once => dispatch_once(&mut enumerator, slot, playout_id, &mut cursor),
        SlotFillMode::Count => dispatch_count(&mut enumerator, slot, playout_id, &mut cursor),
        SlotFillMode::Block => {
            dispatch_block(ctx, &mut enumerator, slot, channel, playout_id, seed, &mut cursor, max_depth)
                .await?
        }
        SlotFillMode::Flood => {
            dispatch_flood(&mut enumerator, slot, playout_id, &mut cursor, flood_end)
        }
    };

    cursor.save_enumerator(&key, &enumerator);

    if events.is_empty() && enumerator.is_empty() {
        warnings.push(format!("slot {} has an empty content source", slot.id));
    }

    Ok(DispatchOutcome {
        events,
        cursor,
        warnings,
    })
}

fn dispatch_once(
    enumerator: &mut Enumerator,
    slot: &Slot,
    playout_id: PlayoutId,
    cursor: &mut Cursor,
) -> Vec<Event> {
    let guide_group = cursor.bump_guide_group();
    match enumerator.next() {
        Some(item) => {
            let start_at = cursor.next_start;
            let finish_at = start_at + item.duration;
            cursor.next_start = finish_at;
            vec![Event {
                id: EventId::new(),
                playout_id,
                media_item_id: Some(item.media_item_id),
                kind: EventKind::Content,
                start_at,
                finish_at,
                guide_group,
                slot_id: Some(slot.id),
                is_manual: false,
                custom_title: slot.custom_title.clone(),
                in_point: None,
                out_point: None,
            }]
        }
        None => vec![],
    }
}

fn dispatch_count(
    enumerator: &mut Enumerator,
    slot: &Slot,
    playout_id: PlayoutId,
    cursor: &mut Cursor,
) -> Vec<Event> {
    let guide_group = cursor.bump_guide_group();
    let n = slot.item_count.unwrap_or(0);
    let mut events = Vec::with_capacity(n.max(0) as usize);
    let mut cur = cursor.next_start;
    for _ in 0..n {
        let Some(item) = enumerator.next() else {
            break;
        };
        let finish_at = cur + item.duration;
        events.push(Event {
            id: EventId::new(),
            playout_id,
            media_item_id: Some(item.media_item_id),
            kind: EventKind::Content,
            start_at: cur,
            finish_at,
            guide_group,
            slot_id: Some(slot.id),
            is_manual: false,
            custom_title: slot.custom_title.clone(),
            in_point: None,
            out_point: None,
        });
        cur = finish_at;
    }
    cursor.next_start = cur;
    events
}

#[allow(clippy::too_many_arguments)]
async fn dispatch_block(
    ctx: &dyn DispatchContext,
    enumerator: &mut Enumerator,
    slot: &Slot,
    channel: &Channel,
    playout_id: PlayoutId,
    seed: i64,
    cursor: &mut Cursor,
    max_depth: u8,
) -> Result<Vec<Event>> {
    let guide_group = cursor.bump_guide_group();
    let duration = slot.block_duration.unwrap_or_else(Duration::zero);
    let block_end = cursor.next_start + duration;
    let mut events = Vec::new();
    let mut cur = cursor.next_start;

    while cur < block_end {
        let Some(item) = enumerator.peek_next() else {
            break;
        };
        if cur + item.duration > block_end {
            break;
        }
        let drawn = enumerator.next().expect("peek_next confirmed an item");
        let finish_at = cur + drawn.duration;
        events.push(Event {
            id: EventId::new(),
            playout_id,
            media_item_id: Some(drawn.media_item_id),
            kind: EventKind::Content,
            start_at: cur,
            finish_at,
            guide_group,
            slot_id: Some(slot.id),
            is_manual: false,
            custom_title: slot.custom_title.clone(),
            in_point: None,
            out_point: None,
        });
        cur = finish_at;
    }

    if cur < block_end {
        match slot.tail_mode {
            TailMode::None => {}
            TailMode::Filler => {
                if let Some((_preset, mut tail_enumerator, tail_key)) = load_role_enumerator(
                    ctx,
                    cursor,
                    channel,
                    slot.filler_tail_id,
                    seed,
                    max_depth,
                )
                .await?
                {
                    let tail_events = filler::duration_fill(
                        &mut tail_enumerator,
                        playout_id,
                        slot.id,
                        EventKind::Tail,
                        guide_group,
                        cur,
                        block_end,
                    );
                    cursor.save_enumerator(&tail_key, &tail_enumerator);
                    events.extend(tail_events);
                }
            }
            TailMode::Offline => {
                events.push(Event {
                    id: EventId::new(),
                    playout_id,
                    media_item_id: None,
                    kind: EventKind::Offline,
                    start_at: cur,
                    finish_at: block_end,
                    guide_group,
                    slot_id: Some(slot.id),
                    is_manual: false,
                    custom_title: None,
                    in_point: None,
                    out_point: None,
                });
            }
        }
    }

    cursor.next_start = block_end;
    Ok(events)
}

/// Fallback flood length used when no later fixed-anchor slot exists to
/// bound it.
const FLOOD_FALLBACK: Duration = Duration::hours(2);

fn dispatch_flood(
    enumerator: &mut Enumerator,
    slot: &Slot,
    playout_id: PlayoutId,
    cursor: &mut Cursor,
    flood_end: Option<DateTime<Utc>>,
) -> Vec<Event> {
    let guide_group = cursor.bump_guide_group();
    let end = flood_end.unwrap_or(cursor.next_start + FLOOD_FALLBACK);
    let mut events = Vec::new();
    let mut cur = cursor.next_start;

    while cur < end {
        let Some(item) = enumerator.peek_next() else {
            break;
        };
        if cur + item.duration > end {
            break;
        }
        let drawn = enumerator.next().expect("peek_next confirmed an item");
        let finish_at = cur + drawn.duration;
        events.push(Event {
            id: EventId::new(),
            playout_id,
            media_item_id: Some(drawn.media_item_id),
            kind: EventKind::Content,
            start_at: cur,
            finish_at,
            guide_group,
            slot_id: Some(slot.id),
            is_manual: false,
            custom_title: slot.custom_title.clone(),
            in_point: None,
            out_point: None,
        });
        cur = finish_at;
    }

    cursor.next_start = end;
    events
}

/// An unrecognized `fill_mode` value loaded from storage (should be
/// unreachable given the enum's closed variant set, but kept as a
/// defensive entry point for forward-compatible schema migrations).
pub fn unknown_fill_mode(slot: &Slot, mode: impl Into<String>) -> CoreError {
    CoreError::UnknownFillMode {
        slot_id: slot.id.to_string(),
        mode: mode.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pseudovision_model::{
        Collection, CollectionId, FillerPresetId, FillerRole, PlaybackOrder, SlotAnchor, SlotId,
    };
    use std::collections::HashMap;

    struct FakeCtx {
        collections: HashMap<CollectionId, Collection>,
        manual: HashMap<CollectionId, Vec<PlayableItem>>,
        presets: HashMap<FillerPresetId, FillerPreset>,
    }

    #[async_trait]
    impl CollectionSource for FakeCtx {
        async fn load_collection(&self, id: CollectionId) -> Result<Option<Collection>> {
            Ok(self.collections.get(&id).cloned())
        }

        async fn manual_items(&self, id: CollectionId) -> Result<Vec<PlayableItem>> {
            Ok(self.manual.get(&id).cloned().unwrap_or_default())
        }

        async fn trakt_items(&self, _id: CollectionId) -> Result<Vec<PlayableItem>> {
            Ok(vec![])
        }
    }

    #[async_trait]
    impl DispatchContext for FakeCtx {
        async fn load_media_item(&self, _id: MediaItemId) -> Result<Option<PlayableItem>> {
            Ok(None)
        }

        async fn load_filler_preset(&self, id: FillerPresetId) -> Result<Option<FillerPreset>> {
            Ok(self.presets.get(&id).cloned())
        }
    }

    fn item(n: i32, minutes: i64) -> PlayableItem {
        PlayableItem {
            media_item_id: MediaItemId::new(),
            title: n.to_string(),
            parent_id: None,
            position: n,
            duration: Duration::minutes(minutes),
        }
    }

    fn block_slot(schedule_id: pseudovision_model::ScheduleId) -> Slot {
        Slot {
            id: SlotId::new(),
            schedule_id,
            slot_index: 0,
            anchor: SlotAnchor::Sequential,
            start_time: None,
            fill_mode: SlotFillMode::Block,
            item_count: None,
            block_duration: Some(Duration::hours(1)),
            tail_mode: TailMode::None,
            collection_id: None,
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

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn block_with_no_tail_leaves_a_gap_before_the_boundary() {
        let schedule_id = pseudovision_model::ScheduleId::new();
        let collection_id = CollectionId::new();
        let mut slot = block_slot(schedule_id);
        slot.collection_id = Some(collection_id);
        let ctx = FakeCtx {
            collections: HashMap::from([(
                collection_id,
                Collection::new("thirty-min-movies", pseudovision_model::CollectionKind::Manual),
            )]),
            manual: HashMap::from([(collection_id, vec![item(1, 40)])]),
            presets: HashMap::new(),
        };
        let mut cursor = Cursor::init(t0());
        let outcome = dispatch_slot(&ctx, &slot, &channel(), PlayoutId::new(), 0, cursor.clone(), None, 8)
            .await
            .unwrap();
        cursor = outcome.cursor;
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].finish_at, t0() + Duration::minutes(40));
        assert_eq!(cursor.next_start, t0() + Duration::hours(1));
    }

    #[tokio::test]
    async fn block_with_offline_tail_fills_the_remainder() {
        let schedule_id = pseudovision_model::ScheduleId::new();
        let collection_id = CollectionId::new();
        let mut slot = block_slot(schedule_id);
        slot.collection_id = Some(collection_id);
        slot.tail_mode = TailMode::Offline;
        let ctx = FakeCtx {
            collections: HashMap::from([(
                collection_id,
                Collection::new("thirty-min-movies", pseudovision_model::CollectionKind::Manual),
            )]),
            manual: HashMap::from([(collection_id, vec![item(1, 40)])]),
            presets: HashMap::new(),
        };
        let cursor = Cursor::init(t0());
        let outcome = dispatch_slot(&ctx, &slot, &channel(), PlayoutId::new(), 0, cursor, None, 8)
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 2);
        let offline = &outcome.events[1];
        assert_eq!(offline.kind, EventKind::Offline);
        assert!(offline.media_item_id.is_none());
        assert_eq!(offline.start_at, t0() + Duration::minutes(40));
        assert_eq!(offline.finish_at, t0() + Duration::hours(1));
    }

    #[tokio::test]
    async fn block_with_filler_tail_draws_from_the_filler_preset() {
        let schedule_id = pseudovision_model::ScheduleId::new();
        let collection_id = CollectionId::new();
        let filler_collection_id = CollectionId::new();
        let preset_id = FillerPresetId::new();
        let mut slot = block_slot(schedule_id);
        slot.collection_id = Some(collection_id);
        slot.tail_mode = TailMode::Filler;
        slot.filler_tail_id = Some(preset_id);

        let preset = FillerPreset {
            id: preset_id,
            name: "tail-shorts".into(),
            role: FillerRole::Tail,
            mode: pseudovision_model::FillerMode::Duration,
            count: None,
            pad_to_nearest_minute: None,
            collection_id: Some(filler_collection_id),
            media_item_id: None,
        };

        let ctx = FakeCtx {
            collections: HashMap::from([
                (
                    collection_id,
                    Collection::new("movies", pseudovision_model::CollectionKind::Manual),
                ),
                (
                    filler_collection_id,
                    Collection::new("shorts", pseudovision_model::CollectionKind::Manual),
                ),
            ]),
            manual: HashMap::from([
                (collection_id, vec![item(1, 40)]),
                (filler_collection_id, vec![item(2, 10), item(3, 10)]),
            ]),
            presets: HashMap::from([(preset_id, preset)]),
        };
        let cursor = Cursor::init(t0());
        let outcome = dispatch_slot(&ctx, &slot, &channel(), PlayoutId::new(), 0, cursor, None, 8)
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 3);
        assert_eq!(outcome.events[1].kind, EventKind::Tail);
        assert_eq!(outcome.events[2].kind, EventKind::Tail);
        assert_eq!(outcome.events.last().unwrap().finish_at, t0() + Duration::hours(1));
    }

    fn channel() -> Channel {
        Channel {
            id: pseudovision_model::ChannelId::new(),
            name: "test".into(),
            number: 1,
            schedule_id: None,
            default_filler_preset_id: None,
            created_at: t0(),
            updated_at: t0(),
        }
    }
}
