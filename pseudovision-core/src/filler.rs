//! Selects filler items to bridge gaps.

use chrono::{DateTime, Utc};
use pseudovision_model::{Event, EventId, EventKind, FillerMode, PlayoutId, SlotId};

use crate::enumerator::Enumerator;
use crate::time::next_minute_boundary;

/// Resolve which preset id applies for a role: slot-level override wins,
/// falling back to the channel-level default, else no filler at all.
pub fn resolve_preset_id<T: Copy>(slot_override: Option<T>, channel_default: Option<T>) -> Option<T> {
    slot_override.or(channel_default)
}

fn make_event(
    playout_id: PlayoutId,
    slot_id: SlotId,
    kind: EventKind,
    guide_group: i32,
    item: &pseudovision_model::PlayableItem,
    start_at: DateTime<Utc>,
) -> Event {
    let finish_at = start_at + item.duration;
    Event {
        id: EventId::new(),
        playout_id,
        media_item_id: Some(item.media_item_id),
        kind,
        start_at,
        finish_at,
        guide_group,
        slot_id: Some(slot_id),
        is_manual: false,
        custom_title: None,
        in_point: None,
        out_point: None,
    }
}

/// Draw items from `enumerator` until the next item's duration would
/// cross `to`; no partial items are ever emitted. Returns the emitted
/// events; `enumerator` is advanced in place. An empty enumerator
/// terminates immediately with no events.
pub fn duration_fill(
    enumerator: &mut Enumerator,
    playout_id: PlayoutId,
    slot_id: SlotId,
    kind: EventKind,
    guide_group: i32,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<Event> {
    let mut events = Vec::new();
    if enumerator.is_empty() {
        return events;
    }

    let mut cursor = from;
    loop {
        if cursor >= to {
            break;
        }
        let Some(item) = enumerator.peek_next() else {
            break;
        };
        if cursor + item.duration > to {
            break;
        }
        let drawn = enumerator.next().expect("peek_next already confirmed an item");
        let event = make_event(playout_id, slot_id, kind, guide_group, &drawn, cursor);
        cursor = event.finish_at;
        events.push(event);
    }
    events
}

/// Draw exactly `n` items back-to-back from `from`, irrespective of end
/// time. Returns the emitted events and the instant immediately after
/// the last one.
pub fn count_fill(
    enumerator: &mut Enumerator,
    playout_id: PlayoutId,
    slot_id: SlotId,
    kind: EventKind,
    guide_group: i32,
    from: DateTime<Utc>,
    n: i32,
) -> (Vec<Event>, DateTime<Utc>) {
    let mut events = Vec::with_capacity(n.max(0) as usize);
    let mut cursor = from;
    if enumerator.is_empty() {
        return (events, cursor);
    }
    for _ in 0..n {
        let Some(item) = enumerator.next() else {
            break;
        };
        let event = make_event(playout_id, slot_id, kind, guide_group, &item, cursor);
        cursor = event.finish_at;
        events.push(event);
    }
    (events, cursor)
}

/// Compute the next multiple-of-`minutes` boundary `>= from`, clamped to
/// `ceil`, then delegate to [`duration_fill`] over `[from, target)`.
pub fn pad_to_boundary_fill(
    enumerator: &mut Enumerator,
    playout_id: PlayoutId,
    slot_id: SlotId,
    kind: EventKind,
    guide_group: i32,
    from: DateTime<Utc>,
    ceil: DateTime<Utc>,
    minutes: i64,
) -> Vec<Event> {
    let boundary = next_minute_boundary(from, minutes);
    let target = boundary.min(ceil);
    duration_fill(enumerator, playout_id, slot_id, kind, guide_group, from, target)
}

/// Dispatch a preset's `mode` to the right fill algorithm. `count`
/// applies for both `Count` and `RandomCount` — the distinction lives in
/// how `enumerator`'s playback order was chosen when it was built, not
/// in the fill loop itself.
pub fn fill_by_mode(
    mode: FillerMode,
    enumerator: &mut Enumerator,
    playout_id: PlayoutId,
    slot_id: SlotId,
    kind: EventKind,
    guide_group: i32,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    count: Option<i32>,
    pad_to_nearest_minute: Option<i32>,
) -> Vec<Event> {
    match mode {
        FillerMode::Duration => {
            duration_fill(enumerator, playout_id, slot_id, kind, guide_group, from, to)
        }
        FillerMode::Count | FillerMode::RandomCount => {
            let n = count.unwrap_or(0);
            count_fill(enumerator, playout_id, slot_id, kind, guide_group, from, n).0
        }
        FillerMode::PadToMinute => {
            let minutes = pad_to_nearest_minute.unwrap_or(0) as i64;
            pad_to_boundary_fill(
                enumerator, playout_id, slot_id, kind, guide_group, from, to, minutes,
            )
        }
    }
}
