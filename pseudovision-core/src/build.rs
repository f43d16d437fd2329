//! Transactional orchestration: reap the non-manual suffix, iterate
//! slots to the lookahead horizon, insert events, persist the cursor.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use pseudovision_model::{
    Channel, Event, Playout, PlayoutId, Schedule, ScheduleId, Slot, SlotAnchor, SlotFillMode,
};
use serde_json::Value;
use tracing::{error, info};

use crate::cursor::Cursor;
use crate::dispatcher::{self, DispatchContext};
use crate::error::{CoreError, Result};
use crate::resolver::DEFAULT_MAX_DEPTH;
use crate::time;

/// Safety valve against a schedule whose every slot leaves `next_start`
/// unchanged (legal, e.g. a zero-duration block). Without a cap such a
/// schedule would spin the build loop forever.
const MAX_SLOT_ITERATIONS: u64 = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub lookahead_hours: i64,
    pub zone_id: Tz,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            lookahead_hours: 72,
            zone_id: Tz::UTC,
        }
    }
}

/// Database access the build driver needs beyond what the dispatcher
/// already requires. Implemented by the Postgres repositories, scoped
/// to one transaction per `build` call.
#[async_trait::async_trait]
pub trait BuildContext: DispatchContext {
    async fn load_channel(&self, id: pseudovision_model::ChannelId) -> Result<Option<Channel>>;
    async fn load_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>>;
    async fn load_slots(&self, schedule_id: ScheduleId) -> Result<Vec<Slot>>;

    /// Locks the `playouts` row for the duration of the build, so a
    /// second concurrent build on the same playout blocks rather than
    /// interleaving with this one.
    async fn lock_playout(&self, playout_id: PlayoutId) -> Result<()>;

    /// Deletes automatic events of this playout with `start_at >= now`.
    async fn reap_auto_suffix(&self, playout_id: PlayoutId, now: DateTime<Utc>) -> Result<()>;

    /// Manual events of this playout overlapping `[from, to)`, surviving
    /// the reap above. Used to drop newly produced automatic events that
    /// would collide with one — see DESIGN.md's decision on the
    /// manual/automatic overlap policy.
    async fn load_manual_events_in_range(
        &self,
        playout_id: PlayoutId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    async fn insert_events(&self, events: &[Event]) -> Result<()>;

    async fn save_playout_build(
        &self,
        playout_id: PlayoutId,
        cursor: Value,
        now: DateTime<Utc>,
        success: bool,
        message: Option<String>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// The playout's schedule, or the schedule's slot list, is absent —
    /// returned without mutating anything.
    NoSchedule,
    Built,
    Failed(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildSummary {
    pub outcome: BuildOutcome,
    pub events_emitted: usize,
    pub warnings: Vec<String>,
}

/// Entry point `build(db, opts, playout)`. Rebuilding a playout is the
/// same call again — there is no separate rebuild code path; the
/// auto-suffix reap and cursor continuity make every call idempotent.
pub async fn build(
    ctx: &dyn BuildContext,
    opts: &BuildOptions,
    playout: &Playout,
    now: DateTime<Utc>,
) -> Result<BuildSummary> {
    ctx.lock_playout(playout.id).await?;

    let Some(schedule_id) = playout.schedule_id else {
        return Ok(BuildSummary {
            outcome: BuildOutcome::NoSchedule,
            events_emitted: 0,
            warnings: vec![],
        });
    };
    let Some(schedule) = ctx.load_schedule(schedule_id).await? else {
        return Ok(BuildSummary {
            outcome: BuildOutcome::NoSchedule,
            events_emitted: 0,
            warnings: vec![],
        });
    };
    let slots = ctx.load_slots(schedule_id).await?;
    if slots.is_empty() {
        return Ok(BuildSummary {
            outcome: BuildOutcome::NoSchedule,
            events_emitted: 0,
            warnings: vec![],
        });
    }

    let Some(channel) = ctx.load_channel(playout.channel_id).await? else {
        return Ok(BuildSummary {
            outcome: BuildOutcome::NoSchedule,
            events_emitted: 0,
            warnings: vec![],
        });
    };

    match run_build(ctx, opts, playout, &schedule, &slots, &channel, now).await {
        Ok((events, cursor, warnings)) => {
            let count = events.len();
            ctx.insert_events(&events).await?;
            ctx.save_playout_build(playout.id, cursor.to_json(), now, true, None)
                .await?;
            info!(playout_id = %playout.id, events = count, "playout build committed");
            Ok(BuildSummary {
                outcome: BuildOutcome::Built,
                events_emitted: count,
                warnings,
            })
        }
        Err(err) => {
            let message = err.to_string();
            error!(playout_id = %playout.id, error = %message, "playout build failed");
            // No write happens here: whatever this transaction already
            // did (e.g. reaping the automatic suffix) must be rollback-
            // able, so the failure record itself is persisted by the
            // caller outside this transaction — see
            // `PostgresDatabase::build_playout`.
            Ok(BuildSummary {
                outcome: BuildOutcome::Failed(message),
                events_emitted: 0,
                warnings: vec![],
            })
        }
    }
}

async fn run_build(
    ctx: &dyn BuildContext,
    opts: &BuildOptions,
    playout: &Playout,
    schedule: &Schedule,
    slots: &[Slot],
    channel: &Channel,
    now: DateTime<Utc>,
) -> Result<(Vec<Event>, Cursor, Vec<String>)> {
    let mut cursor = if playout.cursor.is_null() {
        Cursor::init(now)
    } else {
        Cursor::from_json(&playout.cursor)?
    };

    ctx.reap_auto_suffix(playout.id, now).await?;

    let horizon = now + Duration::hours(opts.lookahead_hours);
    let n_slots = slots.len();
    let mut ptr = (cursor.slot_index as usize) % n_slots;
    let mut events = Vec::new();
    let mut warnings = Vec::new();
    let mut iterations: u64 = 0;

    while cursor.next_start <= horizon {
        iterations += 1;
        if iterations > MAX_SLOT_ITERATIONS {
            warnings.push(format!(
                "aborted slot loop after {MAX_SLOT_ITERATIONS} iterations without reaching the horizon"
            ));
            break;
        }

        let slot = &slots[ptr];

        if slot.anchor == SlotAnchor::Fixed
            && schedule.fixed_start_time_behavior == pseudovision_model::FixedStartTimeBehavior::Skip
        {
            if let Some(time_of_day) = slot.start_time {
                let fire = time::next_fixed_fire_time(cursor.next_start, time_of_day, opts.zone_id);
                if fire > cursor.next_start {
                    cursor.next_start = fire;
                }
            }
        }

        let flood_end = if slot.fill_mode == SlotFillMode::Flood {
            next_fixed_anchor_fire_time(slots, ptr, cursor.next_start, opts.zone_id)
        } else {
            None
        };

        let outcome = dispatcher::dispatch_slot(
            ctx,
            slot,
            channel,
            playout.id,
            playout.seed,
            cursor,
            flood_end,
            DEFAULT_MAX_DEPTH,
        )
        .await?;

        cursor = outcome.cursor;
        for event in &outcome.events {
            if !event.is_well_formed() {
                return Err(CoreError::InvariantViolation(format!(
                    "event {} has finish_at <= start_at",
                    event.id
                )));
            }
        }
        events.extend(outcome.events);
        warnings.extend(outcome.warnings);

        ptr = (ptr + 1) % n_slots;
        cursor.advance_slot(n_slots);
    }

    let manual = ctx
        .load_manual_events_in_range(playout.id, now, horizon)
        .await?;
    if !manual.is_empty() {
        let before = events.len();
        events.retain(|e| !manual.iter().any(|m| overlaps(e, m)));
        let dropped = before - events.len();
        if dropped > 0 {
            warnings.push(format!(
                "dropped {dropped} automatic event(s) overlapping a manual event"
            ));
        }
    }

    Ok((events, cursor, warnings))
}

/// Two half-open intervals `[start_at, finish_at)` overlap iff each
/// starts before the other ends. Manual events are never created,
/// modified, or deleted by the build engine, so automatic events are the
/// only side that can yield here.
fn overlaps(a: &Event, b: &Event) -> bool {
    a.start_at < b.finish_at && b.start_at < a.finish_at
}

/// Next fire time of the first later slot (wrapping) whose anchor is
/// `fixed`, or `None` if no slot in the schedule is fixed-anchor.
fn next_fixed_anchor_fire_time(
    slots: &[Slot],
    from_index: usize,
    after: DateTime<Utc>,
    zone: Tz,
) -> Option<DateTime<Utc>> {
    let n = slots.len();
    for offset in 1..=n {
        let idx = (from_index + offset) % n;
        let candidate = &slots[idx];
        if candidate.anchor == SlotAnchor::Fixed {
            if let Some(time_of_day) = candidate.start_time {
                return Some(time::next_fixed_fire_time(after, time_of_day, zone));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_spec_defaults() {
        let opts = BuildOptions::default();
        assert_eq!(opts.lookahead_hours, 72);
        assert_eq!(opts.zone_id, Tz::UTC);
    }
}
