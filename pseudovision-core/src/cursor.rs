//! Full resumption state for one playout.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use pseudovision_model::PlaybackOrder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enumerator::{Enumerator, EnumeratorState};
use crate::error::{CoreError, Result};
use pseudovision_model::PlayableItem;

/// Resumption state for a playout build, persisted as a JSON blob on the
/// `playouts.cursor` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor {
    /// Wall-clock of the next event to schedule.
    pub next_start: DateTime<Utc>,
    /// Position in the schedule's slot list.
    pub slot_index: i32,
    /// Remaining items in a `count` slot mid-flight. Not presently
    /// consulted by the build loop — see DESIGN.md's decision on
    /// slot-pointer resumption.
    pub count_remaining: Option<i32>,
    pub block_ends_at: Option<DateTime<Utc>>,
    pub in_flood: bool,
    pub in_duration_filler: bool,
    /// Monotonic counter handed out as each slot's `guide_group`.
    pub next_guide_group: i32,
    pub enumerator_states: HashMap<String, EnumeratorState>,
}

impl Cursor {
    /// Fresh cursor at `start`, with empty enumerator state and
    /// `next_guide_group = 1`.
    pub fn init(start: DateTime<Utc>) -> Self {
        Self {
            next_start: start,
            slot_index: 0,
            count_remaining: None,
            block_ends_at: None,
            in_flood: false,
            in_duration_filler: false,
            next_guide_group: 1,
            enumerator_states: HashMap::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).expect("Cursor always serializes")
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::InvariantViolation(format!("malformed cursor: {e}")))
    }

    /// Restore the enumerator bucketed under `key` if one exists, else
    /// build a fresh one seeded from `default_seed`.
    pub fn get_enumerator(
        &self,
        key: &str,
        items: Vec<PlayableItem>,
        order: PlaybackOrder,
        default_seed: i64,
    ) -> Enumerator {
        match self.enumerator_states.get(key) {
            Some(state) => Enumerator::from_state(items, state.clone()),
            None => Enumerator::new(items, order, default_seed),
        }
    }

    /// Persist an enumerator's projection back under `key`.
    pub fn save_enumerator(&mut self, key: &str, enumerator: &Enumerator) {
        self.enumerator_states
            .insert(key.to_string(), enumerator.to_state());
    }

    /// Hand out the current `next_guide_group` and advance the counter.
    pub fn bump_guide_group(&mut self) -> i32 {
        let current = self.next_guide_group;
        self.next_guide_group += 1;
        current
    }

    /// Advance the slot pointer by one, wrapping modulo `n_slots`.
    pub fn advance_slot(&mut self, n_slots: usize) {
        if n_slots == 0 {
            return;
        }
        self.slot_index = ((self.slot_index as i64 + 1).rem_euclid(n_slots as i64)) as i32;
    }

    pub fn advance_next_start(&mut self, by: Duration) {
        self.next_start += by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_through_json() {
        let mut cursor = Cursor::init(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        cursor.bump_guide_group();
        cursor.advance_slot(3);
        let json = cursor.to_json();
        let restored = Cursor::from_json(&json).unwrap();
        assert_eq!(restored.next_start, cursor.next_start);
        assert_eq!(restored.slot_index, cursor.slot_index);
        assert_eq!(restored.next_guide_group, cursor.next_guide_group);
    }

    #[test]
    fn advance_slot_wraps() {
        let mut cursor = Cursor::init(Utc::now());
        cursor.slot_index = 2;
        cursor.advance_slot(3);
        assert_eq!(cursor.slot_index, 0);
    }

    #[test]
    fn bump_guide_group_returns_pre_increment_value() {
        let mut cursor = Cursor::init(Utc::now());
        assert_eq!(cursor.bump_guide_group(), 1);
        assert_eq!(cursor.bump_guide_group(), 2);
        assert_eq!(cursor.next_guide_group, 3);
    }
}
