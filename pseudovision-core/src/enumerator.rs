//! A finite, restartable, looping iterator over a fixed item vector.

use pseudovision_model::{PlaybackOrder, PlayableItem};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// The enumerator's projection onto the [`crate::Cursor`] — everything
/// needed to resume iteration after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorState {
    pub index: u64,
    pub seed: i64,
    pub playback_order: PlaybackOrder,
}

/// Restartable iterator over `items`, selecting a playback order.
///
/// `index` is a monotonic, non-wrapping counter; the actual item slot is
/// `index mod items.len()`. The permutation used by `shuffle`/`random` is
/// computed lazily and deterministically from `seed`, so restoring from a
/// cursor never needs to persist the permutation itself.
#[derive(Clone)]
pub struct Enumerator {
    items: Vec<PlayableItem>,
    order: PlaybackOrder,
    index: u64,
    seed: i64,
    permutation: Option<Vec<usize>>,
}

impl Enumerator {
    pub fn new(mut items: Vec<PlayableItem>, order: PlaybackOrder, seed: i64) -> Self {
        if order == PlaybackOrder::SeasonEpisode {
            items.sort_by_key(|item| (item.parent_id.map(|id| id.as_uuid()), item.position));
        }

        Self {
            items,
            order,
            index: 0,
            seed,
            permutation: None,
        }
    }

    /// Rebuild an enumerator from its cursor projection plus the current
    /// item list.
    pub fn from_state(items: Vec<PlayableItem>, state: EnumeratorState) -> Self {
        let mut e = Self::new(items, state.playback_order, state.seed);
        e.index = state.index;
        e
    }

    pub fn to_state(&self) -> EnumeratorState {
        EnumeratorState {
            index: self.index,
            seed: self.seed,
            playback_order: self.order,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Draw the next item, advancing internal state. Returns `None` for
    /// the empty enumerator; callers MUST terminate their loop rather
    /// than spin.
    pub fn next(&mut self) -> Option<PlayableItem> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }

        let slot = match self.order {
            PlaybackOrder::Chronological | PlaybackOrder::SeasonEpisode => {
                (self.index as usize) % n
            }
            PlaybackOrder::Shuffle => {
                let perm = self.permutation_or_init(n);
                perm[(self.index as usize) % n]
            }
            PlaybackOrder::Random => {
                let at_boundary = self.index as usize % n == 0;
                if at_boundary {
                    if self.index > 0 {
                        self.seed += 1;
                    }
                    self.permutation = Some(Self::build_permutation(self.seed, n));
                } else if self.permutation.is_none() {
                    self.permutation = Some(Self::build_permutation(self.seed, n));
                }
                let perm = self.permutation.as_ref().unwrap();
                perm[(self.index as usize) % n]
            }
        };

        self.index += 1;
        self.items.get(slot).cloned()
    }

    /// What [`Self::next`] would return, without consuming it. Used by
    /// the filler engine to check whether an item's duration would cross
    /// a boundary before committing to drawing it. Computes the target
    /// slot directly instead of cloning the whole enumerator (its item
    /// list can be large), rebuilding a permutation only when `next`
    /// would also have to.
    pub fn peek_next(&self) -> Option<PlayableItem> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }

        let slot = match self.order {
            PlaybackOrder::Chronological | PlaybackOrder::SeasonEpisode => {
                (self.index as usize) % n
            }
            PlaybackOrder::Shuffle => match &self.permutation {
                Some(perm) => perm[(self.index as usize) % n],
                None => Self::build_permutation(self.seed, n)[(self.index as usize) % n],
            },
            PlaybackOrder::Random => {
                let at_boundary = self.index as usize % n == 0;
                let perm = if at_boundary {
                    let seed = if self.index > 0 { self.seed + 1 } else { self.seed };
                    Self::build_permutation(seed, n)
                } else {
                    match &self.permutation {
                        Some(perm) => perm.clone(),
                        None => Self::build_permutation(self.seed, n),
                    }
                };
                perm[(self.index as usize) % n]
            }
        };

        self.items.get(slot).cloned()
    }

    fn permutation_or_init(&mut self, n: usize) -> &Vec<usize> {
        if self.permutation.is_none() {
            self.permutation = Some(Self::build_permutation(self.seed, n));
        }
        self.permutation.as_ref().unwrap()
    }

    fn build_permutation(seed: i64, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = Pcg64::seed_from_u64(seed as u64);
        indices.shuffle(&mut rng);
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pseudovision_model::MediaItemId;

    fn fixture(ids: &[i32]) -> Vec<PlayableItem> {
        ids.iter()
            .map(|i| PlayableItem {
                media_item_id: MediaItemId::new(),
                title: i.to_string(),
                parent_id: None,
                position: *i,
                duration: Duration::minutes(20),
            })
            .collect()
    }

    #[test]
    fn chronological_wraps() {
        let items = fixture(&[1, 2, 3]);
        let mut e = Enumerator::new(items, PlaybackOrder::Chronological, 0);
        let positions: Vec<i32> = (0..4).map(|_| e.next().unwrap().position).collect();
        assert_eq!(positions, vec![1, 2, 3, 1]);
    }

    #[test]
    fn shuffle_is_deterministic_for_same_seed() {
        let a = fixture(&[1, 2, 3, 4, 5]);
        let b = a.clone();
        let mut ea = Enumerator::new(a, PlaybackOrder::Shuffle, 99);
        let mut eb = Enumerator::new(b, PlaybackOrder::Shuffle, 99);
        assert_eq!(ea.next().unwrap().position, eb.next().unwrap().position);
    }

    #[test]
    fn cursor_restore_continues_from_saved_index() {
        let items = fixture(&[1, 2, 3]);
        let mut e = Enumerator::new(items.clone(), PlaybackOrder::Chronological, 0);
        e.next();
        e.next();
        let state = e.to_state();
        let mut restored = Enumerator::from_state(items, state);
        assert_eq!(restored.next().unwrap().position, 3);
    }

    #[test]
    fn empty_enumerator_yields_nothing() {
        let mut e = Enumerator::new(vec![], PlaybackOrder::Chronological, 0);
        assert!(e.next().is_none());
        assert!(e.is_empty());
    }

    #[test]
    fn random_reshuffles_at_pass_boundary() {
        let items = fixture(&[1, 2, 3]);
        let mut e = Enumerator::new(items, PlaybackOrder::Random, 1);
        for _ in 0..3 {
            e.next();
        }
        let seed_before = e.seed;
        e.next();
        assert_eq!(e.seed, seed_before + 1);
    }
}
