//! Discriminator enums backing the `collections`, `slots`, `events`, and
//! filler-preset tables. Each mirrors a Postgres enum type of the same
//! name (see `pseudovision-core/migrations`).
//!
//! Out of scope and intentionally absent here: `media_source_kind`,
//! `library_kind`, `stream_kind`, `streaming_mode`, `subtitle_mode`,
//! `artwork_kind`, `guide_mode` — these back the scanner/transcoding/EPG
//! rendering surfaces treated as external collaborators, not the build
//! engine.

use serde::{Deserialize, Serialize};

macro_rules! db_enum {
    ($name:ident, $pg_name:literal, { $($variant:ident => $pg:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[derive(sqlx::Type)]
        #[sqlx(type_name = $pg_name, rename_all = "snake_case")]
        pub enum $name {
            $(
                #[serde(rename = $pg)]
                $variant,
            )+
        }
    };
}

db_enum!(SlotAnchor, "slot_anchor", {
    Fixed => "fixed",
    Sequential => "sequential",
});

db_enum!(SlotFillMode, "slot_fill_mode", {
    Once => "once",
    Count => "count",
    Block => "block",
    Flood => "flood",
});

db_enum!(TailMode, "tail_mode", {
    None => "none",
    Filler => "filler",
    Offline => "offline",
});

db_enum!(PlaybackOrder, "playback_order", {
    Chronological => "chronological",
    Shuffle => "shuffle",
    Random => "random",
    SeasonEpisode => "season_episode",
});

impl Default for PlaybackOrder {
    fn default() -> Self {
        PlaybackOrder::Chronological
    }
}

db_enum!(FixedStartTimeBehavior, "fixed_start_time_behavior", {
    Skip => "skip",
    Play => "play",
});

db_enum!(CollectionKind, "collection_kind", {
    Manual => "manual",
    Playlist => "playlist",
    Multi => "multi",
    Trakt => "trakt",
    Smart => "smart",
    Rerun => "rerun",
});

db_enum!(EventKind, "event_kind", {
    Content => "content",
    Pre => "pre",
    Mid => "mid",
    Post => "post",
    Pad => "pad",
    Tail => "tail",
    Fallback => "fallback",
    Offline => "offline",
});

db_enum!(FillerRole, "filler_role", {
    Pre => "pre",
    Mid => "mid",
    Post => "post",
    Tail => "tail",
    Fallback => "fallback",
});

db_enum!(FillerMode, "filler_mode", {
    Duration => "duration",
    Count => "count",
    RandomCount => "random_count",
    PadToMinute => "pad_to_minute",
});

impl From<FillerRole> for EventKind {
    fn from(role: FillerRole) -> Self {
        match role {
            FillerRole::Pre => EventKind::Pre,
            FillerRole::Mid => EventKind::Mid,
            FillerRole::Post => EventKind::Post,
            FillerRole::Tail => EventKind::Tail,
            FillerRole::Fallback => EventKind::Fallback,
        }
    }
}
