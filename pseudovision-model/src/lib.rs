//! Core data model definitions shared across Pseudovision crates.
#![allow(missing_docs)]

pub mod channel;
pub mod collection;
pub mod enums;
pub mod error;
pub mod ids;
pub mod media;
pub mod playout;
pub mod schedule;

pub use channel::{Channel, CreateChannelRequest, UpdateChannelRequest};
pub use collection::{
    Collection, CreateCollectionRequest, FillerPreset, ManualCollectionItem,
    TraktCollectionItem, UpdateCollectionRequest,
};
pub use enums::{
    CollectionKind, EventKind, FillerMode, FillerRole, FixedStartTimeBehavior,
    PlaybackOrder, SlotAnchor, SlotFillMode, TailMode,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    ChannelId, CollectionId, EventId, FillerPresetId, MediaItemId, PlayoutId,
    ScheduleId, SlotId,
};
pub use media::{MediaItem, MediaVersion, PlayableItem};
pub use playout::{
    CreateManualEventRequest, Event, Playout, UpdateManualEventRequest,
};
pub use schedule::{
    CreateScheduleRequest, CreateSlotRequest, Schedule, Slot, UpdateScheduleRequest,
    UpdateSlotRequest,
};
