//! Strongly typed identifiers for every top-level entity.
//!
//! Each id wraps a [`Uuid`] so that, say, a `ChannelId` can never be passed
//! where a `ScheduleId` is expected even though both are UUIDs underneath.

use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        #[derive(sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(ChannelId);
uuid_id!(ScheduleId);
uuid_id!(SlotId);
uuid_id!(PlayoutId);
uuid_id!(EventId);
uuid_id!(CollectionId);
uuid_id!(MediaItemId);
uuid_id!(FillerPresetId);
