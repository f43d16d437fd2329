//! The Pseudovision Playout Build Engine: compiles a Channel's Schedule
//! plus its prior resumption state into an ordered, transactionally
//! persisted sequence of Events.

pub mod build;
pub mod cursor;
pub mod database;
pub mod dispatcher;
pub mod enumerator;
pub mod error;
pub mod filler;
pub mod resolver;
pub mod time;

pub use build::{build, BuildContext, BuildOptions, BuildOutcome, BuildSummary};
pub use cursor::Cursor;
pub use database::{from_pg_interval, to_pg_interval, PostgresDatabase, MIGRATOR};
pub use dispatcher::{dispatch_slot, DispatchContext};
pub use enumerator::{Enumerator, EnumeratorState};
pub use error::{CoreError, Result as CoreResult};
pub use resolver::{resolve, CollectionSource, Resolution};
pub use time::{Clock, FixedClock, SystemClock};
