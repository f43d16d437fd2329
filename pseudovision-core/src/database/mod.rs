//! Data access layer for the build engine, mirroring
//! `ferrex-core::database`'s `ports` + `postgres` split, scaled down to
//! the handful of repositories this system needs.

pub mod interval;
pub mod postgres;
pub mod repo;

pub use interval::{from_pg_interval, to_pg_interval};
pub use postgres::{PostgresDatabase, MIGRATOR};
