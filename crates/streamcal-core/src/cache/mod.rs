//! In-memory cache for remotely sourced data.
//!
//! This module provides the `CacheStore`, a process-wide keyed store of
//! JSON values stamped with the time they were fetched. It is created once
//! at startup and shared by `Arc`; nothing is evicted, entries are
//! overwritten whenever a newer fetch lands.
//!
//! - `CacheStore`: get/set plus freshness and staleness checks
//! - `InFlight`: one async lock per key so a cold key is fetched once
//! - `Clock`: injectable time source (`SystemClock`, `ManualClock`)

pub mod clock;
pub mod flight;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use flight::InFlight;
pub use store::{CacheEntry, CacheStore, CachedData};
