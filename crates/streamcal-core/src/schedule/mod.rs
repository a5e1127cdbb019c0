//! Schedule writes and date ranges.
//!
//! - `conflict`: decides whether a proposed write collides with an existing
//!   entry for the same member and day
//! - `range`: Monday-start weeks and single days shown by the calendar
//! - `service`: validate → resolve → write, against the authoritative store

pub mod conflict;
pub mod range;
pub mod service;

pub use conflict::{resolve, ConflictError, Resolution, SaveIntent};
pub use range::DateRange;
pub use service::ScheduleService;
