//! Observable calendar state for the weekly and daily views.
//!
//! `CalendarView` owns the members, D-Days and schedules for the range on
//! screen and exposes navigation and save/delete entry points. Every change
//! is published as an immutable `CalendarSnapshot` on a watch channel;
//! display code subscribes and reads, it never mutates.

pub mod calendar;
pub mod snapshot;

pub use calendar::CalendarView;
pub use snapshot::{CalendarSnapshot, DayCell, ScheduleDialog, ViewMode, ViewPhase};
