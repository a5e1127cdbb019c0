//! Data models for the schedule site.
//!
//! - `Member`: a creator in the group, with platform channel links
//! - `ScheduleItem`, `ScheduleDraft`, `ScheduleStatus`: daily broadcast plans
//! - `DDayItem`: anniversary markers overlaid on calendar cells
//! - `Notice`: banner notices and events
//! - `Clip`, `Vod`, `Video`: externally sourced media, tagged with the owning member

pub mod dday;
pub mod media;
pub mod member;
pub mod notice;
pub mod schedule;

pub use dday::{DDayItem, DDayType};
pub use media::{ChannelMedia, Clip, Video, Vod};
pub use member::{active_members, Member};
pub use notice::{active_notices, Notice, NoticeType};
pub use schedule::{ScheduleDraft, ScheduleItem, ScheduleStatus};
