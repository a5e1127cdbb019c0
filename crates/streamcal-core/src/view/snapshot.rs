use chrono::{Duration, NaiveDate};

use crate::models::{active_members, DDayItem, Member, ScheduleDraft, ScheduleItem};
use crate::schedule::{DateRange, SaveIntent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Weekly,
    Daily,
}

impl ViewMode {
    pub fn range_for(&self, anchor: NaiveDate) -> DateRange {
        match self {
            ViewMode::Weekly => DateRange::week_of(anchor),
            ViewMode::Daily => DateRange::day(anchor),
        }
    }

    /// How far `next`/`prev` move the anchor.
    pub fn step(&self) -> Duration {
        match self {
            ViewMode::Weekly => Duration::days(7),
            ViewMode::Daily => Duration::days(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Loading,
    Ready,
}

/// The edit dialog's contents while it is open.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDialog {
    pub draft: ScheduleDraft,
    pub intent: SaveIntent,
}

/// One calendar cell: a date with its schedules and D-Day markers.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub schedules: Vec<ScheduleItem>,
    pub ddays: Vec<DDayItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSnapshot {
    pub mode: ViewMode,
    pub anchor: NaiveDate,
    pub range: DateRange,
    pub today: NaiveDate,
    pub phase: ViewPhase,
    pub members: Vec<Member>,
    pub ddays: Vec<DDayItem>,
    pub schedules: Vec<ScheduleItem>,
    pub dialog: Option<ScheduleDialog>,
    pub alert: Option<String>,
}

impl CalendarSnapshot {
    pub fn new(mode: ViewMode, today: NaiveDate) -> Self {
        Self {
            mode,
            anchor: today,
            range: mode.range_for(today),
            today,
            phase: ViewPhase::Idle,
            members: Vec::new(),
            ddays: Vec::new(),
            schedules: Vec::new(),
            dialog: None,
            alert: None,
        }
    }

    pub fn member(&self, uid: i64) -> Option<&Member> {
        self.members.iter().find(|m| m.uid == uid)
    }

    /// Members shown as calendar rows.
    pub fn active_members(&self) -> Vec<Member> {
        active_members(&self.members)
    }

    pub fn days(&self) -> Vec<DayCell> {
        self.range
            .days()
            .into_iter()
            .map(|date| DayCell {
                date,
                schedules: self.schedules.iter().filter(|s| s.date == date).cloned().collect(),
                ddays: self.ddays.iter().filter(|d| d.occurs_on(date)).cloned().collect(),
            })
            .collect()
    }

    pub fn schedule_for(&self, member_uid: i64, date: NaiveDate) -> Option<&ScheduleItem> {
        self.schedules
            .iter()
            .find(|s| s.member_uid == member_uid && s.date == date)
    }
}
