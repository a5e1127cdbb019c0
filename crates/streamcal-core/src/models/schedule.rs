use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest title the admin console accepts.
const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ScheduleStatus {
    #[serde(rename = "방송")]
    Live,
    #[serde(rename = "휴방")]
    Off,
    #[serde(rename = "게릴라")]
    Surprise,
    #[serde(rename = "미정")]
    Undecided,
}

impl ScheduleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ScheduleStatus::Live => "방송",
            ScheduleStatus::Off => "휴방",
            ScheduleStatus::Surprise => "게릴라",
            ScheduleStatus::Undecided => "미정",
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, ScheduleStatus::Live | ScheduleStatus::Surprise)
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScheduleItem {
    pub id: i64,
    pub member_uid: i64,
    pub date: NaiveDate,
    #[serde(default, with = "start_time_format")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub title: String,
    pub status: ScheduleStatus,
}

impl ScheduleItem {
    /// Ordering used everywhere schedules are listed: by date, timed entries
    /// before untimed ones, then member and id.
    pub fn sort_key(&self) -> (NaiveDate, bool, Option<NaiveTime>, i64, i64) {
        (self.date, self.start_time.is_none(), self.start_time, self.member_uid, self.id)
    }

    pub fn formatted_time(&self) -> String {
        match self.start_time {
            Some(t) => t.format("%H:%M").to_string(),
            None => "--:--".to_string(),
        }
    }

    pub fn to_draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            id: Some(self.id),
            member_uid: self.member_uid,
            date: self.date,
            start_time: self.start_time,
            title: self.title.clone(),
            status: self.status,
        }
    }
}

/// A proposed schedule write. `id` is set when editing an existing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScheduleDraft {
    #[serde(default, skip_serializing)]
    pub id: Option<i64>,
    pub member_uid: i64,
    pub date: NaiveDate,
    #[serde(default, with = "start_time_format")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub start_time: Option<NaiveTime>,
    pub title: String,
    pub status: ScheduleStatus,
}

impl ScheduleDraft {
    pub fn new(member_uid: i64, date: NaiveDate, status: ScheduleStatus) -> Self {
        Self {
            id: None,
            member_uid,
            date,
            start_time: None,
            title: String::new(),
            status,
        }
    }

    /// Reject malformed drafts before any network call is made.
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if self.status.is_broadcast() && title.is_empty() {
            return Err(Error::Validation(format!(
                "a {} schedule needs a title",
                self.status
            )));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::Validation(format!(
                "title is longer than {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.status == ScheduleStatus::Off && self.start_time.is_some() {
            return Err(Error::Validation(
                "an off day cannot have a start time".to_string(),
            ));
        }
        Ok(())
    }
}

/// The store returns `time` columns as `HH:MM:SS`; the admin console sends `HH:MM`.
mod start_time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
