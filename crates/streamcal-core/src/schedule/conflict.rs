use chrono::NaiveDate;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::models::{ScheduleDraft, ScheduleItem};

/// A write collided with another entry for the same member and day.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Member {member_uid} already has a schedule on {date} (entry {existing_id})")]
pub struct ConflictError {
    pub member_uid: i64,
    pub date: NaiveDate,
    pub existing_id: i64,
}

/// What the caller means by saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    /// New entry; refuse if the member already has one that day.
    Create,
    /// New entry that overwrites the member's existing entry for that day.
    Replace,
    /// Update of the entry whose id the draft carries. No conflict check.
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Insert,
    Update(i64),
}

/// Decide how to apply `draft` given the rows that share its conflict key.
///
/// Entries conflict when they share `member_uid` and `date`; `start_time`
/// plays no part. `existing` rows with another member or date are ignored,
/// so callers may pass a wider slice.
pub fn resolve(draft: &ScheduleDraft, intent: SaveIntent, existing: &[ScheduleItem]) -> Result<Resolution> {
    if intent == SaveIntent::Edit {
        return draft
            .id
            .map(Resolution::Update)
            .ok_or_else(|| Error::Validation("editing requires an existing schedule id".to_string()));
    }

    let conflicting = existing
        .iter()
        .filter(|item| item.member_uid == draft.member_uid && item.date == draft.date)
        .find(|item| Some(item.id) != draft.id);

    match (conflicting, intent) {
        (None, _) => Ok(match draft.id {
            Some(id) => Resolution::Update(id),
            None => Resolution::Insert,
        }),
        (Some(item), SaveIntent::Replace) => Ok(Resolution::Update(item.id)),
        (Some(item), _) => Err(ConflictError {
            member_uid: draft.member_uid,
            date: draft.date,
            existing_id: item.id,
        }
        .into()),
    }
}
