use tracing::info;

use super::conflict::{resolve, Resolution, SaveIntent};
use super::DateRange;
use crate::error::Result;
use crate::fetch::DataService;
use crate::models::{ScheduleDraft, ScheduleItem};

/// Schedule reads and writes. Nothing here is cached: every read goes to
/// the store, and callers re-read after a successful write.
#[derive(Clone)]
pub struct ScheduleService {
    data: DataService,
}

impl ScheduleService {
    pub fn new(data: DataService) -> Self {
        Self { data }
    }

    /// Schedules in `range`, in calendar order.
    pub async fn fetch_range(&self, range: DateRange) -> Result<Vec<ScheduleItem>> {
        let store = self.data.store();
        let mut rows = self
            .data
            .with_timeout(store.fetch_schedules(range.start, range.end))
            .await?;
        rows.retain(|item| range.contains(item.date));
        rows.sort_by_key(|item| item.sort_key());
        Ok(rows)
    }

    /// Validate, check for a same-member same-day conflict and write.
    pub async fn save(&self, draft: &ScheduleDraft, intent: SaveIntent) -> Result<ScheduleItem> {
        draft.validate()?;
        let store = self.data.store();

        let existing = if intent == SaveIntent::Edit {
            Vec::new()
        } else {
            self.data
                .with_timeout(store.fetch_member_schedules(draft.member_uid, draft.date))
                .await?
        };

        let saved = match resolve(draft, intent, &existing)? {
            Resolution::Insert => self.data.with_timeout(store.insert_schedule(draft)).await?,
            Resolution::Update(id) => self.data.with_timeout(store.update_schedule(id, draft)).await?,
        };
        info!(id = saved.id, member_uid = saved.member_uid, date = %saved.date, ?intent, "Schedule saved");
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let store = self.data.store();
        self.data.with_timeout(store.delete_schedule(id)).await?;
        info!(id, "Schedule deleted");
        Ok(())
    }
}
