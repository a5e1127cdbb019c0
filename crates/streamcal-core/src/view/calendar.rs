use chrono::{FixedOffset, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::snapshot::{CalendarSnapshot, ScheduleDialog, ViewMode, ViewPhase};
use crate::error::{Error, Result};
use crate::fetch::{DataService, Fetched};
use crate::models::{ScheduleDraft, ScheduleItem, ScheduleStatus};
use crate::schedule::{SaveIntent, ScheduleService};

/// State behind one weekly or daily calendar.
///
/// Methods take `&mut self`; the view is driven from a single task and
/// other tasks observe it through [`CalendarView::subscribe`]. Errors never
/// escape: they become the snapshot's `alert` and the last good data stays.
pub struct CalendarView {
    data: DataService,
    schedules: ScheduleService,
    timezone: FixedOffset,
    state: CalendarSnapshot,
    tx: watch::Sender<CalendarSnapshot>,
}

impl CalendarView {
    pub fn new(data: DataService, mode: ViewMode, timezone: FixedOffset) -> Self {
        let today = data.now().with_timezone(&timezone).date_naive();
        let state = CalendarSnapshot::new(mode, today);
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            schedules: ScheduleService::new(data.clone()),
            data,
            timezone,
            state,
            tx,
        }
    }

    /// Start the view on `date` instead of today. Call before `load`.
    pub fn with_anchor(mut self, date: NaiveDate) -> Self {
        self.state.anchor = date;
        self.state.range = self.state.mode.range_for(date);
        self.publish();
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<CalendarSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> &CalendarSnapshot {
        &self.state
    }

    fn today(&self) -> NaiveDate {
        self.data.now().with_timezone(&self.timezone).date_naive()
    }

    fn publish(&mut self) {
        self.state.today = self.today();
        self.tx.send_replace(self.state.clone());
    }

    fn set_phase(&mut self, phase: ViewPhase) {
        self.state.phase = phase;
        self.publish();
    }

    /// Enter `Loading` with a clean slate; only this pass's errors set the alert.
    fn begin_loading(&mut self) {
        self.state.alert = None;
        self.set_phase(ViewPhase::Loading);
    }

    fn alert(&mut self, what: &str, err: &Error) {
        warn!(error = %err, "{} failed", what);
        self.state.alert = Some(err.user_message());
    }

    fn apply<T>(&mut self, what: &str, result: Result<Fetched<T>>, set: impl FnOnce(&mut CalendarSnapshot, T)) {
        match result {
            Ok(fetched) => set(&mut self.state, fetched.data),
            Err(e) => self.alert(what, &e),
        }
    }

    async fn fetch_reference_data(&mut self, force_members: bool, force_ddays: bool) {
        let (members, ddays) = tokio::join!(self.data.members(force_members), self.data.ddays(force_ddays));
        self.apply("Loading members", members, |s, m| s.members = m);
        self.apply("Loading D-Days", ddays, |s, d| s.ddays = d);
    }

    async fn fetch_schedules(&mut self) {
        match self.schedules.fetch_range(self.state.range).await {
            Ok(rows) => {
                debug!(range = %self.state.range, count = rows.len(), "Schedules loaded");
                self.state.schedules = rows;
            }
            Err(e) => self.alert("Loading schedules", &e),
        }
    }

    /// Initial load: members and D-Days in parallel, then the range's schedules.
    pub async fn load(&mut self) {
        info!(mode = ?self.state.mode, range = %self.state.range, "Loading calendar");
        self.begin_loading();
        self.fetch_reference_data(false, false).await;
        self.fetch_schedules().await;
        self.set_phase(ViewPhase::Ready);
    }

    /// Members and D-Days through the cache; free within the fresh window.
    pub async fn reload_all(&mut self) {
        self.begin_loading();
        self.fetch_reference_data(false, false).await;
        self.set_phase(ViewPhase::Ready);
    }

    pub async fn reload_members(&mut self) {
        self.begin_loading();
        let members = self.data.members(true).await;
        self.apply("Loading members", members, |s, m| s.members = m);
        self.set_phase(ViewPhase::Ready);
    }

    pub async fn reload_ddays(&mut self) {
        self.begin_loading();
        let ddays = self.data.ddays(true).await;
        self.apply("Loading D-Days", ddays, |s, d| s.ddays = d);
        self.set_phase(ViewPhase::Ready);
    }

    pub async fn reload_schedules(&mut self) {
        self.begin_loading();
        self.fetch_schedules().await;
        self.set_phase(ViewPhase::Ready);
    }

    /// Move the anchor; schedules are re-read only when the visible range changes.
    pub async fn go_to(&mut self, date: NaiveDate) {
        let range = self.state.mode.range_for(date);
        self.state.anchor = date;
        if range == self.state.range {
            self.publish();
            return;
        }
        self.state.range = range;
        self.reload_schedules().await;
    }

    pub async fn next(&mut self) {
        let anchor = self.state.anchor + self.state.mode.step();
        self.go_to(anchor).await;
    }

    pub async fn prev(&mut self) {
        let anchor = self.state.anchor - self.state.mode.step();
        self.go_to(anchor).await;
    }

    pub async fn go_today(&mut self) {
        let today = self.today();
        self.go_to(today).await;
    }

    pub async fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.state.mode {
            return;
        }
        self.state.mode = mode;
        // Force a re-read even if the new range happens to match
        self.state.range = mode.range_for(self.state.anchor);
        self.reload_schedules().await;
    }

    /// Open the dialog for a new entry. An existing entry for that member
    /// and day is preloaded so saving replaces it.
    pub fn open_new(&mut self, member_uid: i64, date: NaiveDate) {
        let dialog = match self.state.schedule_for(member_uid, date) {
            Some(existing) => ScheduleDialog {
                draft: existing.to_draft(),
                intent: SaveIntent::Edit,
            },
            None => ScheduleDialog {
                draft: ScheduleDraft::new(member_uid, date, ScheduleStatus::Live),
                intent: SaveIntent::Create,
            },
        };
        self.state.dialog = Some(dialog);
        self.publish();
    }

    pub fn open_edit(&mut self, item: &ScheduleItem) {
        self.state.dialog = Some(ScheduleDialog {
            draft: item.to_draft(),
            intent: SaveIntent::Edit,
        });
        self.publish();
    }

    pub fn close_dialog(&mut self) {
        self.state.dialog = None;
        self.publish();
    }

    pub fn dismiss_alert(&mut self) {
        self.state.alert = None;
        self.publish();
    }

    /// Save a schedule. On success the range is re-read and the dialog
    /// closed; on failure the dialog stays open and the alert is set.
    pub async fn save_schedule(&mut self, draft: ScheduleDraft, intent: SaveIntent) -> Option<ScheduleItem> {
        match self.schedules.save(&draft, intent).await {
            Ok(saved) => {
                self.state.dialog = None;
                self.state.alert = None;
                self.fetch_schedules().await;
                self.publish();
                Some(saved)
            }
            Err(e) => {
                self.alert("Saving schedule", &e);
                self.publish();
                None
            }
        }
    }

    pub async fn delete_schedule(&mut self, id: i64) -> bool {
        match self.schedules.delete(id).await {
            Ok(()) => {
                self.state.dialog = None;
                self.state.alert = None;
                self.fetch_schedules().await;
                self.publish();
                true
            }
            Err(e) => {
                self.alert("Deleting schedule", &e);
                self.publish();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::cache::Clock;
    use crate::models::DDayType;
    use crate::testing::{date, dday, member, schedule, FakeMedia, FakeStore, Harness};

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn harness() -> Harness {
        let store = FakeStore::with_members(vec![member(1, Some("aaa"), None), member(2, Some("bbb"), None)]);
        *store.ddays.lock().unwrap() = vec![dday(1, "2024-02-12", DDayType::Birthday)];
        store.add_schedule(schedule(10, 1, "2026-02-10", ScheduleStatus::Live));
        store.add_schedule(schedule(11, 2, "2026-02-14", ScheduleStatus::Off));
        store.add_schedule(schedule(12, 1, "2026-02-17", ScheduleStatus::Live));
        Harness::new(store, FakeMedia::default())
    }

    fn live(member_uid: i64, day: &str) -> ScheduleDraft {
        let mut draft = ScheduleDraft::new(member_uid, date(day), ScheduleStatus::Live);
        draft.title = "Valentine stream".into();
        draft
    }

    #[tokio::test]
    async fn test_load_transitions_to_ready() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        let rx = view.subscribe();
        assert_eq!(rx.borrow().phase, ViewPhase::Idle);

        view.load().await;
        let snap = rx.borrow().clone();
        assert_eq!(snap.phase, ViewPhase::Ready);
        assert_eq!(snap.today, date("2026-02-14"));
        assert_eq!(snap.range.start, date("2026-02-09"));
        assert_eq!(snap.members.len(), 2);
        assert_eq!(snap.ddays.len(), 1);
        let ids: Vec<i64> = snap.schedules.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(snap.alert.is_none());
    }

    #[tokio::test]
    async fn test_anchored_load_reads_one_range() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst()).with_anchor(date("2026-02-18"));
        view.load().await;

        let snap = view.snapshot();
        assert_eq!(snap.range.start, date("2026-02-16"));
        assert_eq!(snap.today, date("2026-02-14"));
        assert_eq!(snap.schedules.iter().map(|s| s.id).collect::<Vec<_>>(), vec![12]);
        assert_eq!(h.store.calls.count("schedules"), 1);
    }

    #[tokio::test]
    async fn test_today_uses_configured_offset() {
        let h = harness();
        // 2026-02-14 20:00 UTC is already Sunday in Seoul
        h.clock.advance(Duration::hours(17));
        let view = CalendarView::new(h.service.clone(), ViewMode::Daily, kst());
        assert_eq!(view.snapshot().today, date("2026-02-15"));
        let utc = CalendarView::new(h.service.clone(), ViewMode::Daily, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.snapshot().today, h.clock.now().date_naive());
    }

    #[tokio::test]
    async fn test_reload_all_within_fresh_window_is_free() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        let before = h.store.calls.total();

        view.reload_all().await;
        assert_eq!(h.store.calls.total(), before);

        view.reload_members().await;
        view.reload_ddays().await;
        assert_eq!(h.store.calls.count("members"), 2);
        assert_eq!(h.store.calls.count("ddays"), 2);
    }

    #[tokio::test]
    async fn test_navigation_refetches_only_on_range_change() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        assert_eq!(h.store.calls.count("schedules"), 1);

        view.go_to(date("2026-02-11")).await;
        assert_eq!(h.store.calls.count("schedules"), 1);

        view.next().await;
        assert_eq!(view.snapshot().range.start, date("2026-02-16"));
        assert_eq!(view.snapshot().schedules[0].id, 12);
        assert_eq!(h.store.calls.count("schedules"), 2);

        view.prev().await;
        view.go_today().await;
        assert_eq!(view.snapshot().anchor, date("2026-02-14"));
        assert_eq!(view.snapshot().range.start, date("2026-02-09"));
        assert_eq!(h.store.calls.count("schedules"), 3);
    }

    #[tokio::test]
    async fn test_daily_mode_steps_by_day() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Daily, kst());
        view.load().await;
        assert_eq!(view.snapshot().schedules.iter().map(|s| s.id).collect::<Vec<_>>(), vec![11]);

        view.prev().await;
        assert_eq!(view.snapshot().anchor, date("2026-02-13"));
        assert!(view.snapshot().schedules.is_empty());

        view.set_mode(ViewMode::Weekly).await;
        assert_eq!(view.snapshot().schedules.len(), 2);
    }

    #[tokio::test]
    async fn test_conflicting_save_keeps_dialog_open() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        let fetches = h.store.calls.count("schedules");

        view.open_new(1, date("2026-02-14"));
        assert_eq!(view.snapshot().dialog.as_ref().map(|d| d.intent), Some(SaveIntent::Create));

        // Another entry for member 1 on the same day lands after the calendar loaded
        h.store.add_schedule(schedule(20, 1, "2026-02-14", ScheduleStatus::Undecided));

        let saved = view.save_schedule(live(1, "2026-02-14"), SaveIntent::Create).await;
        assert!(saved.is_none());
        let snap = view.snapshot();
        assert!(snap.dialog.is_some());
        assert!(snap.alert.as_deref().unwrap_or_default().contains("already has a schedule"));
        assert_eq!(snap.phase, ViewPhase::Ready);
        assert_eq!(h.store.calls.count("schedules"), fetches);
    }

    #[tokio::test]
    async fn test_successful_save_refreshes_and_closes() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        let fetches = h.store.calls.count("schedules");

        view.open_new(1, date("2026-02-13"));
        let saved = view.save_schedule(live(1, "2026-02-13"), SaveIntent::Create).await.unwrap();

        let snap = view.snapshot();
        assert!(snap.dialog.is_none());
        assert!(snap.schedules.iter().any(|s| s.id == saved.id));
        assert_eq!(h.store.calls.count("schedules"), fetches + 1);
    }

    #[tokio::test]
    async fn test_open_new_on_occupied_cell_edits() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;

        view.open_new(2, date("2026-02-14"));
        let dialog = view.snapshot().dialog.clone().unwrap();
        assert_eq!(dialog.intent, SaveIntent::Edit);
        assert_eq!(dialog.draft.id, Some(11));

        view.close_dialog();
        assert!(view.snapshot().dialog.is_none());
    }

    #[tokio::test]
    async fn test_delete_failure_sets_alert() {
        let h = harness();
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        let first = view.snapshot().schedules[0].clone();
        view.open_edit(&first);

        h.store.calls.set_fail(true);
        assert!(!view.delete_schedule(10).await);
        assert!(view.snapshot().dialog.is_some());
        assert!(view.snapshot().alert.is_some());
        // Last good data is kept
        assert_eq!(view.snapshot().schedules.len(), 2);

        h.store.calls.set_fail(false);
        view.dismiss_alert();
        assert!(view.delete_schedule(10).await);
        assert_eq!(view.snapshot().schedules.len(), 1);
        assert!(view.snapshot().dialog.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_becomes_alert() {
        let h = harness();
        h.store.calls.set_fail(true);
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        let snap = view.snapshot();
        assert_eq!(snap.phase, ViewPhase::Ready);
        assert!(snap.members.is_empty());
        assert_eq!(snap.alert.as_deref(), Some("Could not reach the server. Please try again."));
    }

    #[tokio::test]
    async fn test_alert_cleared_once_reload_succeeds() {
        let h = harness();
        h.store.calls.set_fail(true);
        let mut view = CalendarView::new(h.service.clone(), ViewMode::Weekly, kst());
        view.load().await;
        assert!(view.snapshot().alert.is_some());

        h.store.calls.set_fail(false);
        view.reload_schedules().await;
        assert_eq!(view.snapshot().schedules.len(), 2);
        assert!(view.snapshot().alert.is_none());

        // A failure during navigation shows, and the next good read clears it
        h.store.calls.set_fail(true);
        view.next().await;
        assert!(view.snapshot().alert.is_some());
        h.store.calls.set_fail(false);
        view.prev().await;
        assert!(view.snapshot().alert.is_none());
        assert_eq!(view.snapshot().schedules.len(), 2);
    }
}
