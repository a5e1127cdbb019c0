//! In-memory fakes for the store and media seams, with call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::api::{ApiError, ChannelItems, MediaApi, StoreApi};
use crate::cache::{CacheStore, ManualClock};
use crate::config::FreshnessPolicy;
use crate::fetch::DataService;
use crate::models::{
    Clip, DDayItem, DDayType, Member, Notice, NoticeType, ScheduleDraft, ScheduleItem, ScheduleStatus, Video, Vod,
};

/// Saturday 2026-02-14, noon in Seoul.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 3, 0, 0).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn member(uid: i64, chzzk: Option<&str>, youtube: Option<&str>) -> Member {
    Member {
        uid,
        code: format!("m{}", uid),
        name: format!("Member {}", uid),
        main_color: None,
        sub_color: None,
        url_chzzk: chzzk.map(|id| format!("https://chzzk.naver.com/{}", id)),
        youtube_channel_id: youtube.map(String::from),
        is_deprecated: false,
    }
}

pub fn clip(id: &str, hours_ago: i64) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("clip {}", id),
        thumbnail_url: None,
        duration: Some(30),
        view_count: None,
        created_date: start_time() - Duration::hours(hours_ago),
        member_uid: None,
    }
}

pub fn vod(id: i64, hours_ago: i64) -> Vod {
    Vod {
        id,
        title: format!("vod {}", id),
        thumbnail_url: None,
        duration: None,
        publish_date: start_time() - Duration::hours(hours_ago),
        member_uid: None,
    }
}

pub fn video(id: &str, hours_ago: i64) -> Video {
    Video {
        id: id.to_string(),
        title: format!("video {}", id),
        thumbnail_url: None,
        published_at: start_time() - Duration::hours(hours_ago),
        member_uid: None,
    }
}

pub fn schedule(id: i64, member_uid: i64, day: &str, status: ScheduleStatus) -> ScheduleItem {
    ScheduleItem {
        id,
        member_uid,
        date: date(day),
        start_time: None,
        title: format!("schedule {}", id),
        status,
    }
}

pub fn dday(id: i64, day: &str, kind: DDayType) -> DDayItem {
    DDayItem {
        id,
        title: format!("dday {}", id),
        date: date(day),
        colors: vec![],
        kind,
    }
}

pub fn notice(id: i64, active: bool) -> Notice {
    Notice {
        id,
        kind: NoticeType::Notice,
        content: format!("notice {}", id),
        url: None,
        is_active: active,
    }
}

/// Counts calls by name, optionally failing or sleeping first.
#[derive(Default)]
pub struct Calls {
    counts: Mutex<HashMap<&'static str, usize>>,
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

impl Calls {
    pub fn count(&self, name: &str) -> usize {
        self.counts.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: StdDuration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn record(&self, name: &'static str) -> Result<(), ApiError> {
        *self.counts.lock().unwrap().entry(name).or_default() += 1;
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(StdDuration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub calls: Calls,
    pub members: Mutex<Vec<Member>>,
    pub ddays: Mutex<Vec<DDayItem>>,
    pub notices: Mutex<Vec<Notice>>,
    pub schedules: Mutex<Vec<ScheduleItem>>,
    next_id: AtomicI64,
}

impl FakeStore {
    pub fn with_members(members: Vec<Member>) -> Self {
        let store = Self::default();
        *store.members.lock().unwrap() = members;
        store
    }

    pub fn add_schedule(&self, item: ScheduleItem) {
        self.schedules.lock().unwrap().push(item);
    }

    fn next_id(&self) -> i64 {
        1000 + self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn row_from(id: i64, draft: &ScheduleDraft) -> ScheduleItem {
        ScheduleItem {
            id,
            member_uid: draft.member_uid,
            date: draft.date,
            start_time: draft.start_time,
            title: draft.title.clone(),
            status: draft.status,
        }
    }
}

#[async_trait]
impl StoreApi for FakeStore {
    async fn fetch_members(&self) -> Result<Vec<Member>, ApiError> {
        self.calls.record("members").await?;
        Ok(self.members.lock().unwrap().clone())
    }

    async fn fetch_ddays(&self) -> Result<Vec<DDayItem>, ApiError> {
        self.calls.record("ddays").await?;
        Ok(self.ddays.lock().unwrap().clone())
    }

    async fn fetch_notices(&self) -> Result<Vec<Notice>, ApiError> {
        self.calls.record("notices").await?;
        Ok(self.notices.lock().unwrap().clone())
    }

    async fn fetch_schedules(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError> {
        self.calls.record("schedules").await?;
        // Unordered on purpose; callers sort
        let mut rows: Vec<ScheduleItem> = self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.date >= from && s.date <= to)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn fetch_member_schedules(&self, member_uid: i64, date: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError> {
        self.calls.record("member_schedules").await?;
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.member_uid == member_uid && s.date == date)
            .cloned()
            .collect())
    }

    async fn insert_schedule(&self, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError> {
        self.calls.record("insert").await?;
        let row = Self::row_from(self.next_id(), draft);
        self.schedules.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_schedule(&self, id: i64, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError> {
        self.calls.record("update").await?;
        let mut rows = self.schedules.lock().unwrap();
        let existing = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("schedule {}", id)))?;
        *existing = Self::row_from(id, draft);
        Ok(existing.clone())
    }

    async fn delete_schedule(&self, id: i64) -> Result<(), ApiError> {
        self.calls.record("delete").await?;
        self.schedules.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMedia {
    pub calls: Calls,
    pub clips: Mutex<ChannelItems<Clip>>,
    pub vods: Mutex<ChannelItems<Vod>>,
    pub videos: Mutex<ChannelItems<Video>>,
}

impl FakeMedia {
    pub fn set_videos(&self, channel: &str, videos: Vec<Video>) {
        self.videos.lock().unwrap().insert(channel.to_string(), videos);
    }
}

fn only<T: Clone>(items: &ChannelItems<T>, channel_ids: &[String]) -> ChannelItems<T> {
    items
        .iter()
        .filter(|(channel, _)| channel_ids.contains(channel))
        .map(|(channel, list)| (channel.clone(), list.clone()))
        .collect()
}

#[async_trait]
impl MediaApi for FakeMedia {
    async fn fetch_clips(&self, channel_ids: &[String], _size: usize) -> Result<ChannelItems<Clip>, ApiError> {
        self.calls.record("clips").await?;
        Ok(only(&self.clips.lock().unwrap(), channel_ids))
    }

    async fn fetch_vods(&self, channel_ids: &[String], _size: usize) -> Result<ChannelItems<Vod>, ApiError> {
        self.calls.record("vods").await?;
        Ok(only(&self.vods.lock().unwrap(), channel_ids))
    }

    async fn fetch_videos(&self, channel_ids: &[String], _size: usize) -> Result<ChannelItems<Video>, ApiError> {
        self.calls.record("videos").await?;
        Ok(only(&self.videos.lock().unwrap(), channel_ids))
    }
}

/// A service wired to fakes, with a clock stopped at [`start_time`].
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<FakeStore>,
    pub media: Arc<FakeMedia>,
    pub service: DataService,
}

impl Harness {
    pub fn new(store: FakeStore, media: FakeMedia) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let store = Arc::new(store);
        let media = Arc::new(media);
        let cache = Arc::new(CacheStore::new(clock.clone()));
        let service = DataService::new(
            cache,
            store.clone(),
            media.clone(),
            FreshnessPolicy::default(),
            StdDuration::from_secs(2),
        );
        Self { clock, store, media, service }
    }

    pub fn empty() -> Self {
        Self::new(FakeStore::default(), FakeMedia::default())
    }
}

/// Poll `condition` until it holds, yielding to spawned tasks in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
