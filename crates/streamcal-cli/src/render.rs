//! Plain-text rendering for calendar snapshots and media feeds.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use streamcal_core::fetch::{FetchSource, Fetched};
use streamcal_core::models::{Clip, DDayItem, Notice, NoticeType, ScheduleItem, Video, Vod};
use streamcal_core::view::CalendarSnapshot;

/// Maximum title width in feed listings
const TITLE_WIDTH: usize = 48;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn weekday_label(date: NaiveDate) -> String {
    date.format("%a %m/%d").to_string()
}

fn local_time(ts: DateTime<Utc>, tz: &FixedOffset) -> String {
    ts.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

fn source_note(source: FetchSource) -> &'static str {
    match source {
        FetchSource::Fresh => "cached",
        FetchSource::Network => "live",
        FetchSource::Revalidating => "cached, refreshing",
        FetchSource::StaleFallback => "offline, showing last known data",
        FetchSource::NoChannels => "no channels",
    }
}

/// `[status] HH:MM title`; untimed entries leave the time out.
fn schedule_line(item: &ScheduleItem) -> String {
    let mut line = format!("[{}]", item.status.label());
    if item.start_time.is_some() {
        line.push(' ');
        line.push_str(&item.formatted_time());
    }
    if !item.title.is_empty() {
        line.push(' ');
        line.push_str(&item.title);
    }
    line
}

/// One block per day: D-Day markers first, then each member's entry.
pub fn calendar(snapshot: &CalendarSnapshot) -> String {
    let mut out = format!("Schedule {}\n", snapshot.range);
    let members = snapshot.active_members();

    for cell in snapshot.days() {
        let marker = if cell.date == snapshot.today { " (today)" } else { "" };
        out.push_str(&format!("\n{}{}\n", weekday_label(cell.date), marker));

        for dday in &cell.ddays {
            out.push_str(&format!("  * {}\n", dday.title));
        }
        for member in &members {
            let line = match snapshot.schedule_for(member.uid, cell.date) {
                Some(item) => schedule_line(item),
                None => "-".to_string(),
            };
            out.push_str(&format!("  {:<12} {}\n", truncate_string(&member.name, 12), line));
        }
    }

    if let Some(alert) = &snapshot.alert {
        out.push_str(&format!("\n! {}\n", alert));
    }
    out
}

fn feed_header(name: &str, count: usize, source: FetchSource) -> String {
    format!("{} ({} items, {})\n", name, count, source_note(source))
}

fn owner(uid: Option<i64>, names: &dyn Fn(i64) -> Option<String>) -> String {
    uid.and_then(names).unwrap_or_else(|| "?".to_string())
}

pub fn clips(feed: &Fetched<Vec<Clip>>, tz: &FixedOffset, names: &dyn Fn(i64) -> Option<String>) -> String {
    let mut out = feed_header("Clips", feed.data.len(), feed.source);
    for clip in &feed.data {
        out.push_str(&format!(
            "  {}  {:<12} {}\n",
            local_time(clip.created_date, tz),
            truncate_string(&owner(clip.member_uid, names), 12),
            truncate_string(&clip.title, TITLE_WIDTH)
        ));
    }
    out
}

pub fn vods(feed: &Fetched<Vec<Vod>>, tz: &FixedOffset, names: &dyn Fn(i64) -> Option<String>) -> String {
    let mut out = feed_header("Replays", feed.data.len(), feed.source);
    for vod in &feed.data {
        out.push_str(&format!(
            "  {}  {:<12} {}\n",
            local_time(vod.publish_date, tz),
            truncate_string(&owner(vod.member_uid, names), 12),
            truncate_string(&vod.title, TITLE_WIDTH)
        ));
    }
    out
}

pub fn videos(feed: &Fetched<Vec<Video>>, tz: &FixedOffset, names: &dyn Fn(i64) -> Option<String>) -> String {
    let mut out = feed_header("Videos", feed.data.len(), feed.source);
    for video in &feed.data {
        out.push_str(&format!(
            "  {}  {:<12} {}\n",
            local_time(video.published_at, tz),
            truncate_string(&owner(video.member_uid, names), 12),
            truncate_string(&video.title, TITLE_WIDTH)
        ));
    }
    out
}

pub fn notices(notices: &[Notice]) -> String {
    if notices.is_empty() {
        return "No active notices\n".to_string();
    }
    let mut out = String::new();
    for notice in notices {
        let tag = match notice.kind {
            NoticeType::Notice => "notice",
            NoticeType::Event => "event",
        };
        out.push_str(&format!("[{}] {}\n", tag, notice.content));
        if let Some(url) = &notice.url {
            out.push_str(&format!("        {}\n", url));
        }
    }
    out
}

pub fn ddays(ddays: &[DDayItem], today: NaiveDate) -> String {
    let mut out = String::new();
    for dday in ddays {
        out.push_str(&format!("{:<8} {} ({})\n", dday.label(today), dday.title, dday.date));
    }
    out
}
