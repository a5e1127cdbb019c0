use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{DataService, FetchSource, Fetched};
use crate::api::{ApiError, ChannelItems};
use crate::error::Result;
use crate::models::{ChannelMedia, Clip, Member, Video, Vod};

/// Channel id -> owning member uid, for members that have a channel on the
/// source. Sorted by channel id; when two members share a channel the
/// lower uid keeps it.
pub fn channel_owners(members: &[Member], channel: impl Fn(&Member) -> Option<String>) -> BTreeMap<String, i64> {
    let mut sorted: Vec<&Member> = members.iter().collect();
    sorted.sort_by_key(|m| m.uid);
    let mut owners = BTreeMap::new();
    for m in sorted {
        if let Some(id) = channel(m) {
            owners.entry(id).or_insert(m.uid);
        }
    }
    owners
}

/// Deterministic cache key: `<source>:<sorted channel ids>:<size>`.
pub fn media_key(source: &str, owners: &BTreeMap<String, i64>, size: usize) -> String {
    let ids: Vec<&str> = owners.keys().map(String::as_str).collect();
    format!("{}:{}:{}", source, ids.join(","), size)
}

/// Flatten per-channel collections into one feed, newest first, each item
/// tagged with the member owning its channel.
pub fn merge_channel_items<T: ChannelMedia>(raw: ChannelItems<T>, owners: &BTreeMap<String, i64>) -> Vec<T> {
    let mut merged = Vec::new();
    for (channel, items) in raw {
        let owner = owners.get(&channel).copied();
        if owner.is_none() {
            debug!(channel = %channel, "Provider returned an unrequested channel");
        }
        for mut item in items {
            if let Some(uid) = owner {
                item.set_member_uid(uid);
            }
            merged.push(item);
        }
    }
    merged.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| a.media_id().cmp(&b.media_id()))
    });
    merged
}

fn chzzk_channel(member: &Member) -> Option<String> {
    member.chzzk_channel_id()
}

fn youtube_channel(member: &Member) -> Option<String> {
    member.youtube_channel().map(String::from)
}

impl DataService {
    fn no_channels<T: Default>(&self, source: &str) -> Fetched<T> {
        debug!(source, "No member has a channel for this source, skipping fetch");
        Fetched {
            data: T::default(),
            fetched_at: self.now(),
            source: FetchSource::NoChannels,
        }
    }

    /// Livestream clips for `members`, newest first.
    pub async fn clips(&self, members: &[Member], size: usize) -> Result<Fetched<Vec<Clip>>> {
        let owners = channel_owners(members, chzzk_channel);
        if owners.is_empty() {
            return Ok(self.no_channels("clips"));
        }
        let key = media_key("clips", &owners, size);
        let ids: Vec<String> = owners.keys().cloned().collect();
        self.cached(&key, self.policy.clips_fresh(), false, || async {
            let raw = self.media.fetch_clips(&ids, size).await?;
            Ok::<_, ApiError>(merge_channel_items(raw, &owners))
        })
        .await
    }

    /// Broadcast replays for `members`, newest first.
    pub async fn vods(&self, members: &[Member], size: usize) -> Result<Fetched<Vec<Vod>>> {
        let owners = channel_owners(members, chzzk_channel);
        if owners.is_empty() {
            return Ok(self.no_channels("vods"));
        }
        let key = media_key("vods", &owners, size);
        let ids: Vec<String> = owners.keys().cloned().collect();
        self.cached(&key, self.policy.vods_fresh(), false, || async {
            let raw = self.media.fetch_vods(&ids, size).await?;
            Ok::<_, ApiError>(merge_channel_items(raw, &owners))
        })
        .await
    }

    /// YouTube uploads for `members`, newest first, with stale-while-revalidate.
    ///
    /// Within the fresh window the cached feed is returned as is. Between the
    /// fresh and stale windows the cached feed is returned immediately and a
    /// background task refreshes it for later callers. Past the stale window
    /// callers wait for the network, falling back to the old feed on failure.
    pub async fn youtube_videos(&self, members: &[Member], size: usize) -> Result<Fetched<Vec<Video>>> {
        let owners = channel_owners(members, youtube_channel);
        if owners.is_empty() {
            return Ok(self.no_channels("youtube"));
        }
        let key = media_key("youtube", &owners, size);
        let ids: Vec<String> = owners.keys().cloned().collect();

        if let Some(entry) = self.lookup::<Vec<Video>>(&key) {
            if self.cache.is_fresh(&entry, self.policy.youtube_fresh()) {
                return Ok(Fetched::from_cache(entry, FetchSource::Fresh));
            }
            if !self.cache.is_stale(&entry, self.policy.youtube_stale()) {
                let media = Arc::clone(&self.media);
                let (bg_ids, bg_owners) = (ids.clone(), owners.clone());
                self.spawn_revalidation(key, async move {
                    let raw = media.fetch_videos(&bg_ids, size).await?;
                    Ok::<_, ApiError>(merge_channel_items(raw, &bg_owners))
                });
                return Ok(Fetched::from_cache(entry, FetchSource::Revalidating));
            }
        }

        self.cached(&key, self.policy.youtube_fresh(), false, || async {
            let raw = self.media.fetch_videos(&ids, size).await?;
            Ok::<_, ApiError>(merge_channel_items(raw, &owners))
        })
        .await
    }
}
