//! Client for the media provider endpoints.
//!
//! Each endpoint takes a comma-separated list of channel ids and a result
//! size and answers with a JSON object keyed by channel id:
//! `{ "<channelId>": [ ...items ] }`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiError, HttpClient};
use crate::models::{Clip, Video, Vod};

/// Per-channel collections as returned by the providers.
pub type ChannelItems<T> = HashMap<String, Vec<T>>;

#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn fetch_clips(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Clip>, ApiError>;

    async fn fetch_vods(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Vod>, ApiError>;

    async fn fetch_videos(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Video>, ApiError>;
}

#[derive(Clone)]
pub struct MediaClient {
    http: HttpClient,
}

impl MediaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl MediaApi for MediaClient {
    async fn fetch_clips(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Clip>, ApiError> {
        let path = format!("/api/chzzk/clips?channelIds={}&size={}", channel_ids.join(","), size);
        self.http.get(&path).await
    }

    async fn fetch_vods(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Vod>, ApiError> {
        let path = format!("/api/chzzk/videos?channelIds={}&size={}", channel_ids.join(","), size);
        self.http.get(&path).await
    }

    async fn fetch_videos(&self, channel_ids: &[String], size: usize) -> Result<ChannelItems<Video>, ApiError> {
        let path = format!(
            "/api/youtube/videos?channelIds={}&maxResults={}",
            channel_ids.join(","),
            size
        );
        self.http.get(&path).await
    }
}
