use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item returned by a per-channel media endpoint.
pub trait ChannelMedia {
    /// Creation or publish time; feeds are sorted newest first on this.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Provider id, used to break timestamp ties.
    fn media_id(&self) -> String;

    fn set_member_uid(&mut self, uid: i64);
}

/// Livestream clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Clip {
    #[serde(alias = "clipUID")]
    pub id: String,
    #[serde(alias = "clipTitle")]
    pub title: String,
    #[serde(default, alias = "thumbnailImageUrl")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, alias = "readCount")]
    pub view_count: Option<u64>,
    #[serde(with = "provider_time")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub member_uid: Option<i64>,
}

/// Past broadcast replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Vod {
    #[serde(alias = "videoNo")]
    pub id: i64,
    #[serde(alias = "videoTitle")]
    pub title: String,
    #[serde(default, alias = "thumbnailImageUrl")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(with = "provider_time")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub publish_date: DateTime<Utc>,
    #[serde(default)]
    pub member_uid: Option<i64>,
}

/// Video from the separate video platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Video {
    #[serde(alias = "videoId")]
    pub id: String,
    pub title: String,
    #[serde(default, alias = "thumbnail")]
    pub thumbnail_url: Option<String>,
    #[serde(with = "provider_time")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub member_uid: Option<i64>,
}

impl ChannelMedia for Clip {
    fn timestamp(&self) -> DateTime<Utc> {
        self.created_date
    }

    fn media_id(&self) -> String {
        self.id.clone()
    }

    fn set_member_uid(&mut self, uid: i64) {
        self.member_uid = Some(uid);
    }
}

impl ChannelMedia for Vod {
    fn timestamp(&self) -> DateTime<Utc> {
        self.publish_date
    }

    fn media_id(&self) -> String {
        self.id.to_string()
    }

    fn set_member_uid(&mut self, uid: i64) {
        self.member_uid = Some(uid);
    }
}

impl ChannelMedia for Video {
    fn timestamp(&self) -> DateTime<Utc> {
        self.published_at
    }

    fn media_id(&self) -> String {
        self.id.clone()
    }

    fn set_member_uid(&mut self, uid: i64) {
        self.member_uid = Some(uid);
    }
}

/// Provider timestamps arrive either as RFC 3339 or as naive
/// `YYYY-MM-DD HH:MM:SS` in Korea Standard Time.
mod provider_time {
    use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const KST_OFFSET_SECS: i32 = 9 * 3600;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
            .map_err(serde::de::Error::custom)?;
        let kst = FixedOffset::east_opt(KST_OFFSET_SECS)
            .ok_or_else(|| serde::de::Error::custom("invalid offset"))?;
        kst.from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| serde::de::Error::custom(format!("ambiguous time: {}", raw)))
    }
}
