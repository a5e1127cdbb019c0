use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Member {
    pub uid: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub main_color: Option<String>,
    #[serde(default)]
    pub sub_color: Option<String>,
    #[serde(default)]
    pub url_chzzk: Option<String>,
    #[serde(default)]
    pub youtube_channel_id: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
}

impl Member {
    /// Channel id on the livestream platform, taken from the channel URL.
    ///
    /// `https://chzzk.naver.com/<id>` and `https://chzzk.naver.com/live/<id>`
    /// both yield `<id>`.
    pub fn chzzk_channel_id(&self) -> Option<String> {
        let url = self.url_chzzk.as_deref()?.trim();
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let segment = path.trim_end_matches('/').rsplit('/').next()?;
        if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(segment.to_string())
    }

    pub fn youtube_channel(&self) -> Option<&str> {
        self.youtube_channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Members still shown on the calendar, ordered by uid.
pub fn active_members(members: &[Member]) -> Vec<Member> {
    let mut active: Vec<Member> = members.iter().filter(|m| !m.is_deprecated).cloned().collect();
    active.sort_by_key(|m| m.uid);
    active
}
