use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum NoticeType {
    Notice,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Notice {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NoticeType,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Notices shown in the rotating banner, in the order the store returned them.
pub fn active_notices(notices: &[Notice]) -> Vec<Notice> {
    notices.iter().filter(|n| n.is_active).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_notices_keeps_order() {
        let json = r#"[
            {"id": 3, "type": "event", "content": "Fan meeting", "is_active": true},
            {"id": 2, "type": "notice", "content": "Old", "is_active": false},
            {"id": 1, "type": "notice", "content": "Maintenance", "url": "https://example.com", "is_active": true}
        ]"#;
        let notices: Vec<Notice> = serde_json::from_str(json).unwrap();
        let ids: Vec<i64> = active_notices(&notices).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(notices[0].kind, NoticeType::Event);
    }
}
