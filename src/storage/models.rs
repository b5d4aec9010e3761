use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::geoip::GeoInfo;

/// One backend row per session boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: String,
    pub visitor_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub referrer: Option<String>,
    pub landing_path: Option<String>,
    /// "mobile" | "desktop"
    pub device_type: String,
    pub user_agent: Option<String>,
    /// 插入时通常为空，由 geo 补全异步合并
    #[serde(flatten)]
    pub geo: GeoInfo,
}

/// Partial update of an existing session row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub last_activity: Option<DateTime<Utc>>,
    pub geo: Option<GeoInfo>,
}

impl SessionPatch {
    pub fn heartbeat(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: Some(now),
            geo: None,
        }
    }

    pub fn geo(geo: GeoInfo) -> Self {
        Self {
            last_activity: None,
            geo: Some(geo),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_activity.is_none() && self.geo.as_ref().is_none_or(GeoInfo::is_empty)
    }
}
