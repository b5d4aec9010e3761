use serde::{Deserialize, Serialize};

use crate::referral::HandshakeState;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `POST /v1/track`
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct TrackRequest {
    /// Full page URL (absolute or site-relative)
    pub url: String,
    /// `document.referrer`; empty string means none
    #[serde(default)]
    pub referrer: Option<String>,
}

/// `GET /v1/referral/handshake`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HandshakeResponse {
    #[serde(flatten)]
    pub state: HandshakeState,
    pub open: bool,
}

/// `POST /v1/referral/lead`
///
/// Missing fields deserialize as empty and are rejected by validation, so
/// the client gets the same error shape either way.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct LeadRequest {
    #[serde(default)]
    pub referrer_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LeadResponse {
    pub already_completed: bool,
    pub submitted: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub geoip: String,
    pub timestamp: String,
    pub uptime: u64,
}
