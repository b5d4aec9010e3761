//! 会话边界判定
//!
//! 纯函数：根据已存身份和当前页面决定续用上一个会话还是新开。
//! 不做 I/O，不读时钟。

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use strum::AsRefStr;

use super::UrlParams;
use crate::identity::{SessionRecord, VisitorIdentity};

/// 空闲超时秒数（正好 30 分钟）
pub const SESSION_IDLE_TIMEOUT_SECS: i64 = 30 * 60;

pub fn session_idle_timeout() -> TimeDelta {
    TimeDelta::seconds(SESSION_IDLE_TIMEOUT_SECS)
}

/// 判定原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryReason {
    /// 没有历史会话
    FirstVisit,
    /// 空闲超过超时时间
    IdleTimeout,
    /// 活跃会话期间来了不同的 utm_source
    CampaignChange,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionDecision {
    pub new_session: bool,
    pub reason: BoundaryReason,
}

impl SessionDecision {
    fn start(reason: BoundaryReason) -> Self {
        Self {
            new_session: true,
            reason,
        }
    }

    fn continue_session() -> Self {
        Self {
            new_session: false,
            reason: BoundaryReason::Continue,
        }
    }
}

/// 判定当前页面是否延续上一个会话
///
/// 按顺序匹配：
/// 1. 没有历史会话 → 新会话
/// 2. 空闲严格超过 30 分钟 → 新会话
/// 3. 带 `utm_source` 且与会话记录不同 → 新会话
/// 4. 其余 → 延续
///
/// `last_session` 为 `None` 时取身份中最新的会话。
/// referrer 只记录在会话行上，不影响边界。
pub fn decide(
    identity: Option<&VisitorIdentity>,
    last_session: Option<&SessionRecord>,
    now: DateTime<Utc>,
    params: &UrlParams,
    _document_referrer: Option<&str>,
) -> SessionDecision {
    let Some(last) = last_session.or_else(|| identity.and_then(|i| i.last_session())) else {
        return SessionDecision::start(BoundaryReason::FirstVisit);
    };

    if now.signed_duration_since(last.last_activity) > session_idle_timeout() {
        return SessionDecision::start(BoundaryReason::IdleTimeout);
    }

    if let Some(ref incoming) = params.utm_source
        && last.utm_source.as_ref() != Some(incoming)
    {
        return SessionDecision::start(BoundaryReason::CampaignChange);
    }

    SessionDecision::continue_session()
}
