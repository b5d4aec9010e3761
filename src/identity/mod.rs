//! 访客身份
//!
//! 匿名访客 ID 加上最近几次会话。完整历史以后端为准，
//! 客户端只保留最新的 [`MAX_SESSION_HISTORY`] 条，控制 cookie 大小。

mod codec;
mod cookie_store;
mod memory_store;

pub use codec::{decode_identity, encode_identity};
pub use cookie_store::CookieJarStore;
pub use memory_store::MemoryIdentityStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 客户端保留的最大会话历史条数
pub const MAX_SESSION_HISTORY: usize = 5;

/// 身份 cookie 默认有效期（天）
pub const IDENTITY_TTL_DAYS: u32 = 365;

/// 单个会话的本地摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub last_activity: DateTime<Utc>,
    /// 开启本会话的 utm_source，仅用于判断活动切换
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
}

impl SessionRecord {
    /// 新建会话记录，生成新的 session_id
    pub fn start(now: DateTime<Utc>, utm_source: Option<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            last_activity: now,
            utm_source,
        }
    }
}

/// 持久化的匿名访客身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorIdentity {
    pub visitor_id: String,
    /// 从旧到新，长度不超过 [`MAX_SESSION_HISTORY`]
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl VisitorIdentity {
    pub fn generate() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(visitor_id: impl Into<String>) -> Self {
        Self {
            visitor_id: visitor_id.into(),
            sessions: Vec::new(),
        }
    }

    pub fn last_session(&self) -> Option<&SessionRecord> {
        self.sessions.last()
    }

    /// 追加会话，超出上限时丢弃最旧的
    pub fn push_session(&mut self, record: SessionRecord) {
        self.sessions.push(record);
        self.trim_history();
    }

    /// 刷新最新会话的活动时间，没有会话时返回 `false`
    pub fn touch_last_session(&mut self, now: DateTime<Utc>) -> bool {
        match self.sessions.last_mut() {
            Some(last) => {
                last.last_activity = now;
                true
            }
            None => false,
        }
    }

    pub(crate) fn trim_history(&mut self) {
        if self.sessions.len() > MAX_SESSION_HISTORY {
            let excess = self.sessions.len() - MAX_SESSION_HISTORY;
            self.sessions.drain(..excess);
        }
    }
}

/// [`VisitorIdentity`] 的持久化存储
///
/// 数据缺失或损坏时一律视为新访客，不向外报错。
/// `save` 只写一个客户端值，不做网络 I/O。
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> Option<VisitorIdentity>;

    fn save(&self, identity: &VisitorIdentity, ttl_days: u32);
}

/// 推荐握手完成标记
///
/// 与身份分开存放且不过期，身份过期后依然有效。
pub trait HandshakeMarker: Send + Sync {
    fn is_completed(&self) -> bool;

    fn mark_completed(&self);
}
