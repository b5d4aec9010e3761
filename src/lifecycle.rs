//! 访客生命周期编排
//!
//! 每次路由变化：读取身份，判定会话边界，保存身份，再把网络副作用交给同步客户端。
//! 判定和身份写入总在任何网络副作用开始之前完成。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::identity::{IDENTITY_TTL_DAYS, IdentityStore, SessionRecord, VisitorIdentity};
use crate::session::{
    SessionDecision, SessionSyncClient, UrlParams, build_session_row, decide, normalize_referrer,
};

/// 一次页面访问的全部输入
#[derive(Debug, Clone)]
pub struct PageView {
    pub params: UrlParams,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
    pub now: DateTime<Utc>,
}

impl PageView {
    pub fn new(page_url: &str, referral_param: &str, now: DateTime<Utc>) -> Self {
        Self {
            params: UrlParams::from_url(page_url, referral_param),
            referrer: None,
            user_agent: None,
            client_ip: None,
            now,
        }
    }

    pub fn with_referrer(mut self, referrer: Option<&str>) -> Self {
        self.referrer = normalize_referrer(referrer);
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(String::from);
        self
    }

    pub fn with_client_ip(mut self, client_ip: Option<String>) -> Self {
        self.client_ip = client_ip;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitOutcome {
    pub visitor_id: String,
    pub session_id: String,
    #[serde(flatten)]
    pub decision: SessionDecision,
}

pub struct VisitorLifecycle {
    store: Arc<dyn IdentityStore>,
    sync: SessionSyncClient,
    ttl_days: u32,
}

impl VisitorLifecycle {
    pub fn new(store: Arc<dyn IdentityStore>, sync: SessionSyncClient) -> Self {
        Self {
            store,
            sync,
            ttl_days: IDENTITY_TTL_DAYS,
        }
    }

    pub fn with_ttl_days(mut self, ttl_days: u32) -> Self {
        self.ttl_days = ttl_days;
        self
    }

    /// 当前已保存的访客 ID
    pub fn current_visitor_id(&self) -> Option<String> {
        self.store.load().map(|identity| identity.visitor_id)
    }

    /// 处理一次路由变化
    ///
    /// 返回的 handle 在后端副作用完成时结束，丢弃即为 fire-and-forget。
    pub fn on_route_change(&self, page: &PageView) -> (VisitOutcome, JoinHandle<()>) {
        let loaded = self.store.load();
        let decision = decide(
            loaded.as_ref(),
            None,
            page.now,
            &page.params,
            page.referrer.as_deref(),
        );
        let mut identity = loaded.unwrap_or_else(VisitorIdentity::generate);

        let continuing = if decision.new_session {
            None
        } else {
            identity.last_session().map(|s| s.session_id.clone())
        };

        let (session_id, task) = match continuing {
            Some(session_id) => {
                // 心跳结果不影响本地时间戳
                identity.touch_last_session(page.now);
                self.store.save(&identity, self.ttl_days);
                let task = self.sync.heartbeat(&session_id, page.now);
                (session_id, task)
            }
            None => {
                let record = SessionRecord::start(page.now, page.params.utm_source.clone());
                let row = build_session_row(
                    &identity.visitor_id,
                    &record,
                    &page.params,
                    page.referrer.as_deref(),
                    page.user_agent.as_deref(),
                );
                let session_id = record.session_id.clone();
                identity.push_session(record);
                self.store.save(&identity, self.ttl_days);
                let task = self.sync.begin_session(row, page.client_ip.clone());
                (session_id, task)
            }
        };

        debug!(
            "Route change for visitor {}: {} ({})",
            identity.visitor_id,
            session_id,
            decision.reason.as_ref()
        );

        let outcome = VisitOutcome {
            visitor_id: identity.visitor_id,
            session_id,
            decision,
        };
        (outcome, task)
    }
}
