//! 会话同步客户端
//!
//! 把会话创建和心跳写到后端。每个副作用在独立任务里执行，失败只记日志，
//! 本地身份始终以 cookie 为准。
//!
//! 同一会话的副作用按调用顺序串行：每次调用同步地挂到该会话链尾，
//! 任务先等前一个完成再访问后端。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{DeviceType, UrlParams};
use crate::identity::SessionRecord;
use crate::services::geoip::{GeoInfo, GeoLookup};
use crate::storage::{RemoteBackend, SessionPatch, SessionRow};

/// 根据刚开启的会话构造后端记录
pub fn build_session_row(
    visitor_id: &str,
    record: &SessionRecord,
    params: &UrlParams,
    referrer: Option<&str>,
    user_agent: Option<&str>,
) -> SessionRow {
    SessionRow {
        session_id: record.session_id.clone(),
        visitor_id: visitor_id.to_string(),
        started_at: record.last_activity,
        last_activity: record.last_activity,
        utm_source: params.utm_source.clone(),
        utm_medium: params.utm_medium.clone(),
        utm_campaign: params.utm_campaign.clone(),
        referrer: referrer.map(String::from),
        landing_path: params.path.clone(),
        device_type: DeviceType::classify(user_agent).as_ref().to_string(),
        user_agent: user_agent.map(String::from),
        geo: GeoInfo::default(),
    }
}

type Chains = Arc<Mutex<HashMap<String, (u64, oneshot::Receiver<()>)>>>;

/// 链上的一环：前驱的完成信号 + 自己的完成通知
struct Link {
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
    session_id: String,
    generation: u64,
    chains: Chains,
}

impl Link {
    async fn wait_turn(&mut self) {
        if let Some(previous) = self.previous.take() {
            // 前驱 panic 时 sender 被丢弃，同样视为完成
            let _ = previous.await;
        }
    }

    fn finish(self) {
        let _ = self.done.send(());
        let mut chains = self.chains.lock();
        if chains
            .get(&self.session_id)
            .is_some_and(|(generation, _)| *generation == self.generation)
        {
            chains.remove(&self.session_id);
        }
    }
}

#[derive(Clone)]
pub struct SessionSyncClient {
    backend: Arc<dyn RemoteBackend>,
    geo: Arc<dyn GeoLookup>,
    chains: Chains,
    next_generation: Arc<AtomicU64>,
}

impl SessionSyncClient {
    pub fn new(backend: Arc<dyn RemoteBackend>, geo: Arc<dyn GeoLookup>) -> Self {
        Self {
            backend,
            geo,
            chains: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 尚未完成的会话链数量
    pub fn pending_sessions(&self) -> usize {
        self.chains.lock().len()
    }

    fn enqueue(&self, session_id: &str) -> Link {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (done, rx) = oneshot::channel();
        let previous = self
            .chains
            .lock()
            .insert(session_id.to_string(), (generation, rx))
            .map(|(_, previous)| previous);

        Link {
            previous,
            done,
            session_id: session_id.to_string(),
            generation,
            chains: Arc::clone(&self.chains),
        }
    }

    /// 写入新会话，再把 geo 字段合并进去
    ///
    /// geo 查询立即开始，与插入并行；只有插入成功且查询有结果时才发更新。
    pub fn begin_session(&self, row: SessionRow, client_ip: Option<String>) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let geo = Arc::clone(&self.geo);
        let session_id = row.session_id.clone();
        let mut link = self.enqueue(&session_id);

        let geo_task = tokio::spawn(async move { geo.fetch_geo(client_ip.as_deref()).await });

        tokio::spawn(async move {
            link.wait_turn().await;

            let inserted = match backend.insert_session(row).await {
                Ok(()) => {
                    debug!("Session {} created", session_id);
                    true
                }
                Err(e) => {
                    warn!("Failed to create session {}: {}", session_id, e);
                    false
                }
            };

            // geo 任务 panic 也只当作没有结果
            let geo = geo_task.await.unwrap_or_else(|e| {
                warn!("Geo enrichment for session {} aborted: {}", session_id, e);
                GeoInfo::default()
            });

            if !inserted {
                link.finish();
                return;
            }
            if geo.is_empty() {
                trace!("No geo data for session {}", session_id);
            } else if let Err(e) = backend
                .update_session(&session_id, SessionPatch::geo(geo))
                .await
            {
                warn!("Failed to attach geo to session {}: {}", session_id, e);
            }
            link.finish();
        })
    }

    /// 刷新已有会话的 `last_activity`
    pub fn heartbeat(&self, session_id: &str, now: DateTime<Utc>) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let session_id = session_id.to_string();
        let mut link = self.enqueue(&session_id);

        tokio::spawn(async move {
            link.wait_turn().await;
            if let Err(e) = backend
                .update_session(&session_id, SessionPatch::heartbeat(now))
                .await
            {
                warn!("Heartbeat for session {} failed: {}", session_id, e);
            }
            link.finish();
        })
    }
}
