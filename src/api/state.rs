use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::StaticConfig;
use crate::services::geoip::GeoLookup;
use crate::session::SessionSyncClient;
use crate::storage::RemoteBackend;
use crate::utils::ClientIpResolver;

/// 各 worker 共享的 handler 状态
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn RemoteBackend>,
    pub geo: Arc<dyn GeoLookup>,
    pub config: Arc<StaticConfig>,
    pub ip_resolver: ClientIpResolver,
    pub started_at: DateTime<Utc>,
    // 所有 worker 共用，同一会话的写入才能跨请求保持顺序
    sync: SessionSyncClient,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn RemoteBackend>,
        geo: Arc<dyn GeoLookup>,
        config: Arc<StaticConfig>,
    ) -> Self {
        Self {
            sync: SessionSyncClient::new(Arc::clone(&backend), Arc::clone(&geo)),
            ip_resolver: ClientIpResolver::new(&config.network),
            backend,
            geo,
            config,
            started_at: Utc::now(),
        }
    }

    pub fn sync_client(&self) -> SessionSyncClient {
        self.sync.clone()
    }
}
