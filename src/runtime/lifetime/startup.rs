use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::GeoIpProvider;
use crate::storage::{RemoteBackend, SeaOrmBackend, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmBackend>,
    pub geoip: Arc<GeoIpProvider>,
}

/// 准备服务器启动的上下文：TLS provider、存储后端（含迁移）、GeoIP
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let geoip = Arc::new(GeoIpProvider::new(&config.geoip));

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(StartupContext { storage, geoip })
}
