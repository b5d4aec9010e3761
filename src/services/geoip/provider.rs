//! GeoIP Provider 抽象层
//!
//! 统一的地理位置查询接口，根据配置选择实现：
//! 1. geoip.enabled = true → ExternalApiGeo
//! 2. 否则 → NoopGeo

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::external_api::ExternalApiGeo;
use crate::config::GeoIpConfig;
use crate::utils::ip::is_private_or_local;

/// 地理位置信息（所有字段都可能缺失）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub city: Option<String>,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 (e.g., "PK", "US")
    pub country_code: Option<String>,
    pub ip_address: Option<String>,
}

impl GeoInfo {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.country.is_none()
            && self.country_code.is_none()
            && self.ip_address.is_none()
    }
}

/// Best-effort geo lookup
///
/// Never fails: network, parse and status errors all resolve to an empty
/// [`GeoInfo`], so callers have no error branch.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn fetch_geo(&self, client_ip: Option<&str>) -> GeoInfo;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// Lookup that always resolves empty (geo enrichment disabled)
pub struct NoopGeo;

#[async_trait]
impl GeoLookup for NoopGeo {
    async fn fetch_geo(&self, _client_ip: Option<&str>) -> GeoInfo {
        GeoInfo::default()
    }

    fn name(&self) -> &'static str {
        "Noop"
    }
}

/// 统一 GeoIP Provider，启动时根据配置选择实现
pub struct GeoIpProvider {
    inner: Arc<dyn GeoLookup>,
}

impl GeoIpProvider {
    pub fn new(config: &GeoIpConfig) -> Self {
        let inner: Arc<dyn GeoLookup> = if config.enabled {
            Arc::new(ExternalApiGeo::new(&config.api_url_template))
        } else {
            debug!("GeoIP: lookup disabled by configuration");
            Arc::new(NoopGeo)
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }

    pub fn from_lookup(inner: Arc<dyn GeoLookup>) -> Self {
        Self { inner }
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

#[async_trait]
impl GeoLookup for GeoIpProvider {
    /// 私有地址、回环地址和无法解析的 IP 直接返回空结果
    async fn fetch_geo(&self, client_ip: Option<&str>) -> GeoInfo {
        let Some(ip) = client_ip else {
            return GeoInfo::default();
        };

        match ip.parse::<IpAddr>() {
            Ok(addr) if !is_private_or_local(&addr) => self.inner.fetch_geo(Some(ip)).await,
            _ => {
                debug!("GeoIP: skipping lookup for non-public address {}", ip);
                GeoInfo::default()
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Clone for GeoIpProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
