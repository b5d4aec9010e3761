//! 外部 GeoIP API 实现
//!
//! 使用外部 HTTP API 查询访客 IP 的地理位置（默认 ipapi.co）
//! 内置 LRU 缓存 + Singleflight 语义，避免重复查询

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoInfo, GeoLookup};

/// GeoIP 缓存 TTL（15 分钟）
const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
/// GeoIP 缓存最大容量
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
/// HTTP 请求超时时间
const HTTP_TIMEOUT_SECS: u64 = 2;

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// 外部 API GeoIP 查询
///
/// 内置 Moka 缓存：
/// - 最大 10000 条，TTL 15 分钟
/// - 空结果同样缓存，失败的 IP 不会被反复请求
/// - Singleflight：同一 IP 的并发请求只发一次 HTTP
pub struct ExternalApiGeo {
    api_url_template: String,
    cache: Cache<String, GeoInfo>,
}

impl ExternalApiGeo {
    /// `api_url_template` 使用 `{ip}` 作为占位符
    /// 例如: `https://ipapi.co/{ip}/json/`
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    /// 解析 API 响应
    ///
    /// 兼容常见字段名：
    /// - ipapi.co: {"ip","city","country_name","country_code"}，失败时 {"error": true}
    /// - ip-api.com: {"query","city","country","countryCode"}，失败时 {"status": "fail"}
    pub(crate) fn parse_response(json: &serde_json::Value) -> GeoInfo {
        if json["error"].as_bool() == Some(true) || json["status"].as_str() == Some("fail") {
            trace!("External API returned failure payload");
            return GeoInfo::default();
        }

        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| json[*k].as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        GeoInfo {
            city: text(&["city"]),
            country: text(&["country_name", "country"]),
            // 只接受 ISO 3166-1 alpha-2
            country_code: text(&["country_code", "countryCode"])
                .filter(|c| c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic()))
                .map(|c| c.to_ascii_uppercase()),
            ip_address: text(&["ip", "query"]),
        }
    }

    /// 从外部 API 获取 GeoIP 信息（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(url: String) -> GeoInfo {
        let agent = get_agent();

        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return GeoInfo::default();
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
                return GeoInfo::default();
            }
        };

        let geo = Self::parse_response(&json);
        trace!(
            "External API lookup: city={:?}, country_code={:?}",
            geo.city, geo.country_code
        );
        geo
    }

    async fn fetch_from_api(&self, ip: &str) -> GeoInfo {
        let url = self.api_url_template.replace("{ip}", ip);

        // 同步 HTTP 请求放到阻塞线程池执行
        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                GeoInfo::default()
            })
    }
}

#[async_trait]
impl GeoLookup for ExternalApiGeo {
    async fn fetch_geo(&self, client_ip: Option<&str>) -> GeoInfo {
        let Some(ip) = client_ip else {
            return GeoInfo::default();
        };

        // get_with 自带 singleflight 语义：同一 key 的并发调用只执行一次
        self.cache
            .get_with(ip.to_string(), async {
                trace!("GeoIP cache miss for {}, fetching from API", ip);
                self.fetch_from_api(ip).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
