//! IP 地址处理工具
//!
//! 提取访客的真实 IP（供 GeoIP 补全使用），支持：
//! - 可信代理配置（trusted_proxies，IP 或 CIDR）
//! - 未配置时对私有地址连接自动信任 X-Forwarded-For

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

use crate::config::NetworkConfig;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 ULA
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 link-local
        }
    }
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 从请求头提取转发的 IP（X-Forwarded-For 第一个，其次 X-Real-IP）
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Resolves the visitor's address from a request
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_proxies: Vec<String>,
}

impl ClientIpResolver {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            trusted_proxies: config.trusted_proxies.clone(),
        }
    }

    pub fn resolve(&self, req: &HttpRequest) -> Option<String> {
        self.resolve_parts(req.peer_addr().map(|a| a.ip()), || {
            forwarded_ip_from_headers(req.headers())
        })
    }

    /// 策略（按优先级）：
    /// 1. 配置了 trusted_proxies：仅当连接来自可信代理时使用转发头
    /// 2. 未配置：连接来自私有地址时假设有反向代理，使用转发头
    /// 3. 默认使用连接 IP
    fn resolve_parts<F>(&self, peer: Option<IpAddr>, forwarded: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        let Some(peer) = peer else {
            return forwarded();
        };

        let trust_forwarded = if self.trusted_proxies.is_empty() {
            is_private_or_local(&peer)
        } else {
            self.is_trusted_proxy(&peer)
        };

        if trust_forwarded && let Some(real_ip) = forwarded() {
            debug!("Client IP via proxy {}: {}", peer, real_ip);
            return Some(real_ip);
        }

        Some(peer.to_string())
    }

    fn is_trusted_proxy(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.iter().any(|proxy| {
            if proxy.contains('/') {
                ip_in_cidr(ip, proxy)
            } else {
                proxy
                    .parse::<IpAddr>()
                    .or_else(|_| proxy.parse::<SocketAddr>().map(|s| s.ip()))
                    .is_ok_and(|p| p == *ip)
            }
        })
    }
}
