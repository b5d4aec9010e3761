//! 从页面 URL 和 referrer 中读取归因参数

use serde::{Deserialize, Serialize};
use url::Url;

/// 解析相对地址时使用的占位 origin
const RELATIVE_BASE: &str = "http://localhost/";

/// 页面 URL 携带的营销与推荐参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    /// 推荐码（如 `?ref=abc123`）
    pub referral_token: Option<String>,
    /// 页面路径，记为落地页
    pub path: Option<String>,
}

impl UrlParams {
    /// 解析 query string
    ///
    /// 同名参数取第一个，空值视为不存在。
    pub fn from_query(query: &str, referral_param: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = UrlParams::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "utm_source" => &mut params.utm_source,
                "utm_medium" => &mut params.utm_medium,
                "utm_campaign" => &mut params.utm_campaign,
                k if k == referral_param => &mut params.referral_token,
                _ => continue,
            };
            if slot.is_none() {
                *slot = non_empty(&value);
            }
        }

        params
    }

    /// 解析绝对或站内相对 URL，无法解析时返回空参数
    pub fn from_url(page_url: &str, referral_param: &str) -> Self {
        let parsed = Url::parse(page_url).or_else(|_| {
            Url::parse(RELATIVE_BASE).and_then(|base| base.join(page_url))
        });

        match parsed {
            Ok(url) => {
                let mut params = Self::from_query(url.query().unwrap_or(""), referral_param);
                params.path = Some(url.path().to_string());
                params
            }
            Err(_) => UrlParams::default(),
        }
    }
}

/// 规范化 `document.referrer`，浏览器用空字符串表示没有来源
pub fn normalize_referrer(referrer: Option<&str>) -> Option<String> {
    referrer.and_then(non_empty)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
