//! 根据 UA 粗分设备类型

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// 常见移动端 UA 特征
static MOBILE_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Mobi|Android|iPhone|iPad|iPod|BlackBerry|BB10|IEMobile|Opera Mini|webOS|Windows Phone|Kindle|Silk",
    )
    .expect("mobile signature pattern must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    /// 命中移动端特征即为 mobile，否则 desktop
    pub fn classify(user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(ua) if MOBILE_SIGNATURE.is_match(ua) => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    }
}
