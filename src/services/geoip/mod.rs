//! GeoIP 服务模块
//!
//! 尽力而为的访客地理位置补全：
//! - 外部 HTTP API（默认 ipapi.co），带缓存
//! - 关闭时使用 NoopGeo
//!
//! 任何失败都返回空的 [`GeoInfo`]，调用方无需处理错误。

mod external_api;
mod provider;

pub use external_api::ExternalApiGeo;
pub use provider::{GeoInfo, GeoIpProvider, GeoLookup, NoopGeo};
