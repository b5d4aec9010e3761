use parking_lot::Mutex;
use tracing::warn;

use super::{HandshakeMarker, IdentityStore, VisitorIdentity, decode_identity, encode_identity};

/// 进程内身份存储
///
/// 保存序列化后的原始字符串，解码路径与真实 cookie 相同。
#[derive(Default)]
pub struct MemoryIdentityStore {
    raw: Mutex<Option<String>>,
    ttl_days: Mutex<Option<u32>>,
    marker: Mutex<bool>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入任意原始值（可以是损坏的）
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let store = Self::default();
        *store.raw.lock() = Some(raw.into());
        store
    }

    /// 预置握手完成标记
    pub fn with_marker(self) -> Self {
        *self.marker.lock() = true;
        self
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().clone()
    }

    /// 最近一次 `save` 使用的 TTL
    pub fn last_ttl_days(&self) -> Option<u32> {
        *self.ttl_days.lock()
    }

    /// 模拟用户清除站点数据
    pub fn clear(&self) {
        *self.raw.lock() = None;
        *self.ttl_days.lock() = None;
        *self.marker.lock() = false;
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<VisitorIdentity> {
        self.raw.lock().as_deref().and_then(decode_identity)
    }

    fn save(&self, identity: &VisitorIdentity, ttl_days: u32) {
        match encode_identity(identity) {
            Ok(encoded) => {
                *self.raw.lock() = Some(encoded);
                *self.ttl_days.lock() = Some(ttl_days);
            }
            Err(e) => warn!("Failed to serialize visitor identity: {}", e),
        }
    }
}

impl HandshakeMarker for MemoryIdentityStore {
    fn is_completed(&self) -> bool {
        *self.marker.lock()
    }

    fn mark_completed(&self) {
        *self.marker.lock() = true;
    }
}
