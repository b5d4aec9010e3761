//! 会话判定与后端同步

mod attribution;
pub mod detector;
mod device;
pub mod sync;

pub use attribution::{UrlParams, normalize_referrer};
pub use detector::{
    BoundaryReason, SESSION_IDLE_TIMEOUT_SECS, SessionDecision, decide, session_idle_timeout,
};
pub use device::DeviceType;
pub use sync::{SessionSyncClient, build_session_row};
