use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::identity::HandshakeMarker;
use crate::session::UrlParams;
use crate::storage::RemoteBackend;

/// 挂载后延迟多久弹出表单
pub const HANDSHAKE_REVEAL_DELAY: Duration = Duration::from_secs(3);

const MISSING_FIELD_MESSAGE: &str = "Please enter your name and phone number.";
const SUBMIT_FAILED_MESSAGE: &str = "Could not submit your details. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandshakeState {
    /// 无可用推荐码或尚未挂载
    Idle,
    /// 等待弹出延迟
    Pending { referrer_id: String },
    /// 表单可见
    Shown {
        referrer_id: String,
        referrer_name: Option<String>,
        error: Option<String>,
    },
    /// 线索已记录，完成标记已写入
    Submitted,
    Dismissed,
}

impl HandshakeState {
    fn name(&self) -> &'static str {
        match self {
            HandshakeState::Idle => "idle",
            HandshakeState::Pending { .. } => "pending",
            HandshakeState::Shown { .. } => "shown",
            HandshakeState::Submitted => "submitted",
            HandshakeState::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// 姓名或电话为空
    MissingField,
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    /// 后端拒绝或写入失败
    Remote(String),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::MissingField => write!(f, "{}", MISSING_FIELD_MESSAGE),
            HandshakeError::InvalidTransition { from, action } => {
                write!(f, "cannot {} a handshake in state '{}'", action, from)
            }
            HandshakeError::Remote(msg) => write!(f, "lead submission failed: {}", msg),
        }
    }
}

impl std::error::Error for HandshakeError {}

/// 每个访客只触发一次的推荐线索采集
///
/// `Idle → Pending → Shown → Submitted | Dismissed`。
/// 进入 `Submitted` 之前先写完成标记，已提交必然已落标记。
pub struct ReferralHandshake {
    backend: Arc<dyn RemoteBackend>,
    marker: Arc<dyn HandshakeMarker>,
    state: HandshakeState,
    mounted: bool,
}

impl ReferralHandshake {
    pub fn new(backend: Arc<dyn RemoteBackend>, marker: Arc<dyn HandshakeMarker>) -> Self {
        Self {
            backend,
            marker,
            state: HandshakeState::Idle,
            mounted: false,
        }
    }

    /// 恢复已经展示给 `referrer_id` 的对话框
    ///
    /// 表单在之前的请求中弹出，本次请求只负责提交。
    pub fn resume_shown(
        backend: Arc<dyn RemoteBackend>,
        marker: Arc<dyn HandshakeMarker>,
        referrer_id: &str,
    ) -> Self {
        Self {
            backend,
            marker,
            state: HandshakeState::Shown {
                referrer_id: referrer_id.to_string(),
                referrer_name: None,
                error: None,
            },
            mounted: true,
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// 对话框是否可见
    pub fn is_open(&self) -> bool {
        matches!(self.state, HandshakeState::Shown { .. })
    }

    /// 只检查一次推荐码，之后的调用直接忽略
    pub fn mount(&mut self, params: &UrlParams) -> &HandshakeState {
        if self.mounted {
            return &self.state;
        }
        self.mounted = true;

        let Some(token) = params.referral_token.as_deref().map(str::trim) else {
            return &self.state;
        };
        if token.is_empty() {
            return &self.state;
        }

        if self.marker.is_completed() {
            debug!("Referral handshake already completed, ignoring ref={}", token);
            return &self.state;
        }

        self.state = HandshakeState::Pending {
            referrer_id: token.to_string(),
        };
        &self.state
    }

    /// `Pending → Shown`，能取到推荐人昵称时带上
    pub async fn reveal(&mut self) -> Result<(), HandshakeError> {
        let HandshakeState::Pending { referrer_id } = &self.state else {
            return Err(self.invalid("reveal"));
        };
        let referrer_id = referrer_id.clone();

        let referrer_name = match self.backend.fetch_display_name(&referrer_id).await {
            Ok(name) => name,
            Err(e) => {
                debug!("Referrer name lookup for {} failed: {}", referrer_id, e);
                None
            }
        };

        self.state = HandshakeState::Shown {
            referrer_id,
            referrer_name,
            error: None,
        };
        Ok(())
    }

    /// 等待 [`HANDSHAKE_REVEAL_DELAY`] 后弹出
    pub async fn run_reveal(&mut self) -> Result<(), HandshakeError> {
        if !matches!(self.state, HandshakeState::Pending { .. }) {
            return Err(self.invalid("reveal"));
        }
        tokio::time::sleep(HANDSHAKE_REVEAL_DELAY).await;
        self.reveal().await
    }

    /// 提交线索，成功后写标记并关闭
    pub async fn submit(&mut self, name: &str, phone: &str) -> Result<(), HandshakeError> {
        let HandshakeState::Shown { referrer_id, .. } = &self.state else {
            return Err(self.invalid("submit"));
        };
        let referrer_id = referrer_id.clone();

        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() || phone.is_empty() {
            self.set_error(MISSING_FIELD_MESSAGE);
            return Err(HandshakeError::MissingField);
        }

        if let Err(e) = self.backend.record_lead(&referrer_id, phone, name).await {
            warn!("Referral lead for {} not recorded: {}", referrer_id, e);
            self.set_error(SUBMIT_FAILED_MESSAGE);
            return Err(HandshakeError::Remote(e.to_string()));
        }

        self.marker.mark_completed();
        self.state = HandshakeState::Submitted;
        info!("Referral handshake completed for referrer {}", referrer_id);
        Ok(())
    }

    /// 不提交直接关闭，不写标记
    pub fn dismiss(&mut self) -> Result<(), HandshakeError> {
        if !self.is_open() {
            return Err(self.invalid("dismiss"));
        }
        self.state = HandshakeState::Dismissed;
        Ok(())
    }

    fn set_error(&mut self, message: &str) {
        if let HandshakeState::Shown { error, .. } = &mut self.state {
            *error = Some(message.to_string());
        }
    }

    fn invalid(&self, action: &'static str) -> HandshakeError {
        HandshakeError::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }
}
