//! 统一 API 错误码定义

use crate::errors::VisitrackError;
use crate::referral::HandshakeError;

/// API 错误码
///
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 会话追踪错误
/// - 3000-3099: 推荐握手错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    BadGateway = 1031,

    // 会话追踪 2000-2099
    TrackInvalidUrl = 2000,

    // 推荐握手 3000-3099
    ReferralMissingField = 3000,
    ReferralMissingReferrer = 3001,
    ReferralSubmitFailed = 3002,
    ReferralInvalidState = 3003,
}

impl From<&VisitrackError> for ErrorCode {
    fn from(err: &VisitrackError) -> Self {
        match err {
            VisitrackError::Validation(_) => ErrorCode::BadRequest,
            VisitrackError::NotFound(_) => ErrorCode::NotFound,
            VisitrackError::Network(_) | VisitrackError::DatabaseConnection(_) => {
                ErrorCode::BadGateway
            }
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl From<&HandshakeError> for ErrorCode {
    fn from(err: &HandshakeError) -> Self {
        match err {
            HandshakeError::MissingField => ErrorCode::ReferralMissingField,
            HandshakeError::Remote(_) => ErrorCode::ReferralSubmitFailed,
            HandshakeError::InvalidTransition { .. } => ErrorCode::ReferralInvalidState,
        }
    }
}
