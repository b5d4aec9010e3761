use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::debug;

use crate::api::error_code::ErrorCode;
use crate::api::helpers::{error_response, success_with_cookies};
use crate::api::state::AppState;
use crate::api::types::{HandshakeResponse, LeadRequest, LeadResponse};
use crate::identity::{CookieJarStore, HandshakeMarker};
use crate::referral::{HandshakeError, HandshakeState, ReferralHandshake};
use crate::session::UrlParams;

pub struct ReferralService;

impl ReferralService {
    /// 为 `?ref=<token>` 挂载握手并立即弹出
    ///
    /// 弹出延迟由页面自行处理。
    pub async fn handshake(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
        let config = &state.config;
        let store = Arc::new(CookieJarStore::from_request(&req, &config.cookies));
        let params = UrlParams::from_query(req.query_string(), &config.referral.param_name);

        let mut handshake = ReferralHandshake::new(Arc::clone(&state.backend), store.clone());
        let pending = matches!(handshake.mount(&params), HandshakeState::Pending { .. });
        if pending && let Err(e) = handshake.reveal().await {
            debug!("Handshake reveal rejected: {}", e);
        }

        let response = HandshakeResponse {
            open: handshake.is_open(),
            state: handshake.state().clone(),
        };
        success_with_cookies(response, store.delta_cookies())
    }

    /// 记录线索并写入永久完成标记
    pub async fn submit_lead(
        req: HttpRequest,
        state: web::Data<AppState>,
        body: web::Json<LeadRequest>,
    ) -> HttpResponse {
        let body = body.into_inner();
        let store = Arc::new(CookieJarStore::from_request(&req, &state.config.cookies));

        // 已完成的浏览器不再提交
        if store.is_completed() {
            debug!("Lead submission skipped, handshake already completed");
            return success_with_cookies(
                LeadResponse {
                    already_completed: true,
                    submitted: false,
                },
                Vec::new(),
            );
        }

        let referrer_id = body.referrer_id.trim();
        if referrer_id.is_empty() {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::ReferralMissingReferrer,
                "referrer_id is required",
            );
        }

        let mut handshake =
            ReferralHandshake::resume_shown(Arc::clone(&state.backend), store.clone(), referrer_id);

        match handshake.submit(&body.name, &body.phone).await {
            Ok(()) => success_with_cookies(
                LeadResponse {
                    already_completed: false,
                    submitted: true,
                },
                store.delta_cookies(),
            ),
            Err(e) => {
                let status = match e {
                    HandshakeError::MissingField => StatusCode::BAD_REQUEST,
                    HandshakeError::Remote(_) => StatusCode::BAD_GATEWAY,
                    HandshakeError::InvalidTransition { .. } => StatusCode::CONFLICT,
                };
                // 优先返回面向用户的提示
                let message = match handshake.state() {
                    HandshakeState::Shown {
                        error: Some(message),
                        ..
                    } => message.clone(),
                    _ => e.to_string(),
                };
                error_response(status, ErrorCode::from(&e), &message)
            }
        }
    }
}
